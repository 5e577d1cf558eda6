/// Implemented by data that lives in nested scopes following word invocations.  Marking a context
/// opens a fresh scope for the word being entered, releasing it throws away everything bound in
/// that scope and makes the caller's scope current again.
///
/// Contexts act as a stack, only the innermost one is visible.
pub trait ContextualData {
    /// Open a new scope, called as a compiled word starts executing.
    fn mark_context(&mut self);

    /// Drop the innermost scope and everything bound in it.
    fn release_context(&mut self);
}
