use crate::runtime::data_structures::{ contextual_data::ContextualData,
                                       value::Value };
use std::collections::HashMap;



/// The locals of the compiled words currently executing, one scope per invocation.  Names are
/// stored upper-cased.
#[derive(Default)]
pub struct LocalScopes
{
    scopes: Vec<HashMap<String, Value>>
}


impl ContextualData for LocalScopes
{
    fn mark_context(&mut self)
    {
        self.scopes.push(HashMap::new());
    }

    fn release_context(&mut self)
    {
        let _ = self.scopes.pop();
    }
}


impl LocalScopes
{
    pub fn new() -> LocalScopes
    {
        LocalScopes { scopes: Vec::new() }
    }

    /// Bind or rebind a local in the innermost scope.  Fails if no word is executing.
    pub fn set(&mut self, name: &str, value: Value) -> bool
    {
        match self.scopes.last_mut()
        {
            Some(scope) =>
                {
                    let _ = scope.insert(name.to_uppercase(), value);
                    true
                },

            None => false
        }
    }

    /// Read a local from the innermost scope.
    pub fn get(&self, name: &str) -> Option<&Value>
    {
        self.scopes.last().and_then(|scope| scope.get(&name.to_uppercase()))
    }

    /// How many scopes are open.
    pub fn depth(&self) -> usize
    {
        self.scopes.len()
    }

    /// Drop scopes until only `depth` remain, used when unwinding after an error.
    pub fn truncate(&mut self, depth: usize)
    {
        self.scopes.truncate(depth);
    }
}


#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn only_the_innermost_scope_is_visible()
    {
        let mut locals = LocalScopes::new();

        assert!(!locals.set("a", Value::Int(1)));

        locals.mark_context();
        assert!(locals.set("a", Value::Int(1)));

        locals.mark_context();
        assert!(locals.get("A").is_none());
        assert!(locals.set("A", Value::Int(2)));
        assert_eq!(locals.get("a"), Some(&Value::Int(2)));

        locals.release_context();
        assert_eq!(locals.get("a"), Some(&Value::Int(1)));
        assert_eq!(locals.depth(), 1);

        locals.truncate(0);
        assert!(locals.get("a").is_none());
    }
}
