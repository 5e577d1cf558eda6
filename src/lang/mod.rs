
/// Module for managing the original source code.
pub mod source_buffer;

/// Module for pulling whitespace delimited tokens, and the payloads of quoting words, out of the
/// source code one at a time.
pub mod tokenizing;

/// Module defining the actions compiled words are built from.
pub mod code;

/// Module for the compile time state of a definition, its open control structures and locals.
/// The evaluator drives it as immediate words are executed, so the code being compiled can take
/// part in its own compilation.
pub mod compilation;
