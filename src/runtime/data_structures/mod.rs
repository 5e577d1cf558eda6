/// Module contains the Value enumeration, the data type held on the stacks and in the data space.
pub mod value;

/// The Word type, the executable units held in the dictionary.
pub mod word;

/// Hold the ContextualData trait, used for managing per-invocation scopes in the interpreter.
pub mod contextual_data;

/// The scopes holding the locals of executing words.
pub mod local_scopes;

/// The dictionary module provides the persistent, namespaced word dictionary used by the
/// interpreter along with its snapshots.
pub mod dictionary;

/// Handles to child evaluations running on worker threads.
pub mod task;
