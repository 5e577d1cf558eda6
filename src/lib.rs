/// Module for managing source code and compiling it into actions.
#[macro_use]
pub mod lang;

/// Module for the runtime and the data structures used by the interpreter.  As well as the
/// interpreter itself.
#[macro_use]
pub mod runtime;

pub use runtime::{
    built_ins::{
        base_words::register_base_words,
        block_words::{register_block_words, BlockManager, MemoryBlocks},
        io_words::{register_io_words, BufferIo, StdIo, TextIo},
        load_prelude,
        plugin::register_plugin_word,
        register_standard_words,
        thread_words::register_thread_words,
    },
    data_structures::value::Value,
    error::{ErrorKind, ScriptError},
    interpreter::{forth_interpreter::ForthInterpreter, Interpreter},
};
