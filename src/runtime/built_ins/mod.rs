use crate::runtime::{error, interpreter::Interpreter};

/// The core words of the language.
pub mod base_words;

/// Words that perform text I/O through the interpreter's I/O capability.
pub mod io_words;

/// Words that run code on child interpreters.
pub mod thread_words;

/// Words that work with block storage.
pub mod block_words;

/// Registration of host functions as words.
pub mod plugin;

/// Source of the words defined in the language itself.
const PRELUDE: &str = include_str!("../../prelude.fs");

/// Register every native word set.
pub fn register_standard_words(interpreter: &mut dyn Interpreter) {
    base_words::register_base_words(interpreter);
    io_words::register_io_words(interpreter);
    thread_words::register_thread_words(interpreter);
    block_words::register_block_words(interpreter);
}

/// Evaluate the prelude.  The native word sets need to be registered first.
pub fn load_prelude(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.process_source("<prelude>", PRELUDE)
}
