use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, script_error_str},
        interpreter::Interpreter,
    },
};
use std::{collections::HashMap, sync::{Arc, Mutex}};

/// Block storage as seen by the interpreter.  Blocks are numbered pages of source text, the
/// manager decides where they live and how they're cached.
pub trait BlockManager: Send + Sync {
    /// Read the text of a block.  A block that was never written reads as empty.
    fn read_block(&self, number: u64) -> error::Result<String>;

    /// Replace the text of a block.
    fn write_block(&self, number: u64, text: &str) -> error::Result<()>;
}

/// Blocks kept in memory, for embedding and tests.
#[derive(Default)]
pub struct MemoryBlocks {
    blocks: Mutex<HashMap<u64, String>>,
}

impl MemoryBlocks {
    pub fn new() -> MemoryBlocks {
        MemoryBlocks::default()
    }
}

impl BlockManager for MemoryBlocks {
    fn read_block(&self, number: u64) -> error::Result<String> {
        let blocks = self.blocks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(blocks.get(&number).cloned().unwrap_or_default())
    }

    fn write_block(&self, number: u64, text: &str) -> error::Result<()> {
        let mut blocks = self.blocks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = blocks.insert(number, text.to_string());
        Ok(())
    }
}

fn block_manager(interpreter: &dyn Interpreter) -> error::Result<Arc<dyn BlockManager>> {
    match interpreter.block_manager() {
        Some(manager) => Ok(manager),
        None => script_error_str(interpreter, "No block manager has been installed."),
    }
}

/// Evaluate the text of a block.
///
/// Signature: `block -- `
fn word_load(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let number = interpreter.pop_as_usize()? as u64;
    let text = block_manager(interpreter)?.read_block(number)?;

    interpreter.process_source(&format!("<block {}>", number), &text)
}

/// Read a block into the cell at the given address as a string.
///
/// Signature: `block address -- `
fn word_read_block(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop_as_int()?;
    let number = interpreter.pop_as_usize()? as u64;
    let text = block_manager(interpreter)?.read_block(number)?;

    interpreter.store(address, Value::from(text))
}

/// Write the string held in the cell at the given address to a block.
///
/// Signature: `block address -- `
fn word_write_block(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop_as_int()?;
    let number = interpreter.pop_as_usize()? as u64;
    let value = interpreter.fetch(address)?;
    let text = value.as_string(interpreter)?.clone();

    block_manager(interpreter)?.write_block(number, &text)
}

/// Register the block storage words with the interpreter.
pub fn register_block_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "load",
        word_load,
        "Evaluate the text of a block.",
        "block -- "
    );

    add_native_word!(
        interpreter,
        "read-block",
        word_read_block,
        "Read a block into a cell as a string.",
        "block address -- "
    );

    add_native_word!(
        interpreter,
        "write-block",
        word_write_block,
        "Write the string in a cell to a block.",
        "block address -- "
    );
}
