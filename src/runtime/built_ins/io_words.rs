use crate::{
    add_native_immediate_word, add_native_word,
    lang::code::Action,
    runtime::{
        data_structures::value::Value,
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use arcstr::ArcStr;
use std::{
    collections::VecDeque,
    io::{stdin, stdout, Write},
    sync::Mutex,
};

/// The text I/O capability the interpreter writes all of its output through.  The interpreter
/// never touches the console directly, embedders supply their own implementation.
///
/// Implementations are shared with child interpreters on other threads.
pub trait TextIo: Send + Sync {
    /// Write text without a trailing new line.
    fn write_text(&self, text: &str) -> error::Result<()>;

    /// Write a decimal integer.
    fn write_number(&self, number: i64) -> error::Result<()>;

    /// End the current line.
    fn new_line(&self) -> error::Result<()>;

    /// Read a line of input, without its line ending.  `None` at the end of input.
    fn read_line(&self) -> error::Result<Option<String>>;
}

/// Text I/O on the process' standard input and output.
#[derive(Default)]
pub struct StdIo;

impl TextIo for StdIo {
    fn write_text(&self, text: &str) -> error::Result<()> {
        let mut out = stdout();

        out.write_all(text.as_bytes())?;
        out.flush()?;

        Ok(())
    }

    fn write_number(&self, number: i64) -> error::Result<()> {
        self.write_text(&number.to_string())
    }

    fn new_line(&self) -> error::Result<()> {
        self.write_text("\n")
    }

    fn read_line(&self) -> error::Result<Option<String>> {
        let mut line = String::new();

        if stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Text I/O on in-memory buffers.  Output is captured and input is served from a queue of lines.
/// Useful for embedding and tests.
#[derive(Default)]
pub struct BufferIo {
    output: Mutex<String>,
    input: Mutex<VecDeque<String>>,
}

impl BufferIo {
    pub fn new() -> BufferIo {
        BufferIo::default()
    }

    /// Create a buffer that will answer reads with the given lines.
    pub fn with_input(lines: &[&str]) -> BufferIo {
        let io = BufferIo::new();

        for line in lines {
            io.push_input(line);
        }

        io
    }

    /// Queue another line of input.
    pub fn push_input(&self, line: &str) {
        let mut input = self.input.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        input.push_back(line.to_string());
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Take everything written so far, leaving the output empty.
    pub fn take_output(&self) -> String {
        let mut output = self.output.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *output)
    }
}

impl TextIo for BufferIo {
    fn write_text(&self, text: &str) -> error::Result<()> {
        let mut output = self.output.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        output.push_str(text);
        Ok(())
    }

    fn write_number(&self, number: i64) -> error::Result<()> {
        self.write_text(&number.to_string())
    }

    fn new_line(&self) -> error::Result<()> {
        self.write_text("\n")
    }

    fn read_line(&self) -> error::Result<Option<String>> {
        let mut input = self.input.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(input.pop_front())
    }
}

/// Format an integer in the given base, digits above 9 are upper case letters.
pub fn format_number(number: i64, base: u32) -> String {
    if base == 10 || !(2..=36).contains(&base) {
        return number.to_string();
    }

    let negative = number < 0;
    let mut magnitude = number.unsigned_abs();
    let mut digits = Vec::new();

    loop {
        let digit = (magnitude % base as u64) as u32;
        digits.push(std::char::from_digit(digit, base).unwrap_or('?').to_ascii_uppercase());
        magnitude /= base as u64;

        if magnitude == 0 {
            break;
        }
    }

    if negative {
        digits.push('-');
    }

    digits.iter().rev().collect()
}

/// Print an integer in the current base followed by a space.
///
/// Signature: `n -- `
fn word_print_number(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let number = interpreter.pop_as_int()?;
    let base = interpreter.base();
    let io = interpreter.io();

    if base == 10 {
        io.write_number(number)?;
    } else {
        io.write_text(&format_number(number, base))?;
    }

    io.write_text(" ")
}

/// Print the contents of the data stack without changing it.
///
/// Signature: ` -- `
fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut text = format!("<{}>", interpreter.stack().len());

    for value in interpreter.stack().iter() {
        text.push(' ');
        text.push_str(&format!("{:?}", value));
    }

    let io = interpreter.io();

    io.write_text(&text)?;
    io.new_line()
}

/// Write a character given by its code.
///
/// Signature: `char -- `
fn word_emit(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.pop_as_int()?;

    let character = match u32::try_from(code).ok().and_then(char::from_u32) {
        Some(character) => character,
        None => return script_error(interpreter, format!("Invalid character code {}.", code)),
    };

    interpreter.io().write_text(&character.to_string())
}

/// Start a new line.
///
/// Signature: ` -- `
fn word_cr(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.io().new_line()
}

/// Write a single space.
///
/// Signature: ` -- `
fn word_space(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.io().write_text(" ")
}

/// Write any value as text.  Strings are written as is.
///
/// Signature: `value -- `
fn word_type(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;
    interpreter.io().write_text(&value.to_string())
}

/// Push the quoted text, or compile it as a literal.
///
/// Signature: ` -- string`
fn word_string_literal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = interpreter.take_payload()?;
    let value = Value::from(text);

    if interpreter.is_compiling() {
        interpreter.compile_action(Action::Push(value))
    } else {
        interpreter.push(value);
        Ok(())
    }
}

/// Print the quoted text, or compile the printing of it.
///
/// Signature: ` -- `
fn word_print_literal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = interpreter.take_payload()?;

    if interpreter.is_compiling() {
        interpreter.compile_action(Action::PrintText(ArcStr::from(text)))
    } else {
        interpreter.io().write_text(&text)
    }
}

/// Read a line of input.  At the end of input an empty string and false are pushed.
///
/// Signature: ` -- string flag`
fn word_read_line(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    match interpreter.io().read_line()? {
        Some(line) => {
            interpreter.push(Value::from(line));
            interpreter.push(Value::from(true));
        }

        None => {
            interpreter.push(Value::from(""));
            interpreter.push(Value::from(false));
        }
    }

    Ok(())
}

/// Register the text I/O words with the interpreter.
pub fn register_io_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        ".",
        word_print_number,
        "Print an integer in the current base.",
        "n -- "
    );

    add_native_word!(
        interpreter,
        ".s",
        word_print_stack,
        "Print the data stack without changing it.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "emit",
        word_emit,
        "Write the character with the given code.",
        "char -- "
    );

    add_native_word!(interpreter, "cr", word_cr, "Start a new line.", " -- ");

    add_native_word!(interpreter, "space", word_space, "Write a space.", " -- ");

    add_native_word!(
        interpreter,
        "type",
        word_type,
        "Write a string, or any value, as text.",
        "value -- "
    );

    add_native_immediate_word!(
        interpreter,
        "s\"",
        word_string_literal,
        "Push the text up to the next quote.",
        " -- string"
    );

    add_native_immediate_word!(
        interpreter,
        ".\"",
        word_print_literal,
        "Print the text up to the next quote.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "read-line",
        word_read_line,
        "Read a line of input.",
        " -- string flag"
    );
}
