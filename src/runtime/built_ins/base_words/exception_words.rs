use crate::{
    add_native_immediate_word, add_native_word,
    lang::code::Action,
    location_here,
    runtime::{
        data_structures::value::Value,
        error::{self, code_error, ABORT_CODE, ABORT_QUOTE_CODE},
        interpreter::Interpreter,
    },
};
use arcstr::ArcStr;

/// Execute a word, turning any error it raises into a code on the stack.  On error the stacks are
/// unwound to where they were when the word was called.
///
/// Signature: `xt -- 0 | code`
fn word_catch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let word = interpreter.pop_as_word()?;
    let depths = interpreter.stack_depths();
    let location = interpreter
        .current_location()
        .clone()
        .unwrap_or_else(|| location_here!());

    match interpreter.execute_word(&location, &word) {
        Ok(()) => interpreter.push(Value::Int(0)),

        Err(error) => {
            interpreter.restore_depths(&depths);
            interpreter.push(Value::Int(error.catch_code()));
        }
    }

    Ok(())
}

/// Raise an error with the given code, zero does nothing.
///
/// Signature: `code -- `
fn word_throw(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.pop_as_int()?;

    if code == 0 {
        return Ok(());
    }

    code_error(interpreter, code, format!("Exception {} thrown.", code))
}

/// Signature: ` -- `
fn word_abort(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    code_error(interpreter, ABORT_CODE, "Aborted.".to_string())
}

/// Abort with the quoted text as the message.
///
/// Signature: ` -- `
fn word_abort_quote(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let message = interpreter.take_payload()?;

    if interpreter.is_compiling() {
        interpreter.compile_action(Action::AbortText(ArcStr::from(message)))
    } else {
        code_error(interpreter, ABORT_QUOTE_CODE, message)
    }
}

/// Register the exception words.
pub fn register_exception_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "catch",
        word_catch,
        "Execute a word, pushing 0 on success or the error code.",
        "xt -- 0 | code"
    );

    add_native_word!(
        interpreter,
        "throw",
        word_throw,
        "Raise an error with the given code unless it's zero.",
        "code -- "
    );

    add_native_word!(
        interpreter,
        "abort",
        word_abort,
        "Raise the abort error.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "abort\"",
        word_abort_quote,
        "Raise an error with the quoted message.",
        " -- "
    );
}
