use crate::{
    add_native_immediate_word, add_native_word,
    lang::code::Action,
    runtime::{
        data_structures::{
            value::Value,
            word::{Word, WordBody, WordRef},
        },
        error::{self, kind_error, script_error, ErrorKind},
        interpreter::{forth_interpreter::BASE_ADDRESS, Interpreter},
    },
};

/// Read the name that follows in the source and install a data word under it.
fn define_data_word(
    interpreter: &mut dyn Interpreter,
    body: WordBody,
    address: Option<usize>,
) -> error::Result<WordRef> {
    let (location, name) = interpreter.next_word()?;
    let mut word = Word::new(Some(name), location, body);

    if let Some(address) = address {
        word = word.with_data_address(address);
    }

    Ok(interpreter.define_word(word))
}

/// Find the data address of a word of the expected body, as `TO` and `IS` need.
fn target_address(
    interpreter: &mut dyn Interpreter,
    name: &str,
    expected: fn(&WordBody) -> bool,
    kind: &str,
) -> error::Result<usize> {
    let word = interpreter.resolve_word(name)?;

    match word.data_address() {
        Some(address) if expected(word.body()) => Ok(address),
        _ => kind_error(
            interpreter,
            ErrorKind::TypeError,
            format!("{} is not a {}.", name, kind),
        ),
    }
}

/// Push the next free data space address.
///
/// Signature: ` -- address`
fn word_here(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let here = interpreter.here();

    interpreter.push(Value::from(here));
    Ok(())
}

/// Reserve cells in the data space, negative counts give cells back.
///
/// Signature: `n -- `
fn word_allot(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let cells = interpreter.pop_as_int()?;

    let _ = interpreter.allot(cells)?;
    Ok(())
}

/// Append a value to the data space.
///
/// Signature: `value -- `
fn word_comma(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    let _ = interpreter.comma(value);
    Ok(())
}

/// Signature: `address -- value`
fn word_fetch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop_as_int()?;
    let value = interpreter.fetch(address)?;

    interpreter.push(value);
    Ok(())
}

/// Signature: `value address -- `
fn word_store(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop_as_int()?;
    let value = interpreter.pop()?;

    interpreter.store(address, value)
}

/// Add to the integer held in a cell.
///
/// Signature: `n address -- `
fn word_plus_store(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.pop_as_int()?;
    let increment = interpreter.pop_as_int()?;
    let current = interpreter.fetch(address)?;
    let current = *current.as_int(interpreter)?;

    interpreter.store(address, Value::Int(current.wrapping_add(increment)))
}

/// Signature: `name: -- `
fn word_variable(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.comma(Value::Int(0));

    let _ = define_data_word(interpreter, WordBody::Created, Some(address))?;
    Ok(())
}

/// Signature: `value name: -- `
fn word_constant(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    let _ = define_data_word(interpreter, WordBody::Constant(value), None)?;
    Ok(())
}

/// Signature: `value name: -- `
fn word_value(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;
    let address = interpreter.comma(value);

    let _ = define_data_word(interpreter, WordBody::Value, Some(address))?;
    Ok(())
}

/// Assign to a local or to a `VALUE`.  Immediate so that locals can be resolved while compiling.
///
/// Signature: `value name: -- `
fn word_to(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;

    let is_local = interpreter.is_compiling()
        && interpreter
            .definition()
            .is_some_and(|definition| definition.is_local(&name));

    if is_local {
        return interpreter.compile_action(Action::StoreLocal(name.to_uppercase()));
    }

    let address = target_address(
        interpreter,
        &name,
        |body| matches!(body, WordBody::Value),
        "VALUE",
    )?;

    if interpreter.is_compiling() {
        interpreter.compile_action(Action::StoreValue(name, address))
    } else {
        let value = interpreter.pop()?;
        interpreter.store(address as i64, value)
    }
}

/// Start a word that pushes the address of the data space that follows it.
///
/// Signature: `name: -- `
fn word_create(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let here = interpreter.here();

    let _ = define_data_word(interpreter, WordBody::Created, Some(here))?;
    Ok(())
}

/// Everything after `DOES>` becomes the run time behavior of the word last made by `CREATE`.
///
/// Signature: ` -- `
fn word_does(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    if !interpreter.is_compiling() {
        return kind_error(
            interpreter,
            ErrorKind::CompileError,
            "DOES> can only be used while compiling.".to_string(),
        );
    }

    interpreter.definition_mut()?.mark_does()
}

/// Signature: `xt -- address`
fn word_to_body(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let word = interpreter.pop_as_word()?;

    match word.data_address() {
        Some(address) => {
            interpreter.push(Value::from(address));
            Ok(())
        }

        None => script_error(interpreter, format!("Word {} has no data field.", word)),
    }
}

/// Signature: `name: -- `
fn word_defer(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let address = interpreter.comma(Value::Int(0));

    let _ = define_data_word(interpreter, WordBody::Deferred, Some(address))?;
    Ok(())
}

/// Set the word a deferred word executes.
///
/// Signature: `xt name: -- `
fn word_is(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;
    let address = target_address(
        interpreter,
        &name,
        |body| matches!(body, WordBody::Deferred),
        "deferred word",
    )?;

    if interpreter.is_compiling() {
        interpreter.compile_action(Action::SetDeferred(name, address))
    } else {
        let word = interpreter.pop_as_word()?;
        interpreter.store(address as i64, Value::Word(word))
    }
}

fn set_base(interpreter: &mut dyn Interpreter, base: i64) -> error::Result<()> {
    interpreter.store(BASE_ADDRESS as i64, Value::Int(base))
}

/// Register the data space and defining words.
pub fn register_memory_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "here",
        word_here,
        "The next free data space address.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "allot",
        word_allot,
        "Reserve cells in the data space.",
        "n -- "
    );

    add_native_word!(
        interpreter,
        ",",
        word_comma,
        "Append a value to the data space.",
        "value -- "
    );

    add_native_word!(interpreter, "@", word_fetch, "Read a cell.", "address -- value");

    add_native_word!(interpreter, "!", word_store, "Write a cell.", "value address -- ");

    add_native_word!(
        interpreter,
        "+!",
        word_plus_store,
        "Add to the integer in a cell.",
        "n address -- "
    );

    add_native_word!(
        interpreter,
        "cells",
        |_interpreter: &mut dyn Interpreter| Ok(()),
        "Size of n cells in address units, cells are the unit.",
        "n -- n"
    );

    add_native_word!(
        interpreter,
        "cell+",
        |interpreter: &mut dyn Interpreter| {
            let address = interpreter.pop_as_int()?;

            interpreter.push(Value::Int(address.wrapping_add(1)));
            Ok(())
        },
        "The address of the next cell.",
        "address -- address+1"
    );

    add_native_word!(
        interpreter,
        "variable",
        word_variable,
        "Define a variable holding one cell.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "constant",
        word_constant,
        "Define a constant.",
        "value name: -- "
    );

    add_native_word!(
        interpreter,
        "value",
        word_value,
        "Define a value, changed with TO.",
        "value name: -- "
    );

    add_native_immediate_word!(
        interpreter,
        "to",
        word_to,
        "Assign to a local or a VALUE.",
        "value name: -- "
    );

    add_native_word!(
        interpreter,
        "create",
        word_create,
        "Define a word pushing the address of the data space that follows.",
        "name: -- "
    );

    add_native_immediate_word!(
        interpreter,
        "does>",
        word_does,
        "Give the last CREATEd word the behavior that follows.",
        " -- "
    );

    add_native_word!(
        interpreter,
        ">body",
        word_to_body,
        "The data address of a word.",
        "xt -- address"
    );

    add_native_word!(
        interpreter,
        "defer",
        word_defer,
        "Define a word whose behavior is set later with IS.",
        "name: -- "
    );

    add_native_immediate_word!(
        interpreter,
        "is",
        word_is,
        "Set the word a deferred word executes.",
        "xt name: -- "
    );

    add_native_word!(
        interpreter,
        "base",
        |interpreter: &mut dyn Interpreter| {
            interpreter.push(Value::from(BASE_ADDRESS));
            Ok(())
        },
        "The address of the numeric base.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "hex",
        |interpreter: &mut dyn Interpreter| set_base(interpreter, 16),
        "Switch to base 16.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "decimal",
        |interpreter: &mut dyn Interpreter| set_base(interpreter, 10),
        "Switch to base 10.",
        " -- "
    );
}
