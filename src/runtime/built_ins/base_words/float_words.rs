use crate::{
    add_native_word,
    runtime::{data_structures::value::Value, error, interpreter::Interpreter},
};

fn float_op(interpreter: &mut dyn Interpreter, op: fn(f64, f64) -> f64) -> error::Result<()> {
    let b = interpreter.pop_as_float()?;
    let a = interpreter.pop_as_float()?;

    interpreter.push(Value::Float(op(a, b)));
    Ok(())
}

fn float_compare(interpreter: &mut dyn Interpreter, op: fn(f64, f64) -> bool) -> error::Result<()> {
    let b = interpreter.pop_as_float()?;
    let a = interpreter.pop_as_float()?;

    interpreter.push(Value::from(op(a, b)));
    Ok(())
}

/// Convert an integer to a float.
///
/// Signature: `n -- float`
fn word_int_to_float(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop_as_int()?;

    interpreter.push(Value::Float(value as f64));
    Ok(())
}

/// Convert a float to an integer, truncating toward zero.  Out of range values saturate.
///
/// Signature: `float -- n`
fn word_float_to_int(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop_as_float()?;

    interpreter.push(Value::Int(value as i64));
    Ok(())
}

/// Print a float followed by a space.
///
/// Signature: `float -- `
fn word_print_float(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop_as_float()?;

    interpreter.io().write_text(&format!("{:?} ", value))
}

/// The float words.  Floats never mix with integers, conversion is always explicit.
pub fn register_float_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "s>f",
        word_int_to_float,
        "Convert an integer to a float.",
        "n -- float"
    );

    add_native_word!(
        interpreter,
        "f>s",
        word_float_to_int,
        "Convert a float to an integer, truncating toward zero.",
        "float -- n"
    );

    add_native_word!(
        interpreter,
        "f+",
        |interpreter: &mut dyn Interpreter| float_op(interpreter, |a, b| a + b),
        "Add 2 floats.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "f-",
        |interpreter: &mut dyn Interpreter| float_op(interpreter, |a, b| a - b),
        "Subtract 2 floats.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "f*",
        |interpreter: &mut dyn Interpreter| float_op(interpreter, |a, b| a * b),
        "Multiply 2 floats.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "f/",
        |interpreter: &mut dyn Interpreter| float_op(interpreter, |a, b| a / b),
        "Divide 2 floats.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "f<",
        |interpreter: &mut dyn Interpreter| float_compare(interpreter, |a, b| a < b),
        "Is one float less than another?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "f=",
        |interpreter: &mut dyn Interpreter| float_compare(interpreter, |a, b| a == b),
        "Are 2 floats equal?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "f.",
        word_print_float,
        "Print a float.",
        "float -- "
    );
}
