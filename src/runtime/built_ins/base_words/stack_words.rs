use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, kind_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// Duplicate the top value on the data stack.
///
/// Signature: `value -- value value`
fn word_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.push(value.clone());
    interpreter.push(value);

    Ok(())
}

/// Drop the top value on the data stack.
///
/// Signature: `value -- `
fn word_drop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pop()?;

    Ok(())
}

/// Swap the top 2 values on the data stack.
///
/// Signature: `a b -- b a`
fn word_swap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b);
    interpreter.push(a);

    Ok(())
}

/// Copy the second value over the top one.
///
/// Signature: `a b -- a b a`
fn word_over(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let a = interpreter.peek(1)?;

    interpreter.push(a);

    Ok(())
}

/// Rotate the third value to the top.
///
/// Signature: `a b c -- b c a`
fn word_rot(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let c = interpreter.pop()?;
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b);
    interpreter.push(c);
    interpreter.push(a);

    Ok(())
}

/// Rotate the top value down to third.
///
/// Signature: `a b c -- c a b`
fn word_minus_rot(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let c = interpreter.pop()?;
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(c);
    interpreter.push(a);
    interpreter.push(b);

    Ok(())
}

/// Drop the second value.
///
/// Signature: `a b -- b`
fn word_nip(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pick(1)?;

    Ok(())
}

/// Copy the top value under the second.
///
/// Signature: `a b -- b a b`
fn word_tuck(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b.clone());
    interpreter.push(a);
    interpreter.push(b);

    Ok(())
}

fn stack_index(interpreter: &mut dyn Interpreter) -> error::Result<usize> {
    let index = interpreter.pop_as_int()?;
    let count = interpreter.stack().len() as i64;

    if index < 0 || index >= count {
        return kind_error(
            interpreter,
            ErrorKind::StackUnderflow,
            format!("Index {} out of range of stack size {}.", index, count),
        );
    }

    Ok(index as usize)
}

/// Copy the value at the given depth to the top, `0 PICK` is `DUP`.
///
/// Signature: `... n -- ... value`
fn word_pick(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = stack_index(interpreter)?;
    let value = interpreter.peek(index)?;

    interpreter.push(value);

    Ok(())
}

/// Move the value at the given depth to the top, `2 ROLL` is `ROT`.
///
/// Signature: `... n -- ... value`
fn word_roll(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = stack_index(interpreter)?;
    let value = interpreter.pick(index)?;

    interpreter.push(value);

    Ok(())
}

/// Duplicate the top value only if it's non-zero.
///
/// Signature: `n -- n n | 0`
fn word_question_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.peek(0)?;

    if value != Value::Int(0) {
        interpreter.push(value);
    }

    Ok(())
}

/// Signature: `a b -- a b a b`
fn word_two_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let a = interpreter.peek(1)?;
    let b = interpreter.peek(0)?;

    interpreter.push(a);
    interpreter.push(b);

    Ok(())
}

/// Signature: `a b -- `
fn word_two_drop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pop()?;
    let _ = interpreter.pop()?;

    Ok(())
}

/// Signature: `a b c d -- c d a b`
fn word_two_swap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let d = interpreter.pop()?;
    let c = interpreter.pop()?;
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(c);
    interpreter.push(d);
    interpreter.push(a);
    interpreter.push(b);

    Ok(())
}

/// Signature: `a b c d -- a b c d a b`
fn word_two_over(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let a = interpreter.peek(3)?;
    let b = interpreter.peek(2)?;

    interpreter.push(a);
    interpreter.push(b);

    Ok(())
}

/// Get the depth of the data stack before calling this word.
///
/// Signature: ` -- depth`
fn word_depth(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.stack().len();

    interpreter.push(Value::from(depth));

    Ok(())
}

/// Signature: `... -- `
fn word_clear_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.clear_stack();

    Ok(())
}

/// Move the top value to the return stack.
///
/// Signature: `value -- ` R: ` -- value`
fn word_to_r(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.return_stack_push(value);

    Ok(())
}

/// Move the top of the return stack back to the data stack.
///
/// Signature: ` -- value` R: `value -- `
fn word_r_from(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.return_stack_pop()?;

    interpreter.push(value);

    Ok(())
}

/// Copy the top of the return stack.
///
/// Signature: ` -- value` R: `value -- value`
fn word_r_fetch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.return_stack_peek()?;

    interpreter.push(value);

    Ok(())
}

/// Signature: `a b -- ` R: ` -- a b`
fn word_two_to_r(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.return_stack_push(a);
    interpreter.return_stack_push(b);

    Ok(())
}

/// Signature: ` -- a b` R: `a b -- `
fn word_two_r_from(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.return_stack_pop()?;
    let a = interpreter.return_stack_pop()?;

    interpreter.push(a);
    interpreter.push(b);

    Ok(())
}

fn push_loop_index(interpreter: &mut dyn Interpreter, depth: usize) -> error::Result<()> {
    let index = interpreter.loop_index(depth)?;

    interpreter.push(Value::Int(index));

    Ok(())
}

/// Register the data and return stack words with the interpreter.
pub fn register_stack_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "dup",
        word_dup,
        "Duplicate the top value on the data stack.",
        "value -- value value"
    );

    add_native_word!(
        interpreter,
        "drop",
        word_drop,
        "Discard the top value on the data stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "swap",
        word_swap,
        "Swap the top 2 values on the data stack.",
        "a b -- b a"
    );

    add_native_word!(
        interpreter,
        "over",
        word_over,
        "Copy the second value to the top.",
        "a b -- a b a"
    );

    add_native_word!(
        interpreter,
        "rot",
        word_rot,
        "Rotate the third value to the top.",
        "a b c -- b c a"
    );

    add_native_word!(
        interpreter,
        "-rot",
        word_minus_rot,
        "Rotate the top value down to third.",
        "a b c -- c a b"
    );

    add_native_word!(interpreter, "nip", word_nip, "Drop the second value.", "a b -- b");

    add_native_word!(
        interpreter,
        "tuck",
        word_tuck,
        "Copy the top value under the second.",
        "a b -- b a b"
    );

    add_native_word!(
        interpreter,
        "pick",
        word_pick,
        "Copy the value at the given depth to the top.",
        "... n -- ... value"
    );

    add_native_word!(
        interpreter,
        "roll",
        word_roll,
        "Move the value at the given depth to the top.",
        "... n -- ... value"
    );

    add_native_word!(
        interpreter,
        "?dup",
        word_question_dup,
        "Duplicate the top value if it's non-zero.",
        "n -- n n | 0"
    );

    add_native_word!(
        interpreter,
        "2dup",
        word_two_dup,
        "Duplicate the top pair.",
        "a b -- a b a b"
    );

    add_native_word!(interpreter, "2drop", word_two_drop, "Drop the top pair.", "a b -- ");

    add_native_word!(
        interpreter,
        "2swap",
        word_two_swap,
        "Swap the top 2 pairs.",
        "a b c d -- c d a b"
    );

    add_native_word!(
        interpreter,
        "2over",
        word_two_over,
        "Copy the second pair to the top.",
        "a b c d -- a b c d a b"
    );

    add_native_word!(
        interpreter,
        "depth",
        word_depth,
        "Get the depth of the stack before calling this word.",
        " -- depth"
    );

    add_native_word!(
        interpreter,
        "clearstack",
        word_clear_stack,
        "Empty the data stack.",
        "... -- "
    );

    add_native_word!(
        interpreter,
        ">r",
        word_to_r,
        "Move the top value to the return stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "r>",
        word_r_from,
        "Move the top of the return stack to the data stack.",
        " -- value"
    );

    add_native_word!(
        interpreter,
        "r@",
        word_r_fetch,
        "Copy the top of the return stack.",
        " -- value"
    );

    add_native_word!(
        interpreter,
        "2>r",
        word_two_to_r,
        "Move the top pair to the return stack.",
        "a b -- "
    );

    add_native_word!(
        interpreter,
        "2r>",
        word_two_r_from,
        "Move a pair from the return stack to the data stack.",
        " -- a b"
    );

    add_native_word!(
        interpreter,
        "i",
        |interpreter: &mut dyn Interpreter| push_loop_index(interpreter, 0),
        "The index of the innermost loop.",
        " -- index"
    );

    add_native_word!(
        interpreter,
        "j",
        |interpreter: &mut dyn Interpreter| push_loop_index(interpreter, 1),
        "The index of the next outer loop.",
        " -- index"
    );

    add_native_word!(
        interpreter,
        "k",
        |interpreter: &mut dyn Interpreter| push_loop_index(interpreter, 2),
        "The index of the third loop out.",
        " -- index"
    );
}
