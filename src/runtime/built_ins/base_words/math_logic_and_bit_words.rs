use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, kind_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// Helper function to handle binary integer operations.  The stack operations and type checks are
/// handled here.
fn int_op(interpreter: &mut dyn Interpreter, op: fn(i64, i64) -> i64) -> error::Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::Int(op(a, b)));
    Ok(())
}

/// Helper function for unary integer operations.
fn unary_op(interpreter: &mut dyn Interpreter, op: fn(i64) -> i64) -> error::Result<()> {
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::Int(op(a)));
    Ok(())
}

/// Helper function for integer comparisons, pushing a -1/0 flag.
fn compare_op(interpreter: &mut dyn Interpreter, op: fn(i64, i64) -> bool) -> error::Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::from(op(a, b)));
    Ok(())
}

fn zero_compare_op(interpreter: &mut dyn Interpreter, op: fn(i64) -> bool) -> error::Result<()> {
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::from(op(a)));
    Ok(())
}

fn check_divisor(interpreter: &mut dyn Interpreter, divisor: i64) -> error::Result<()> {
    if divisor == 0 {
        return kind_error(interpreter, ErrorKind::DivideByZero, "Division by zero.".to_string());
    }

    Ok(())
}

/// Division truncating toward zero, the remainder takes the dividend's sign.  Works in 128 bits so
/// that intermediate products and `MIN / -1` don't overflow.
fn div_mod(a: i128, b: i128) -> (i128, i128) {
    (a % b, a / b)
}

/// Signature: `a b -- quotient`
fn word_divide(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    check_divisor(interpreter, b)?;

    let (_, quotient) = div_mod(a as i128, b as i128);
    interpreter.push(Value::Int(quotient as i64));

    Ok(())
}

/// Signature: `a b -- remainder`
fn word_mod(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    check_divisor(interpreter, b)?;

    let (remainder, _) = div_mod(a as i128, b as i128);
    interpreter.push(Value::Int(remainder as i64));

    Ok(())
}

/// Signature: `a b -- remainder quotient`
fn word_div_mod(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    check_divisor(interpreter, b)?;

    let (remainder, quotient) = div_mod(a as i128, b as i128);
    interpreter.push(Value::Int(remainder as i64));
    interpreter.push(Value::Int(quotient as i64));

    Ok(())
}

/// Multiply then divide with a double width intermediate product.
///
/// Signature: `a b c -- (a*b)/c`
fn word_star_slash(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let c = interpreter.pop_as_int()?;
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    check_divisor(interpreter, c)?;

    let (_, quotient) = div_mod(a as i128 * b as i128, c as i128);
    interpreter.push(Value::Int(quotient as i64));

    Ok(())
}

/// Signature: `a b c -- remainder quotient`
fn word_star_slash_mod(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let c = interpreter.pop_as_int()?;
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    check_divisor(interpreter, c)?;

    let (remainder, quotient) = div_mod(a as i128 * b as i128, c as i128);
    interpreter.push(Value::Int(remainder as i64));
    interpreter.push(Value::Int(quotient as i64));

    Ok(())
}

/// Shift amounts outside of 0..64 shift every bit out.
fn shift_amount(amount: i64) -> Option<u32> {
    if (0..64).contains(&amount) {
        Some(amount as u32)
    } else {
        None
    }
}

/// Register the integer math, logic, bit manipulation and comparison words.
pub fn register_math_logic_and_bit_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "+",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a.wrapping_add(b)),
        "Add 2 integers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "-",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a.wrapping_sub(b)),
        "Subtract 2 integers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "*",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a.wrapping_mul(b)),
        "Multiply 2 integers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "/",
        word_divide,
        "Divide 2 integers, rounding toward zero.",
        "a b -- quotient"
    );

    add_native_word!(
        interpreter,
        "mod",
        word_mod,
        "The remainder of a division.",
        "a b -- remainder"
    );

    add_native_word!(
        interpreter,
        "/mod",
        word_div_mod,
        "Divide, keeping both remainder and quotient.",
        "a b -- remainder quotient"
    );

    add_native_word!(
        interpreter,
        "*/",
        word_star_slash,
        "Multiply then divide without losing the intermediate product.",
        "a b c -- quotient"
    );

    add_native_word!(
        interpreter,
        "*/mod",
        word_star_slash_mod,
        "Multiply then divide, keeping both remainder and quotient.",
        "a b c -- remainder quotient"
    );

    add_native_word!(
        interpreter,
        "negate",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| a.wrapping_neg()),
        "Negate an integer.",
        "a -- -a"
    );

    add_native_word!(
        interpreter,
        "abs",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| a.wrapping_abs()),
        "The absolute value of an integer.",
        "a -- |a|"
    );

    add_native_word!(
        interpreter,
        "min",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a.min(b)),
        "The smaller of 2 integers.",
        "a b -- min"
    );

    add_native_word!(
        interpreter,
        "max",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a.max(b)),
        "The larger of 2 integers.",
        "a b -- max"
    );

    add_native_word!(
        interpreter,
        "1+",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| a.wrapping_add(1)),
        "Add one.",
        "a -- a+1"
    );

    add_native_word!(
        interpreter,
        "1-",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| a.wrapping_sub(1)),
        "Subtract one.",
        "a -- a-1"
    );

    add_native_word!(
        interpreter,
        "2*",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| a.wrapping_shl(1)),
        "Shift left by one bit.",
        "a -- a*2"
    );

    add_native_word!(
        interpreter,
        "2/",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| a >> 1),
        "Arithmetic shift right by one bit.",
        "a -- a/2"
    );

    add_native_word!(
        interpreter,
        "and",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a & b),
        "Bitwise AND two numbers together.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "or",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a | b),
        "Bitwise OR two numbers together.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "xor",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| a ^ b),
        "Bitwise XOR two numbers together.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "invert",
        |interpreter: &mut dyn Interpreter| unary_op(interpreter, |a| !a),
        "Bitwise NOT a number.",
        "a -- result"
    );

    add_native_word!(
        interpreter,
        "lshift",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| match shift_amount(b) {
            Some(amount) => ((a as u64) << amount) as i64,
            None => 0,
        }),
        "Shift a number's bits to the left.",
        "value amount -- result"
    );

    add_native_word!(
        interpreter,
        "rshift",
        |interpreter: &mut dyn Interpreter| int_op(interpreter, |a, b| match shift_amount(b) {
            Some(amount) => ((a as u64) >> amount) as i64,
            None => 0,
        }),
        "Logical shift of a number's bits to the right.",
        "value amount -- result"
    );

    // Comparisons, flags are -1 for true and 0 for false.
    add_native_word!(
        interpreter,
        "=",
        |interpreter: &mut dyn Interpreter| {
            let b = interpreter.pop()?;
            let a = interpreter.pop()?;

            interpreter.push(Value::from(a == b));
            Ok(())
        },
        "Are 2 values equal?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<>",
        |interpreter: &mut dyn Interpreter| {
            let b = interpreter.pop()?;
            let a = interpreter.pop()?;

            interpreter.push(Value::from(a != b));
            Ok(())
        },
        "Are 2 values different?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<",
        |interpreter: &mut dyn Interpreter| compare_op(interpreter, |a, b| a < b),
        "Is one integer less than another?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        ">",
        |interpreter: &mut dyn Interpreter| compare_op(interpreter, |a, b| a > b),
        "Is one integer greater than another?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<=",
        |interpreter: &mut dyn Interpreter| compare_op(interpreter, |a, b| a <= b),
        "Is one integer less than or equal to another?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        ">=",
        |interpreter: &mut dyn Interpreter| compare_op(interpreter, |a, b| a >= b),
        "Is one integer greater or equal to another?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "0=",
        |interpreter: &mut dyn Interpreter| zero_compare_op(interpreter, |a| a == 0),
        "Is the integer zero?",
        "a -- flag"
    );

    add_native_word!(
        interpreter,
        "0<",
        |interpreter: &mut dyn Interpreter| zero_compare_op(interpreter, |a| a < 0),
        "Is the integer negative?",
        "a -- flag"
    );

    add_native_word!(
        interpreter,
        "0>",
        |interpreter: &mut dyn Interpreter| zero_compare_op(interpreter, |a| a > 0),
        "Is the integer positive?",
        "a -- flag"
    );

    add_native_word!(
        interpreter,
        "true",
        |interpreter: &mut dyn Interpreter| {
            interpreter.push(Value::from(true));
            Ok(())
        },
        "The true flag, all bits set.",
        " -- -1"
    );

    add_native_word!(
        interpreter,
        "false",
        |interpreter: &mut dyn Interpreter| {
            interpreter.push(Value::from(false));
            Ok(())
        },
        "The false flag.",
        " -- 0"
    );
}

#[cfg(test)]
mod tests {
    use super::div_mod;

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(div_mod(7, 2), (1, 3));
        assert_eq!(div_mod(-7, 2), (-1, -3));
        assert_eq!(div_mod(7, -2), (1, -3));
        assert_eq!(div_mod(i64::MIN as i128, -1), (0, i64::MAX as i128 + 1));
    }
}
