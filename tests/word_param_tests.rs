// Parameterized stack effect tests using test-case.


use stackweave::runtime::interpreter::{CodeManagement, InterpreterStack};
use stackweave::runtime::error::{ErrorKind, Result};
use stackweave::{load_prelude, register_standard_words, BufferIo, ForthInterpreter, Value};
use std::sync::Arc;
use test_case::test_case;

fn eval_and_stack(word: &str, init_stack: &[i64]) -> Result<Vec<i64>> {
    let mut interp = ForthInterpreter::with_io(Arc::new(BufferIo::new()));
    register_standard_words(&mut interp);
    load_prelude(&mut interp)?;
    for &v in init_stack {
        interp.push(Value::from(v));
    }
    interp.process_source("<test>", word)?;
    let stack = interp
        .stack()
        .iter()
        .map(|v| match v {
            Value::Int(n) => *n,
            other => panic!("expected only integers on the stack, found {:?}", other),
        })
        .collect::<Vec<_>>();
    Ok(stack)
}


#[test_case("0", &[], &[0]; "zero")]
#[test_case("42", &[], &[42]; "number")]
#[test_case("-42", &[], &[-42]; "negative number")]
#[test_case("$ff", &[], &[255]; "hex prefix")]
#[test_case("%101", &[], &[5]; "binary prefix")]
#[test_case("#19", &[], &[19]; "decimal prefix")]
#[test_case("'a'", &[], &[97]; "character literal")]
#[test_case("-9223372036854775808", &[], &[i64::MIN]; "most negative integer")]
#[test_case("9223372036854775807", &[], &[i64::MAX]; "most positive integer")]
#[test_case("true", &[], &[-1]; "true word")]
#[test_case("false", &[], &[0]; "false word")]
#[test_case("bl", &[], &[32]; "blank constant")]
#[test_case("+", &[2, 2], &[4]; "simple add")]
#[test_case(": t 9223372036854775800 0 do i 4611686018427387904 +loop ; t", &[], &[0, 4611686018427387904]; "plus loop stops instead of wrapping")]
#[test_case(": t -9223372036854775800 0 do i -4611686018427387905 +loop ; t", &[], &[0, -4611686018427387905]; "negative plus loop stops instead of wrapping")]
#[test_case("-", &[5, 2], &[3]; "simple sub")]
#[test_case("*", &[3, 4], &[12]; "simple mul")]
#[test_case("/", &[12, 3], &[4]; "simple div")]
#[test_case("/", &[-7, 2], &[-3]; "div truncates toward zero")]
#[test_case("mod", &[13, 5], &[3]; "simple mod")]
#[test_case("mod", &[-7, 2], &[-1]; "mod takes the sign of the dividend")]
#[test_case("/mod", &[13, 5], &[3, 2]; "simple div mod")]
#[test_case("*/", &[912345678, 34, 100], &[310197530]; "mul div")]
#[test_case("*/mod", &[912345678, 34, 100], &[52, 310197530]; "mul div rem")]
#[test_case("2*", &[7], &[14]; "times two")]
#[test_case("2/", &[-8], &[-4]; "divide by two")]
#[test_case("1+", &[41], &[42]; "add one")]
#[test_case("1-", &[43], &[42]; "sub one")]
#[test_case("abs", &[-9], &[9]; "abs of negative number")]
#[test_case("abs", &[9], &[9]; "abs of positive number")]
#[test_case("negate", &[9], &[-9]; "negate positive number")]
#[test_case("negate", &[-9], &[9]; "negate negative number")]
#[test_case("min", &[3, 7], &[3]; "min")]
#[test_case("max", &[3, 7], &[7]; "max")]
#[test_case("and", &[12, 10], &[8]; "bitwise and")]
#[test_case("or", &[12, 10], &[14]; "bitwise or")]
#[test_case("xor", &[12, 10], &[6]; "bitwise xor")]
#[test_case("invert", &[1], &[-2]; "invert")]
#[test_case("lshift", &[1, 4], &[16]; "left shift")]
#[test_case("rshift", &[16, 2], &[4]; "right shift")]
#[test_case("rshift", &[-1, 63], &[1]; "right shift is logical")]
#[test_case("lshift", &[1, 64], &[0]; "oversized shift is zero")]
#[test_case("=", &[5, 5], &[-1]; "equal")]
#[test_case("<>", &[5, 6], &[-1]; "not equal")]
#[test_case("<", &[1, 2], &[-1]; "less than")]
#[test_case(">", &[1, 2], &[0]; "greater than")]
#[test_case("<=", &[2, 2], &[-1]; "less or equal")]
#[test_case(">=", &[1, 2], &[0]; "greater or equal")]
#[test_case("0=", &[0], &[-1]; "zero equal")]
#[test_case("0<", &[-3], &[-1]; "zero less")]
#[test_case("0>", &[0], &[0]; "zero greater")]
#[test_case("0<>", &[4], &[-1]; "zero not equal from the prelude")]
#[test_case("dup", &[1], &[1, 1]; "dup")]
#[test_case("drop", &[1, 2], &[1]; "drop")]
#[test_case("swap", &[1, 2], &[2, 1]; "swap")]
#[test_case("over", &[1, 2], &[1, 2, 1]; "over")]
#[test_case("rot", &[1, 2, 3], &[2, 3, 1]; "rot")]
#[test_case("-rot", &[1, 2, 3], &[3, 1, 2]; "minus rot")]
#[test_case("nip", &[1, 2], &[2]; "nip")]
#[test_case("tuck", &[1, 2], &[2, 1, 2]; "tuck")]
#[test_case("1 pick", &[1, 2, 3], &[1, 2, 3, 2]; "pick")]
#[test_case("0 pick", &[1, 2], &[1, 2, 2]; "zero pick is dup")]
#[test_case("3 roll", &[1, 2, 3, 4], &[2, 3, 4, 1]; "roll")]
#[test_case("?dup", &[0], &[0]; "question dup of zero")]
#[test_case("?dup", &[4], &[4, 4]; "question dup of non zero")]
#[test_case("2dup", &[1, 2], &[1, 2, 1, 2]; "two dup")]
#[test_case("2drop", &[1, 2, 3], &[1]; "two drop")]
#[test_case("2swap", &[1, 2, 3, 4], &[3, 4, 1, 2]; "two swap")]
#[test_case("2over", &[1, 2, 3, 4], &[1, 2, 3, 4, 1, 2]; "two over")]
#[test_case("depth", &[5, 6], &[5, 6, 2]; "depth")]
#[test_case("clearstack", &[5, 6], &[]; "clear stack")]
#[test_case(">r 1 r>", &[9], &[1, 9]; "return stack round trip")]
#[test_case(">r r@ r>", &[9], &[9, 9]; "return stack fetch")]
#[test_case("2>r 2r>", &[1, 2], &[1, 2]; "two return stack round trip")]
#[test_case("base @", &[], &[10]; "default base")]
#[test_case("hex base @ decimal", &[], &[16]; "hex base")]
#[test_case("hex ff decimal", &[], &[255]; "hex number")]
#[test_case("2 base ! 101 decimal", &[], &[5]; "binary base")]
#[test_case("char A", &[], &[65]; "char")]
#[test_case("variable v 5 v ! v @", &[], &[5]; "variable")]
#[test_case("variable v 3 v +! 4 v +! v @", &[], &[7]; "plus store")]
#[test_case("10 constant ten ten ten +", &[], &[20]; "constant")]
#[test_case("1 value x 7 to x x", &[], &[7]; "value and to")]
#[test_case("here 3 allot here swap -", &[], &[3]; "allot")]
#[test_case("create t 1 , 2 , t cell+ @", &[], &[2]; "create and comma")]
#[test_case("3 cells", &[], &[3]; "cells")]
#[test_case("create t ' t >body t =", &[], &[-1]; "body of created word")]
#[test_case("7 s>f 2 s>f f/ f>s", &[], &[3]; "float division")]
#[test_case("1.5 1.5 f+ f>s", &[], &[3]; "float literals")]
#[test_case("2 s>f 3 s>f f<", &[], &[-1]; "float compare")]
#[test_case("2 s>f 2.0 f=", &[], &[-1]; "float equal")]
fn stack_effect_cases(word: &str, init_stack: &[i64], expected: &[i64]) {
    let stack = eval_and_stack(word, init_stack).unwrap();
    assert_eq!(stack, expected, "word: {:?}", word);
}


#[test_case("+", &[]; "add underflow")]
#[test_case("drop", &[]; "drop underflow")]
#[test_case("1 pick", &[5]; "pick past the bottom")]
#[test_case("swap", &[1]; "swap underflow")]
#[test_case("r>", &[]; "empty return stack")]
fn stack_underflow_cases(word: &str, init_stack: &[i64]) {
    let error = eval_and_stack(word, init_stack).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::StackUnderflow);
    assert_eq!(error.catch_code(), -4);
}


#[test_case("/", &[1, 0], ErrorKind::DivideByZero; "divide by zero")]
#[test_case("mod", &[1, 0], ErrorKind::DivideByZero; "modulo by zero")]
#[test_case("*/", &[1, 2, 0], ErrorKind::DivideByZero; "scaled divide by zero")]
#[test_case("nosuchword", &[], ErrorKind::UndefinedWord; "undefined word")]
#[test_case("9223372036854775808", &[], ErrorKind::UndefinedWord; "integer literal out of range")]
#[test_case("i", &[], ErrorKind::StackUnderflow; "loop index outside a loop")]
#[test_case(": t 3 0 do j loop ; t", &[], ErrorKind::StackUnderflow; "outer index of a single loop")]
#[test_case("then", &[], ErrorKind::CompileError; "then without if")]
#[test_case(": broken if ;", &[], ErrorKind::CompileError; "unclosed if")]
#[test_case(": broken begin 1 loop ;", &[], ErrorKind::CompileError; "mismatched closing word")]
#[test_case(": broken leave ;", &[], ErrorKind::CompileError; "leave outside a loop")]
#[test_case("s\" x\" 1 +", &[], ErrorKind::TypeError; "string in arithmetic")]
#[test_case("1.5 1 +", &[], ErrorKind::TypeError; "float in integer arithmetic")]
#[test_case("5 execute", &[], ErrorKind::TypeError; "execute a number")]
#[test_case("5 to nothing", &[], ErrorKind::UndefinedWord; "to an unknown name")]
#[test_case("5 constant c 6 to c", &[], ErrorKind::TypeError; "to a constant")]
fn error_kind_cases(word: &str, init_stack: &[i64], kind: ErrorKind) {
    let error = eval_and_stack(word, init_stack).unwrap_err();
    assert_eq!(error.kind(), kind, "word: {:?}", word);
    assert_eq!(error.catch_code(), kind.code());
}


#[test_case("abort", -1; "abort")]
#[test_case("abort\" failed\"", -2; "abort quote")]
#[test_case("100000 @", -9; "fetch outside the data space")]
#[test_case("42 throw", 42; "arbitrary throw code")]
#[test_case("-13 throw", -13; "throw of a known code")]
fn error_code_cases(word: &str, code: i64) {
    let error = eval_and_stack(word, &[]).unwrap_err();
    assert_eq!(error.code(), code);
    assert_eq!(error.kind(), ErrorKind::from_code(code));
}


#[test]
#[should_panic]
fn should_panic_for_unterminated_string() {
    eval_and_stack("s\" never closed", &[]).unwrap();
}
