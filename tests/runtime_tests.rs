// Exceptions, namespaces, tasks, blocks, text I/O and host functions.


use stackweave::runtime::error::{ErrorKind, Result, ScriptError};
use stackweave::runtime::interpreter::{CodeManagement, InterpreterStack, WordManagement};
use stackweave::{
    load_prelude, register_plugin_word, register_standard_words, BufferIo, ForthInterpreter,
    Interpreter, MemoryBlocks, Value,
};
use std::sync::Arc;
use test_case::test_case;

fn new_interpreter() -> (ForthInterpreter, Arc<BufferIo>) {
    let io = Arc::new(BufferIo::new());
    let mut interp = ForthInterpreter::with_io(io.clone());
    register_standard_words(&mut interp);
    load_prelude(&mut interp).unwrap();
    (interp, io)
}

fn ints(interp: &ForthInterpreter) -> Vec<i64> {
    interp
        .stack()
        .iter()
        .map(|v| match v {
            Value::Int(n) => *n,
            other => panic!("expected only integers on the stack, found {:?}", other),
        })
        .collect()
}

fn eval(code: &str) -> Result<Vec<i64>> {
    let (mut interp, _) = new_interpreter();
    interp.process_source("<test>", code)?;
    Ok(ints(&interp))
}

fn output_of(code: &str) -> String {
    let (mut interp, io) = new_interpreter();
    interp.process_source("<test>", code).unwrap();
    io.take_output()
}


#[test_case(": boom 1 0 / ; 1 2 ' boom catch", &[1, 2, -10]; "divide by zero code")]
#[test_case("5 ' dup catch", &[5, 5, 0]; "success pushes zero")]
#[test_case(": t 99 throw ; ' t catch", &[99]; "thrown code")]
#[test_case(": t abort\" bad\" ; ' t catch", &[-2]; "abort quote code")]
#[test_case("' abort catch", &[-1]; "abort code")]
#[test_case("' drop catch", &[-4]; "stack underflow code")]
#[test_case(": t nosuch ; ' t catch", &[-13]; "undefined word code")]
#[test_case("0 throw", &[]; "zero throw does nothing")]
#[test_case(": inner 7 throw ; : outer ['] inner catch 1+ ; outer", &[8]; "catch inside a definition")]
#[test_case(": messy 1 2 3 4 5 throw ; 9 ' messy catch", &[9, 5]; "catch restores the depth")]
#[test_case(": boom 1 0 / ; : t 3 0 do i ['] boom catch drop loop ; t", &[0, 1, 2]; "catch inside a loop")]
#[test_case(": t 5 >r 1 throw ; ' t catch", &[1]; "catch unwinds the return stack")]
#[test_case(": inner 3 throw ; : middle inner 100 ; : outer ['] middle catch ; outer", &[3]; "throw crosses several words")]
#[test_case(": t recurse ; ' t catch", &[-5]; "catch of runaway recursion")]
#[test_case(": t 1 if 1 if 1 0 do 1 begin 1 case 1 of recurse endof endcase 0 until loop then then ; ' t catch",
            &[-5]; "catch of runaway recursion inside control structures")]
#[test_case(": t s\" t\" evaluate ; ' t catch", &[-5]; "catch of runaway evaluate")]
#[test_case("defer d : t ['] d execute ; ' t is d ' t catch", &[-5]; "catch of runaway execute")]
fn catch_cases(code: &str, expected: &[i64]) {
    assert_eq!(eval(code).unwrap(), expected);
}


#[test]
fn catch_adds_exactly_one_value() {
    let (mut interp, _) = new_interpreter();

    interp
        .process_source("<test>", ": fails 10 20 30 0 / ; 1 2 3")
        .unwrap();
    let before = interp.stack().len();

    interp.process_source("<test>", "' fails catch").unwrap();
    assert_eq!(interp.stack().len(), before + 1);

    interp.process_source("<test>", "' depth catch").unwrap();
    assert_eq!(ints(&interp), vec![1, 2, 3, -10, 4, 0]);
}


#[test]
fn uncaught_errors_reach_the_caller() {
    let (mut interp, _) = new_interpreter();

    let error = interp
        .process_source("<test>", ": t 1 0 mod ; 5 t 6")
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DivideByZero);
    assert!(error.call_stack().as_ref().is_some_and(|stack| !stack.is_empty()));

    // The rest of the text was abandoned, the value pushed before the error stays.
    assert_eq!(ints(&interp), vec![5]);

    interp.reset();
    interp.process_source("<test>", "7 t").unwrap_err();
    interp.process_source("<test>", "7").unwrap();
    assert_eq!(ints(&interp), vec![7, 7]);
}


#[test]
fn words_defined_in_a_namespace_stay_there() {
    let (mut interp, _) = new_interpreter();

    interp
        .process_source(
            "<test>",
            "vocabulary tools also tools definitions : hello 42 ; previous definitions",
        )
        .unwrap();

    let error = interp.process_source("<test>", "hello").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UndefinedWord);

    assert!(interp
        .dictionary()
        .lookup_in(&Some("TOOLS".to_string()), "hello")
        .is_some());
    assert!(interp.dictionary().lookup_in(&None, "hello").is_none());

    interp.process_source("<test>", "also tools hello").unwrap();
    assert_eq!(ints(&interp), vec![42]);
}


#[test]
fn search_order_picks_the_first_match() {
    let (mut interp, _) = new_interpreter();

    interp
        .process_source(
            "<test>",
            ": greet 1 ; vocabulary loud also loud definitions : greet 2 ; greet",
        )
        .unwrap();
    assert_eq!(ints(&interp), vec![2]);

    interp.process_source("<test>", "only greet").unwrap();
    assert_eq!(ints(&interp), vec![2, 1]);
}


#[test]
fn order_and_current_are_reported() {
    let (mut interp, io) = new_interpreter();

    interp.process_source("<test>", "order").unwrap();
    assert_eq!(io.take_output(), "FORTH  current: FORTH\n");

    interp
        .process_source("<test>", "vocabulary tools also tools definitions order")
        .unwrap();
    assert_eq!(io.take_output(), "TOOLS FORTH  current: TOOLS\n");

    interp.process_source("<test>", "get-current").unwrap();
    assert_eq!(interp.stack().last(), Some(&Value::from("TOOLS")));
}


#[test_case(": push7 7 ; ' push7 future join", &[7]; "future pushes the result")]
#[test_case(": push7 7 ; ' push7 task await", &[7]; "task and await")]
#[test_case(": push7 7 ; ' push7 spawn join", &[]; "spawn pushes nothing")]
#[test_case(": push7 7 ; ' push7 future dup join drop task?", &[-1]; "finished task")]
#[test_case(": push7 7 ; ' push7 future dup join swap join", &[7, 7]; "joining twice")]
#[test_case(": push7 7 ; ' push7 future ' push7 future join swap join +", &[14]; "two futures")]
#[test_case(": sum 0 100 0 do i + loop ; ' sum future join", &[4950]; "child runs a loop")]
#[test_case("variable v : poke 9 v ! ; ' poke spawn join v @", &[0]; "child memory is a copy")]
#[test_case("variable v : poke 9 v ! ; run-next poke v @", &[0]; "run next")]
#[test_case("1 2 : add-em + ; ' add-em future join", &[1, 2]; "child starts with an empty stack")]
#[test_case("yield", &[]; "yield")]
fn task_cases(code: &str, expected: &[i64]) {
    let (mut interp, _) = new_interpreter();

    interp.process_source("<test>", code).unwrap_or_else(|error| {
        // The add-em case fails in the child, the parent's stack is untouched.
        assert_eq!(error.kind(), ErrorKind::StackUnderflow);
    });

    assert_eq!(ints(&interp), expected);
}


/// Register `wait-gate`, which blocks until `open-gate` is run on any thread.
fn register_gate(interp: &mut ForthInterpreter) {
    let (sender, receiver) = std::sync::mpsc::channel::<()>();
    let sender = std::sync::Mutex::new(sender);
    let receiver = std::sync::Mutex::new(receiver);

    register_plugin_word(interp, "wait-gate", 0, move |_: &[Value]| {
        let _ = receiver.lock().unwrap().recv();
        Ok(vec![])
    });

    register_plugin_word(interp, "open-gate", 0, move |_: &[Value]| {
        let _ = sender.lock().unwrap().send(());
        Ok(vec![])
    });
}


#[test]
fn polling_a_running_task_reports_false() {
    let (mut interp, _) = new_interpreter();
    register_gate(&mut interp);

    interp
        .process_source("<test>", ": slow wait-gate 5 ; ' slow future dup task?")
        .unwrap();
    assert_eq!(interp.stack().last(), Some(&Value::Int(0)));

    interp.process_source("<test>", "drop open-gate join").unwrap();
    assert_eq!(ints(&interp), vec![5]);
}


#[test]
fn polling_while_another_evaluator_joins() {
    let (mut interp, _) = new_interpreter();
    register_gate(&mut interp);

    // The poller checks the slow task, which can't finish before the gate opens, while the
    // parent is blocked joining that same task.
    interp
        .process_source(
            "<test>",
            "variable h : slow wait-gate 5 ; : poll h @ task? open-gate ; \
             ' slow future h ! ' poll future h @ join swap join",
        )
        .unwrap();

    assert_eq!(ints(&interp), vec![5, 0]);
}


#[test]
fn child_errors_are_raised_by_join() {
    let (mut interp, _) = new_interpreter();

    let error = interp
        .process_source("<test>", ": bad 1 0 / ; ' bad future join")
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::DivideByZero);

    interp
        .process_source("<test>", ": t ['] bad future join ; ' t catch")
        .unwrap();
    assert_eq!(interp.stack().last(), Some(&Value::Int(-10)));
}


#[test]
fn child_definitions_stay_in_the_child() {
    let (mut interp, _) = new_interpreter();

    interp
        .process_source("<test>", ": make s\" : made 1 ;\" evaluate ; ' make spawn join")
        .unwrap();

    assert!(interp.find_word("made").is_none());
}


#[test]
fn words_defined_later_are_not_seen_by_running_children() {
    let (mut interp, _) = new_interpreter();

    interp
        .process_source("<test>", ": late? s\" later\" ['] evaluate catch nip ;")
        .unwrap();
    interp
        .process_source("<test>", "' late? future : later 1 ; join")
        .unwrap();

    // The child's dictionary was a snapshot taken before `later` existed.
    assert_eq!(interp.stack().last(), Some(&Value::Int(-13)));
}


#[test]
fn blocks_hold_source_text() {
    let (mut interp, _) = new_interpreter();
    interp.set_block_manager(Arc::new(MemoryBlocks::new()));

    interp
        .process_source(
            "<test>",
            "variable buf s\" 1 2 +\" buf ! 5 buf write-block 5 load",
        )
        .unwrap();
    assert_eq!(ints(&interp), vec![3]);

    interp
        .process_source("<test>", "variable copy 5 copy read-block copy @")
        .unwrap();
    assert_eq!(interp.stack().last(), Some(&Value::from("1 2 +")));
}


#[test]
fn blocks_need_a_manager() {
    let (mut interp, _) = new_interpreter();

    let error = interp.process_source("<test>", "1 load").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unknown);
}


#[test]
fn unwritten_blocks_are_empty() {
    let (mut interp, _) = new_interpreter();
    interp.set_block_manager(Arc::new(MemoryBlocks::new()));

    interp.process_source("<test>", "7 load depth").unwrap();
    assert_eq!(ints(&interp), vec![0]);
}


#[test_case("1 2 + .", "3 "; "print number")]
#[test_case("-7 .", "-7 "; "print negative number")]
#[test_case("255 hex . decimal", "FF "; "print in hex")]
#[test_case(".\" hello\" cr", "hello\n"; "dot quote")]
#[test_case(": greet .\" hi \" ; greet greet", "hi hi "; "compiled dot quote")]
#[test_case("65 emit 66 emit", "AB"; "emit")]
#[test_case("3 spaces", "   "; "spaces")]
#[test_case("space", " "; "space")]
#[test_case("s\" abc\" type", "abc"; "type")]
#[test_case("1 2 .s", "<2> 1 2\n"; "print stack")]
#[test_case("2.5 f.", "2.5 "; "print float")]
#[test_case("variable v 5 v ! v ?", "5 "; "question mark")]
#[test_case(": t 3 0 do i . loop ; t", "0 1 2 "; "print in a loop")]
#[test_case("see bl", "32 CONSTANT bl\n"; "see a constant")]
fn output_cases(code: &str, expected: &str) {
    assert_eq!(output_of(code), expected);
}


#[test]
fn words_lists_the_dictionary() {
    let listing = output_of("words");

    assert!(listing.contains("dup"));
    assert!(listing.contains("spaces"));
}


#[test]
fn read_line_takes_host_input() {
    let io = Arc::new(BufferIo::with_input(&["first", "second"]));
    let mut interp = ForthInterpreter::with_io(io.clone());
    register_standard_words(&mut interp);
    load_prelude(&mut interp).unwrap();

    interp
        .process_source("<test>", "read-line read-line read-line")
        .unwrap();

    let expected = vec![
        Value::from("first"),
        Value::Int(-1),
        Value::from("second"),
        Value::Int(-1),
        Value::from(""),
        Value::Int(0),
    ];
    assert_eq!(interp.stack(), &expected);
}


#[test]
fn host_functions_become_words() {
    let (mut interp, _) = new_interpreter();

    register_plugin_word(&mut interp, "sum-squares", 2, |arguments: &[Value]| {
        match (&arguments[0], &arguments[1]) {
            (Value::Int(a), Value::Int(b)) => Ok(vec![Value::Int(a * a + b * b)]),
            _ => Err(ScriptError::new(None, "Expected integers.".to_string(), None)),
        }
    });

    register_plugin_word(&mut interp, "split", 1, |arguments: &[Value]| {
        match &arguments[0] {
            Value::Int(n) => Ok(vec![Value::Int(n / 10), Value::Int(n % 10)]),
            _ => Err(ScriptError::new(None, "Expected an integer.".to_string(), None)),
        }
    });

    interp
        .process_source("<test>", "3 4 sum-squares 42 split : t 1 2 sum-squares ; t")
        .unwrap();
    assert_eq!(ints(&interp), vec![25, 4, 2, 5]);

    interp.reset();

    let error = interp.process_source("<test>", "1 sum-squares").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::StackUnderflow);

    interp.reset();

    let error = interp
        .process_source("<test>", "s\" x\" 1 sum-squares")
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unknown);
}


#[test]
fn reset_clears_everything() {
    let (mut interp, _) = new_interpreter();

    interp.process_source("<test>", "1 2 3 : half 1").unwrap();
    assert!(interp.is_compiling());

    interp.reset();

    assert!(interp.stack().is_empty());
    assert!(!interp.is_compiling());
    assert!(interp.definition().is_none());
}
