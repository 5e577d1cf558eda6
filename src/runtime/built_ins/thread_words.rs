use crate::{
    add_native_word,
    runtime::{
        data_structures::{
            task::{Task, TaskHandle},
            value::Value,
            word::WordRef,
        },
        error,
        interpreter::{
            forth_interpreter::ForthInterpreter, Interpreter, InterpreterStack, WordManagement,
        },
    },
};
use std::thread;

/// Run a word on a child interpreter on its own worker thread.  The child starts from a snapshot
/// of this interpreter's dictionary and a copy of its data space, nothing it does is visible to
/// the parent.  When asked to, the top of the child's stack is kept as the task's result.
fn start_child(
    interpreter: &mut dyn Interpreter,
    word: WordRef,
    captures_result: bool,
) -> error::Result<TaskHandle> {
    let seed = interpreter.child_seed();

    Task::start(move || {
        let mut child = ForthInterpreter::from_seed(seed);
        let location = word.location().clone();

        child.execute_word(&location, &word)?;

        if captures_result {
            Ok(child.stack().last().cloned())
        } else {
            Ok(None)
        }
    })
}

/// Wait for a task, pushing its result if it has one.  An error raised by the child is raised
/// again here.
fn join_task(interpreter: &mut dyn Interpreter, task: &TaskHandle) -> error::Result<()> {
    if let Some(value) = task.join()? {
        interpreter.push(value);
    }

    Ok(())
}

/// Start a word running on its own thread.
///
/// Signature: `xt -- task`
fn word_spawn(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let word = interpreter.pop_as_word()?;
    let task = start_child(interpreter, word, false)?;

    interpreter.push(Value::Task(task));
    Ok(())
}

/// Start a word running on its own thread, keeping the value it leaves on its stack.
///
/// Signature: `xt -- task`
fn word_future(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let word = interpreter.pop_as_word()?;
    let task = start_child(interpreter, word, true)?;

    interpreter.push(Value::Task(task));
    Ok(())
}

/// Block until the task finishes.
///
/// Signature: `task -- [result]`
fn word_join(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let task = interpreter.pop_as_task()?;

    join_task(interpreter, &task)
}

/// Check if a task has finished without waiting for it.
///
/// Signature: `task -- flag`
fn word_task_finished(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let task = interpreter.pop_as_task()?;

    interpreter.push(Value::from(task.is_finished()));
    Ok(())
}

/// Run the next word in isolation and wait for it.
///
/// Signature: `name: -- `
fn word_run_next(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;
    let word = interpreter.resolve_word(&name)?;
    let task = start_child(interpreter, word, false)?;

    join_task(interpreter, &task)
}

fn word_yield(_interpreter: &mut dyn Interpreter) -> error::Result<()> {
    thread::yield_now();
    Ok(())
}

/// Register the words that run code on child interpreters.
pub fn register_thread_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "spawn",
        word_spawn,
        "Run a word on a child interpreter in its own thread.",
        "xt -- task"
    );

    add_native_word!(
        interpreter,
        "future",
        word_future,
        "Run a word on a child interpreter, keeping the value it leaves.",
        "xt -- task"
    );

    add_native_word!(
        interpreter,
        "task",
        word_future,
        "The same as FUTURE.",
        "xt -- task"
    );

    add_native_word!(
        interpreter,
        "join",
        word_join,
        "Wait for a task, pushing its result if it has one.",
        "task -- [result]"
    );

    add_native_word!(
        interpreter,
        "await",
        word_join,
        "The same as JOIN.",
        "task -- [result]"
    );

    add_native_word!(
        interpreter,
        "task?",
        word_task_finished,
        "Has the task finished?",
        "task -- flag"
    );

    add_native_word!(
        interpreter,
        "run-next",
        word_run_next,
        "Run the next word on a child interpreter and wait for it.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "yield",
        word_yield,
        "Let other threads run.",
        " -- "
    );
}
