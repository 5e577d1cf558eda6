use crate::{
    add_native_immediate_word, add_native_word,
    lang::{code::Action, compilation::DefinitionKind},
    runtime::{
        data_structures::{
            value::Value,
            word::{Word, WordBody, WordRuntime},
        },
        error::{self, kind_error, script_error_str, ErrorKind},
        interpreter::Interpreter,
    },
};
use std::sync::Arc;

/// Start the creation of a new word.  Pull the name of the word from the next token in the token
/// stream.
///
/// Signature: `name: -- `
fn word_start_word(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (location, name) = interpreter.next_word()?;

    interpreter.begin_definition(DefinitionKind::Named(name), location)
}

/// Start an anonymous definition, its execution token is pushed by `;`.
///
/// Signature: ` -- ` then `;` ` -- xt`
fn word_start_anonymous(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let location = interpreter.current_location().clone().unwrap_or_default();

    interpreter.begin_definition(DefinitionKind::Anonymous, location)
}

/// End the definition of the word under construction and install it.
fn word_end_word(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let word = interpreter.end_definition()?;

    if word.name().is_none() {
        interpreter.push(Value::Word(word));
    }

    Ok(())
}

/// Mark the most recent definition as immediate.
fn word_immediate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let latest = match interpreter.dictionary().latest() {
        Some(latest) => latest.clone(),
        None => return script_error_str(interpreter, "No word has been defined to make immediate."),
    };

    let updated = latest.as_ref().clone().with_runtime(WordRuntime::Immediate);
    interpreter.dictionary_mut().replace_latest(Arc::new(updated));

    Ok(())
}

fn word_left_bracket(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.set_compiling(false);
    Ok(())
}

fn word_right_bracket(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    if interpreter.definition().is_none() {
        return kind_error(
            interpreter,
            ErrorKind::CompileError,
            "] without a definition to return to.".to_string(),
        );
    }

    interpreter.set_compiling(true);
    Ok(())
}

/// Compile the value on top of the stack as a literal.
///
/// Signature: `value -- `
fn word_literal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.compile_action(Action::Push(value))
}

/// Compile the compilation behavior of the next word.  Immediate words get compiled as plain
/// calls, other words compile a call to themselves when the new word runs.
fn word_postpone(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (location, name) = interpreter.next_word()?;
    let word = interpreter.resolve_word(&name)?;

    if word.is_immediate() {
        interpreter.compile_action(Action::Call(word, location))
    } else {
        interpreter.compile_action(Action::CompileCall(word))
    }
}

/// Signature: `name: -- xt`
fn word_tick(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;
    let word = interpreter.resolve_word(&name)?;

    interpreter.push(Value::Word(word));
    Ok(())
}

/// Signature: `name: -- ` at run time ` -- xt`
fn word_bracket_tick(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;
    let word = interpreter.resolve_word(&name)?;

    interpreter.compile_action(Action::Push(Value::Word(word)))
}

fn first_char_code(interpreter: &mut dyn Interpreter) -> error::Result<i64> {
    let (_, text) = interpreter.next_word()?;

    match text.chars().next() {
        Some(character) => Ok(character as i64),
        None => script_error_str(interpreter, "Expected a character."),
    }
}

/// Signature: `text: -- char`
fn word_char(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = first_char_code(interpreter)?;

    interpreter.push(Value::Int(code));
    Ok(())
}

/// Signature: `text: -- ` at run time ` -- char`
fn word_bracket_char(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = first_char_code(interpreter)?;

    interpreter.compile_action(Action::Push(Value::Int(code)))
}

/// Declare locals up to the closing `|`.  The first name gets the top of the stack.
///
/// Signature: `names: | -- `
fn word_locals_bar(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut names = Vec::new();

    loop {
        let (_, name) = interpreter.next_word()?;

        if name == "|" {
            break;
        }

        names.push(name);
    }

    interpreter.definition_mut()?.declare_locals(names);
    Ok(())
}

/// Declare one local, an empty name ends the group and binds it.
///
/// Signature: `name -- `
fn word_paren_local(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = interpreter.pop_as_string()?;

    interpreter.definition_mut()?.declare_local(&name);
    Ok(())
}

/// Define a word that, when executed, removes itself and everything defined after it.
///
/// Signature: `name: -- `
fn word_marker(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let snapshot = interpreter.dictionary().snapshot();
    let here = interpreter.here();
    let (location, name) = interpreter.next_word()?;

    let word = Word::new(
        Some(name),
        location,
        WordBody::Marker(Arc::new(snapshot), here),
    );

    let _ = interpreter.define_word(word);
    Ok(())
}

/// Remove the newest definition of a name, revealing any older one.
///
/// Signature: `name: -- `
fn word_forget(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;

    if interpreter.dictionary_mut().forget(&name).is_none() {
        return kind_error(
            interpreter,
            ErrorKind::UndefinedWord,
            format!("Word {} not found.", name),
        );
    }

    Ok(())
}

fn word_paren_comment(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.parse_until(')')?;
    Ok(())
}

fn word_line_comment(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.skip_line();
    Ok(())
}

/// Print the text up to the closing parenthesis, even while compiling.
fn word_dot_paren(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (text, _) = interpreter.parse_until(')')?;

    interpreter.io().write_text(&text)
}

/// Register the word creation words with the interpreter.
pub fn register_word_creation_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        ":",
        word_start_word,
        "Start a new word definition.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        ":noname",
        word_start_anonymous,
        "Start a definition without a name, ; pushes its execution token.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        ";",
        word_end_word,
        "End the definition of the newly created word.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "immediate",
        word_immediate,
        "Mark the most recent word as immediate.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "[",
        word_left_bracket,
        "Switch to interpret state.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "]",
        word_right_bracket,
        "Switch back to compile state.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "literal",
        word_literal,
        "Compile the top of the stack as a literal.",
        "value -- "
    );

    add_native_immediate_word!(
        interpreter,
        "postpone",
        word_postpone,
        "Compile the compilation behavior of the next word.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "'",
        word_tick,
        "Get the execution token of the next word.",
        "name: -- xt"
    );

    add_native_immediate_word!(
        interpreter,
        "[']",
        word_bracket_tick,
        "Compile the execution token of the next word as a literal.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "char",
        word_char,
        "Get the code of the first character of the next word.",
        "text: -- char"
    );

    add_native_immediate_word!(
        interpreter,
        "[char]",
        word_bracket_char,
        "Compile the code of the first character of the next word.",
        "text: -- "
    );

    add_native_immediate_word!(
        interpreter,
        "locals|",
        word_locals_bar,
        "Declare locals up to |, bound from the stack.",
        "names: | -- "
    );

    add_native_word!(
        interpreter,
        "(local)",
        word_paren_local,
        "Declare a local by name, an empty name ends the group.",
        "name -- "
    );

    add_native_word!(
        interpreter,
        "marker",
        word_marker,
        "Define a word that forgets itself and everything after it.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "forget",
        word_forget,
        "Forget the newest definition of a word.",
        "name: -- "
    );

    add_native_immediate_word!(
        interpreter,
        "(",
        word_paren_comment,
        "A comment up to the closing parenthesis.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "\\",
        word_line_comment,
        "A comment up to the end of the line.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        ".(",
        word_dot_paren,
        "Print the text up to the closing parenthesis.",
        " -- "
    );
}
