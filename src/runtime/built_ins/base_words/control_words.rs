use crate::{
    add_native_immediate_word, add_native_word,
    lang::{code::Action, tokenizing::Token},
    runtime::{
        error::{self, kind_error, ErrorKind},
        interpreter::Interpreter,
    },
};

/// Fail if the word is used outside of compile state.
fn require_compiling(interpreter: &mut dyn Interpreter, word: &str) -> error::Result<()> {
    if !interpreter.is_compiling() {
        return kind_error(
            interpreter,
            ErrorKind::CompileError,
            format!("{} can only be used while compiling.", word),
        );
    }

    Ok(())
}

/// Signature: `flag -- `
fn word_if(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.open_structure()?.open_if();
    Ok(())
}

fn word_else(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.open_else()
}

fn word_then(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_then()?;
    interpreter.structure_closed()
}

fn word_ahead(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.open_structure()?.open_ahead();
    Ok(())
}

fn word_begin(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.open_structure()?.open_begin();
    Ok(())
}

fn word_while(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.open_while()
}

fn word_repeat(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_repeat()?;
    interpreter.structure_closed()
}

fn word_until(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_until()?;
    interpreter.structure_closed()
}

fn word_again(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_again()?;
    interpreter.structure_closed()
}

/// Signature: `limit start -- `
fn word_do(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.open_structure()?.open_do(false);
    Ok(())
}

/// Signature: `limit start -- `
fn word_question_do(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.open_structure()?.open_do(true);
    Ok(())
}

fn word_loop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_loop(false)?;
    interpreter.structure_closed()
}

/// Signature: `step -- `
fn word_plus_loop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_loop(true)?;
    interpreter.structure_closed()
}

fn word_leave(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.compile_leave()
}

/// Signature: `selector -- `
fn word_case(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.open_structure()?.open_case();
    Ok(())
}

fn word_of(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.open_of()
}

fn word_endof(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_endof()
}

fn word_endcase(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.definition_mut()?.close_endcase()?;
    interpreter.structure_closed()
}

fn word_exit(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_compiling(interpreter, "EXIT")?;
    interpreter.compile_action(Action::Exit)
}

fn word_recurse(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    require_compiling(interpreter, "RECURSE")?;
    interpreter.compile_action(Action::Recurse)
}

/// Skip source tokens up to the matching `[THEN]`, or to the matching `[ELSE]` when asked to.
/// Nested bracket conditionals are skipped whole.  A `;` that closes the definition being compiled
/// still runs so that the evaluator doesn't end up stuck in compile state.
fn skip_bracket_section(interpreter: &mut dyn Interpreter, stop_at_else: bool) -> error::Result<()> {
    let mut depth = 0usize;

    while let Some(token) = interpreter.next_token()? {
        let (location, text) = match token {
            Token::Word(location, text) => (location, text.to_uppercase()),
            Token::Quoted(..) => continue,
        };

        match text.as_str() {
            "[IF]" => depth += 1,

            "[ELSE]" if depth == 0 && stop_at_else => return Ok(()),

            "[THEN]" => {
                if depth == 0 {
                    return Ok(());
                }

                depth -= 1;
            }

            ";" => {
                let closes_definition = interpreter.is_compiling()
                    && interpreter
                        .definition()
                        .is_some_and(|definition| !definition.is_transient());

                if closes_definition {
                    interpreter.execute_word_named(&location, ";")?;
                }
            }

            _ => {}
        }
    }

    Ok(())
}

/// Signature: `flag -- `
fn word_bracket_if(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    if !interpreter.pop_as_bool()? {
        skip_bracket_section(interpreter, true)?;
    }

    Ok(())
}

fn word_bracket_else(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    skip_bracket_section(interpreter, false)
}

/// Register the structured control words.  These are all immediate, they build control frames in
/// the definition under construction.  Used outside of a definition the structure runs as soon as
/// it's closed.
pub fn register_control_words(interpreter: &mut dyn Interpreter) {
    add_native_immediate_word!(
        interpreter,
        "if",
        word_if,
        "Run the code up to ELSE or THEN if the flag is true.",
        "flag -- "
    );

    add_native_immediate_word!(
        interpreter,
        "else",
        word_else,
        "Start the code run when the IF flag is false.",
        " -- "
    );

    add_native_immediate_word!(interpreter, "then", word_then, "Close an IF or AHEAD.", " -- ");

    add_native_immediate_word!(
        interpreter,
        "ahead",
        word_ahead,
        "Skip the code up to THEN.",
        " -- "
    );

    add_native_immediate_word!(interpreter, "begin", word_begin, "Start a loop.", " -- ");

    add_native_immediate_word!(
        interpreter,
        "while",
        word_while,
        "Continue the BEGIN loop while the flag is true.",
        "flag -- "
    );

    add_native_immediate_word!(
        interpreter,
        "repeat",
        word_repeat,
        "Close a BEGIN WHILE loop.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "until",
        word_until,
        "Close a BEGIN loop, ending it when the flag is true.",
        "flag -- "
    );

    add_native_immediate_word!(
        interpreter,
        "again",
        word_again,
        "Close a BEGIN loop that runs until LEAVE, EXIT or an error.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "do",
        word_do,
        "Start a counted loop.",
        "limit start -- "
    );

    add_native_immediate_word!(
        interpreter,
        "?do",
        word_question_do,
        "Start a counted loop that's skipped when start equals limit.",
        "limit start -- "
    );

    add_native_immediate_word!(
        interpreter,
        "loop",
        word_loop,
        "Close a counted loop, stepping by one toward the limit.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "+loop",
        word_plus_loop,
        "Close a counted loop, stepping by the given amount.",
        "step -- "
    );

    add_native_immediate_word!(
        interpreter,
        "leave",
        word_leave,
        "Leave the innermost counted loop.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "unloop",
        |_interpreter: &mut dyn Interpreter| Ok(()),
        "Accepted before EXIT inside a loop, loop indices are dropped on exit anyway.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "case",
        word_case,
        "Start a CASE statement.",
        "selector -- "
    );

    add_native_immediate_word!(
        interpreter,
        "of",
        word_of,
        "Start a branch taken when its test value equals the selector.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "endof",
        word_endof,
        "Close a CASE branch.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "endcase",
        word_endcase,
        "Close a CASE statement.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "exit",
        word_exit,
        "Return from the current word.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "recurse",
        word_recurse,
        "Call the word being defined.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "[if]",
        word_bracket_if,
        "Skip source text up to [ELSE] or [THEN] if the flag is false.",
        "flag -- "
    );

    add_native_immediate_word!(
        interpreter,
        "[else]",
        word_bracket_else,
        "Skip source text up to the matching [THEN].",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "[then]",
        |_interpreter: &mut dyn Interpreter| Ok(()),
        "End a bracket conditional.",
        " -- "
    );
}
