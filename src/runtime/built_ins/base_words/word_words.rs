use crate::{
    add_native_word,
    lang::code::decompile,
    location_here,
    runtime::{
        data_structures::word::{WordBody, WordRef},
        error,
        interpreter::Interpreter,
    },
};

/// Render a word the way `SEE` shows it.  Compiled words come out as source text that defines an
/// equivalent word when evaluated.
pub fn describe_word(word: &WordRef) -> String {
    let name = word.display_name();

    let mut text = match word.body() {
        WordBody::Compiled(actions) => {
            let body = decompile(actions);

            if body.is_empty() {
                format!(": {} ;", name)
            } else {
                format!(": {} {} ;", name, body)
            }
        }

        WordBody::Native(_) => format!("{} is a native word.", name),
        WordBody::Created => format!("CREATE {}", name),
        WordBody::Does(actions) => format!("CREATE {} DOES> {} ;", name, decompile(actions)),
        WordBody::Constant(value) => format!("{:?} CONSTANT {}", value, name),
        WordBody::Value => format!("VALUE {}", name),
        WordBody::Deferred => format!("DEFER {}", name),
        WordBody::Marker(..) => format!("MARKER {}", name),
    };

    if word.is_immediate() {
        text.push_str(" IMMEDIATE");
    }

    text
}

/// Execute the word whose execution token is on the stack.
///
/// Signature: `xt -- `
fn word_execute(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let word = interpreter.pop_as_word()?;
    let location = interpreter
        .current_location()
        .clone()
        .unwrap_or_else(|| location_here!());

    interpreter.execute_word(&location, &word)
}

/// Evaluate a string as source text.
///
/// Signature: `string -- `
fn word_evaluate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let source = interpreter.pop_as_string()?;

    interpreter.process_source("<evaluate>", &source)
}

/// Print the definition of the next word.
///
/// Signature: `name: -- `
fn word_see(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_word()?;
    let word = interpreter.resolve_word(&name)?;
    let io = interpreter.io();

    io.write_text(&describe_word(&word))?;
    io.new_line()
}

/// Print the words visible through the search order.
///
/// Signature: ` -- `
fn word_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let listing = interpreter.dictionary().to_string();

    interpreter.io().write_text(&listing)
}

/// Register the words that work with words.
pub fn register_word_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "execute",
        word_execute,
        "Execute a word from its execution token.",
        "xt -- "
    );

    add_native_word!(
        interpreter,
        "evaluate",
        word_evaluate,
        "Evaluate a string as source text.",
        "string -- "
    );

    add_native_word!(
        interpreter,
        "see",
        word_see,
        "Show the definition of a word.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "words",
        word_words,
        "List the words visible through the search order.",
        " -- "
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::{code::Action, source_buffer::SourceLocation},
        runtime::data_structures::{
            value::Value,
            word::{Word, WordRuntime},
        },
    };
    use std::sync::Arc;

    #[test]
    fn compiled_words_show_as_definitions() {
        let body = vec![Action::Push(Value::Int(2)), Action::Push(Value::Int(3))];
        let word = Word::new(
            Some("PAIR".to_string()),
            SourceLocation::new(),
            WordBody::Compiled(Arc::new(body)),
        )
        .with_runtime(WordRuntime::Immediate);

        assert_eq!(describe_word(&Arc::new(word)), ": PAIR 2 3 ; IMMEDIATE");
    }

    #[test]
    fn constants_show_their_value() {
        let word = Word::new(
            Some("TEN".to_string()),
            SourceLocation::new(),
            WordBody::Constant(Value::Int(10)),
        );

        assert_eq!(describe_word(&Arc::new(word)), "10 CONSTANT TEN");
    }
}
