use crate::{
    add_native_word,
    runtime::{
        data_structures::{
            value::Value,
            word::{NativeHandler, Word, WordBody},
        },
        error::{self, script_error_str},
        interpreter::Interpreter,
    },
};
use std::sync::Arc;

/// The name the root namespace goes by.
pub const ROOT_NAMESPACE: &str = "FORTH";

fn namespace_name(namespace: &Option<String>) -> &str {
    match namespace {
        Some(name) => name,
        None => ROOT_NAMESPACE,
    }
}

/// Define a new namespace.  Executing its word makes it the first namespace searched.
///
/// Signature: `name: -- `
fn word_vocabulary(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (location, name) = interpreter.next_word()?;
    let namespace = name.to_uppercase();

    let handler: Arc<NativeHandler> = Arc::new(move |interpreter: &mut dyn Interpreter| {
        interpreter
            .dictionary_mut()
            .replace_first_in_order(Some(namespace.clone()));
        Ok(())
    });

    let word = Word::new(Some(name), location, WordBody::Native(handler))
        .with_help("Search this vocabulary first.".to_string(), " -- ".to_string());

    let _ = interpreter.define_word(word);
    Ok(())
}

/// New definitions go into the first namespace of the search order.
fn word_definitions(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let first = interpreter
        .dictionary()
        .search_order()
        .first()
        .cloned()
        .unwrap_or(None);

    interpreter.dictionary_mut().set_current(first);
    Ok(())
}

fn word_also(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.dictionary_mut().duplicate_first_in_order();
    Ok(())
}

fn word_only(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.dictionary_mut().reset_order();
    Ok(())
}

fn word_previous(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    if !interpreter.dictionary_mut().drop_first_in_order() {
        return script_error_str(interpreter, "The search order is already empty.");
    }

    Ok(())
}

fn word_forth(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.dictionary_mut().replace_first_in_order(None);
    Ok(())
}

/// Print the search order, first namespace first, and the current namespace.
fn word_order(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let dictionary = interpreter.dictionary();
    let order: Vec<&str> = dictionary
        .search_order()
        .iter()
        .map(namespace_name)
        .collect();

    let text = format!(
        "{}  current: {}",
        order.join(" "),
        namespace_name(dictionary.current())
    );

    let io = interpreter.io();

    io.write_text(&text)?;
    io.new_line()
}

/// Push the name of the namespace new definitions go into.
///
/// Signature: ` -- name`
fn word_get_current(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = namespace_name(interpreter.dictionary().current()).to_string();

    interpreter.push(Value::from(name));
    Ok(())
}

/// Register the search order words.
pub fn register_search_order_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "vocabulary",
        word_vocabulary,
        "Define a namespace, executing its word searches it first.",
        "name: -- "
    );

    add_native_word!(
        interpreter,
        "definitions",
        word_definitions,
        "Put new definitions into the first namespace searched.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "also",
        word_also,
        "Duplicate the first namespace of the search order.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "only",
        word_only,
        "Reset the search order to the root namespace.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "previous",
        word_previous,
        "Drop the first namespace of the search order.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "forth",
        word_forth,
        "Make the root namespace the first searched.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "order",
        word_order,
        "Print the search order and the current namespace.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "get-current",
        word_get_current,
        "The name of the namespace new definitions go into.",
        " -- name"
    );
}
