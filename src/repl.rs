use rustyline::{error::ReadlineError, Editor};
use stackweave::{
    runtime::interpreter::{CodeManagement, Interpreter, InterpreterStack},
    ForthInterpreter,
};
use std::env::var;

/// Environment variable naming the file the line history is kept in.
const HISTORY_VARIABLE: &str = "STACKWEAVE_HISTORY";

/// Read lines from the console and evaluate them until end of input.  Errors are reported and the
/// interpreter carries on with the next line.
pub fn run(interpreter: &mut ForthInterpreter) {
    let history = var(HISTORY_VARIABLE).ok();
    let mut editor = Editor::<()>::new();

    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    loop {
        let prompt = if interpreter.is_compiling() { "] " } else { "> " };

        match editor.readline(prompt) {
            Ok(line) => {
                editor.add_history_entry(line.as_str());

                match interpreter.process_source("<repl>", &line) {
                    Ok(()) if interpreter.is_compiling() => println!(" compiled"),
                    Ok(()) => println!(" ok"),
                    Err(error) => {
                        eprintln!("{}", error);
                        eprintln!("<{}> values left on the stack.", interpreter.stack().len());
                    }
                }
            }

            Err(ReadlineError::Interrupted) => {
                // Ctrl-C drops whatever was half typed or half compiled.
                interpreter.reset();
                println!("reset");
            }

            Err(ReadlineError::Eof) => break,

            Err(error) => {
                eprintln!("Error: {:?}", error);
                break;
            }
        }
    }

    if let Some(path) = &history {
        if let Err(error) = editor.save_history(path) {
            eprintln!("Could not save the history to {}: {}", path, error);
        }
    }
}
