mod repl;

use getopts::Options;
use stackweave::{
    load_prelude, register_base_words, register_block_words, register_io_words,
    register_thread_words,
    runtime::{
        error::{self, ScriptError},
        interpreter::{CodeManagement, Interpreter},
    },
    ForthInterpreter, MemoryBlocks,
};
use std::{env::args, sync::Arc};

fn usage(options: &Options) -> String {
    options.usage("Usage: stackweave [options] [script ...]")
}

fn main() -> error::Result<()> {
    let args: Vec<String> = args().collect();

    let mut options = Options::new();
    options.optmulti("e", "", "evaluate the given source text", "CODE");
    options.optmulti("s", "", "evaluate a script file", "FILE");
    options.optflag("n", "", "don't load the prelude");
    options.optflag("h", "help", "print this help");

    let matches = match options.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(error) => {
            return ScriptError::new_as_result(None, format!("{}\n{}", error, usage(&options)), None);
        }
    };

    if matches.opt_present("h") {
        print!("{}", usage(&options));
        return Ok(());
    }

    // Create the core instance of the interpreter and register the words implemented in Rust.
    let mut interpreter = ForthInterpreter::new();

    register_base_words(&mut interpreter);
    register_io_words(&mut interpreter);
    register_thread_words(&mut interpreter);
    register_block_words(&mut interpreter);

    interpreter.set_block_manager(Arc::new(MemoryBlocks::new()));

    if !matches.opt_present("n") {
        load_prelude(&mut interpreter)?;
    }

    let mut ran_source = false;

    for code in matches.opt_strs("e") {
        interpreter.process_source("<command line>", &code)?;
        ran_source = true;
    }

    for script in matches.opt_strs("s").iter().chain(matches.free.iter()) {
        interpreter.process_source_file(script)?;
        ran_source = true;
    }

    if !ran_source {
        repl::run(&mut interpreter);
    }

    Ok(())
}
