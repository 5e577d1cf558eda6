use crate::{
    lang::{
        code::{Action, ActionList},
        compilation::{Definition, DefinitionKind},
        source_buffer::SourceLocation,
        tokenizing::Token,
    },
    runtime::{
        built_ins::{block_words::BlockManager, io_words::TextIo},
        data_structures::{
            contextual_data::ContextualData,
            dictionary::{Dictionary, Snapshot},
            task::TaskHandle,
            value::Value,
            word::{NativeHandler, Word, WordRef, WordRuntime},
        },
        error,
    },
};
use arcstr::ArcStr;
use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

pub mod forth_interpreter;

/// A call stack item is a record of the executing word's name and the location within the
/// original source code from which it was called.  These items are read-only and the fields are
/// accessed by member functions.
#[derive(Clone)]
pub struct CallItem {
    location: SourceLocation,
    word: String,
}

impl CallItem {
    /// Create a new call stack item.
    pub fn new(word: String, location: SourceLocation) -> CallItem {
        CallItem { location, word }
    }

    /// Where in the source code was the execution of this word found?
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    // The name of the word being executed.
    pub fn word(&self) -> &String {
        &self.word
    }
}

/// Make sure that this word can be nicely displayed to the user in event of an error.
impl Display for CallItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.word)
    }
}

/// Type to represent a call stack.  This is a stack of call items currently being executed by the
/// interpreter.  This is used to help track errors and provide a script's stack trace to the user.
pub type CallStack = Vec<CallItem>;

/// The data stack of values managed by the interpreter.
pub type ValueStack = Vec<Value>;

/// How the execution of a list of actions ended.  `EXIT` and `LEAVE` are ordinary results
/// threaded back up through the nested action lists, only real errors travel as `Err`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    /// Ran to the end of the list, carry on with the next action.
    Continue,

    /// Return from the current word.
    Exit,

    /// Leave the innermost `DO` loop.
    Leave,
}

/// The heights of the interpreter's stacks at some point in time.  `CATCH` records these before
/// running its word so that it can unwind to them on error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StackDepths {
    pub data: usize,
    pub return_stack: usize,
    pub loops: usize,
    pub locals: usize,
    pub calls: usize,
    pub executing: usize,
    pub compiling: bool,
    pub has_definition: bool,
}

/// Everything a child interpreter starts from.  The dictionary is a frozen snapshot and the data
/// space is a private copy, so nothing the child does is visible to its parent.
pub struct ChildSeed {
    pub snapshot: Snapshot,
    pub memory: Vec<Value>,
    pub io: Arc<dyn TextIo>,
    pub block_manager: Option<Arc<dyn BlockManager>>,
}

/// Trait for managing the interpreter's stacks.  Intended to be called by immediate/normal words,
/// both native and scripted.
pub trait InterpreterStack {
    /// Use to examine the full data stack when required.  One example is for the stack dump
    /// command `.S`.
    fn stack(&self) -> &ValueStack;

    /// Push a script value onto the stack.
    fn push(&mut self, value: Value);

    /// Pop a value from the stack.  If the stack is empty a stack underflow error is returned.
    fn pop(&mut self) -> error::Result<Value>;

    /// Pop the top value, which has to be an integer.
    fn pop_as_int(&mut self) -> error::Result<i64>;

    /// Pop the top value as a non-negative integer.
    fn pop_as_usize(&mut self) -> error::Result<usize>;

    /// Pop the top value, which has to be a float.
    fn pop_as_float(&mut self) -> error::Result<f64>;

    /// Pop a flag.  Flags are integers, any non-zero value is true.
    fn pop_as_bool(&mut self) -> error::Result<bool>;

    /// Pop the top value, which has to be a string.
    fn pop_as_string(&mut self) -> error::Result<ArcStr>;

    /// Pop an execution token.
    fn pop_as_word(&mut self) -> error::Result<WordRef>;

    /// Pop a task handle.
    fn pop_as_task(&mut self) -> error::Result<TaskHandle>;

    /// Copy the value at the given depth, 0 being the top of the stack.
    fn peek(&self, index: usize) -> error::Result<Value>;

    /// Remove and return the value at the given depth, 0 being the top of the stack.
    fn pick(&mut self, index: usize) -> error::Result<Value>;

    /// Empty the data stack.
    fn clear_stack(&mut self);

    /// Move a value to the return stack.
    fn return_stack_push(&mut self, value: Value);

    /// Take the top value off of the return stack.
    fn return_stack_pop(&mut self) -> error::Result<Value>;

    /// Copy the top value of the return stack.
    fn return_stack_peek(&self) -> error::Result<Value>;

    /// The index of an enclosing `DO` loop, 0 being the innermost loop.
    fn loop_index(&self, depth: usize) -> error::Result<i64>;
}

/// Trait for managing the incoming source text and the definition being compiled.
///
/// Immediate words use these to read ahead in the source and to add to the definition.
pub trait CodeManagement {
    /// Get the next token from the current source.  `None` at the end of the source.
    fn next_token(&mut self) -> error::Result<Option<Token>>;

    /// Get the text of the next token, failing at the end of the source.
    fn next_word(&mut self) -> error::Result<(SourceLocation, String)>;

    /// Read raw source text up to the delimiter.  The flag reports if the delimiter was found.
    fn parse_until(&mut self, delimiter: char) -> error::Result<(String, bool)>;

    /// Skip the rest of the current source line.
    fn skip_line(&mut self);

    /// Take the payload of the quoting word currently being executed.
    fn take_payload(&mut self) -> error::Result<String>;

    /// Is the evaluator in compile state?
    fn is_compiling(&self) -> bool;

    /// Switch between compile and interpret state, as `[` and `]` do.
    fn set_compiling(&mut self, compiling: bool);

    /// The definition under construction, if any.
    fn definition(&self) -> Option<&Definition>;

    /// The definition under construction, failing if there isn't one.
    fn definition_mut(&mut self) -> error::Result<&mut Definition>;

    /// Start a new definition and enter compile state.
    fn begin_definition(&mut self, kind: DefinitionKind, location: SourceLocation) -> error::Result<()>;

    /// Finish the current definition, install it and return to interpret state.
    fn end_definition(&mut self) -> error::Result<WordRef>;

    /// Get the definition a control word adds its frame to.  In interpret state a transient
    /// definition is opened that runs once its control structures are closed.
    fn open_structure(&mut self) -> error::Result<&mut Definition>;

    /// Called after a control structure is closed.  Runs a transient definition whose last frame
    /// was just closed.
    fn structure_closed(&mut self) -> error::Result<()>;

    /// Append an action to the definition under construction.
    fn compile_action(&mut self, action: Action) -> error::Result<()>;

    /// Evaluate a script from a file.
    fn process_source_file(&mut self, path: &str) -> error::Result<()>;

    /// Evaluate source text.  The path is used to represent the source in locations, for example
    /// the repl uses "\<repl\>".
    fn process_source(&mut self, path: &str, source: &str) -> error::Result<()>;

    /// Execute a list of compiled actions.
    fn run_actions(&mut self, actions: &ActionList) -> error::Result<Flow>;
}

/// Simplify registering a native regular word with the interpreter.
///
/// Required parameters are, the interpreter instance to register with.  The name of the word to
/// register.  The word function handler to execute for the word.  A simple description of the word.
/// As well as the word's stack signature.
#[macro_export]
macro_rules! add_native_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr
    ) => {{
        use std::sync::Arc;
        use $crate::runtime::data_structures::word::WordRuntime;

        // Register the word while recording where in the source code the word was registered
        // from.
        $interpreter.add_word(
            file!().to_string(),
            line!() as usize,
            column!() as usize,
            $name.to_string(),
            Arc::new($function),
            $description.to_string(),
            $signature.to_string(),
            WordRuntime::Normal,
        );
    }};
}

/// Simplify registering a native immediate word with the interpreter.  That is, this word is
/// executed as soon as it's seen, even while compiling.
#[macro_export]
macro_rules! add_native_immediate_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr
    ) => {{
        use std::sync::Arc;
        use $crate::runtime::data_structures::word::WordRuntime;

        $interpreter.add_word(
            file!().to_string(),
            line!() as usize,
            column!() as usize,
            $name.to_string(),
            Arc::new($function),
            $description.to_string(),
            $signature.to_string(),
            WordRuntime::Immediate,
        );
    }};
}

/// Trait for managing and executing words known to the interpreter.
pub trait WordManagement {
    /// If currently set, this represents the current executing location in the original Forth
    /// source code.
    fn current_location(&self) -> &Option<SourceLocation>;

    /// Add a new native word to the interpreter's dictionary.
    #[allow(clippy::too_many_arguments)]
    fn add_word(
        &mut self,
        file: String,
        line: usize,
        column: usize,
        name: String,
        handler: Arc<NativeHandler>,
        description: String,
        signature: String,
        runtime: WordRuntime,
    );

    /// Install a word in the current namespace.  The installed reference is returned.
    fn define_word(&mut self, word: Word) -> WordRef;

    /// Find a word through the search order.
    fn find_word(&self, name: &str) -> Option<WordRef>;

    /// Find a word through the search order, failing with an undefined word error.
    fn resolve_word(&self, name: &str) -> error::Result<WordRef>;

    /// Execute a word.  Supply a source location to represent where the word was executed from.
    /// Use the macro `location_here!()` to get the current location in the Rust source code if
    /// the word is executed from native code.
    fn execute_word(&mut self, location: &SourceLocation, word: &WordRef) -> error::Result<()>;

    /// Find and execute a word by name.
    fn execute_word_named(&mut self, location: &SourceLocation, word: &str) -> error::Result<()>;

    /// The current script execution call stack.
    fn call_stack(&self) -> &CallStack;

    /// Push a new name and location onto the call stack.
    fn call_stack_push(&mut self, name: String, location: SourceLocation);

    /// The word dictionary.
    fn dictionary(&self) -> &Dictionary;

    /// The word dictionary, for words that change the search order or roll it back.
    fn dictionary_mut(&mut self) -> &mut Dictionary;
}

/// Trait for the interpreter's data space.  The data space is a vector of cells each holding any
/// value.  Addresses are cell indices and cell 0 holds `BASE`.
pub trait DataSpace {
    /// The next free address.
    fn here(&self) -> usize;

    /// Reserve cells, or give them back for a negative count.  Returns the first reserved
    /// address.
    fn allot(&mut self, cells: i64) -> error::Result<usize>;

    /// Append a value to the data space, returning its address.
    fn comma(&mut self, value: Value) -> usize;

    /// Read a cell.
    fn fetch(&self, address: i64) -> error::Result<Value>;

    /// Write a cell.
    fn store(&mut self, address: i64, value: Value) -> error::Result<()>;

    /// The numeric base used for parsing and printing numbers.
    fn base(&self) -> u32;

    /// Drop everything after the given address, as executing a marker does.
    fn truncate_data_space(&mut self, here: usize);
}

/// Interpreter thread management trait.
///
/// Children run on their own threads with their own interpreter built from a seed taken from the
/// parent.
pub trait ThreadManagement {
    /// Capture what a child interpreter needs to start.
    fn child_seed(&self) -> ChildSeed;
}

/// Core interpreter trait.
///
/// This trait brings together the traits that define the core functionality of the interpreter.
/// Managing scopes, the stacks, the source and compilation, words, the data space and child
/// interpreters.
pub trait Interpreter:
    ContextualData + InterpreterStack + CodeManagement + WordManagement + DataSpace + ThreadManagement
{
    /// The text I/O collaborator all output goes through.
    fn io(&self) -> Arc<dyn TextIo>;

    /// The block storage collaborator, if one was installed.
    fn block_manager(&self) -> Option<Arc<dyn BlockManager>>;

    /// Install a block storage collaborator.
    fn set_block_manager(&mut self, manager: Arc<dyn BlockManager>);

    /// Record the heights of the stacks.
    fn stack_depths(&self) -> StackDepths;

    /// Unwind the stacks to previously recorded heights.  A data stack that has become shallower
    /// is padded with zeros.
    fn restore_depths(&mut self, depths: &StackDepths);

    /// Clear the data stack and any half finished state, keeping the dictionary.
    fn reset(&mut self);
}
