use crate::{ lang::{ code::ActionList,
                     source_buffer::SourceLocation },
             runtime::{ data_structures::{ dictionary::Snapshot,
                                           value::Value },
                        error,
                        interpreter::Interpreter } };
use std::{ fmt::{ self,
                  Debug,
                  Display,
                  Formatter },
           sync::Arc };



/// When a word runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WordRuntime
{
    /// The word runs as soon as it's seen, even while compiling.
    Immediate,

    /// The word is executed in interpret state and compiled in compile state.
    Normal
}


/// Definition of a native word handler.  Handlers are shared with child interpreters running on
/// other threads so they need to be thread safe.
pub type NativeHandler = dyn Fn(&mut dyn Interpreter) -> error::Result<()> + Send + Sync;


/// What a word does when executed.
#[derive(Clone)]
pub enum WordBody
{
    /// A word implemented in Rust.
    Native(Arc<NativeHandler>),

    /// A colon definition.
    Compiled(Arc<ActionList>),

    /// A `CREATE`d word, pushes its data address.
    Created,

    /// A `CREATE`d word whose behavior was given by `DOES>`.  The data address is pushed before
    /// the actions run.
    Does(Arc<ActionList>),

    /// A `CONSTANT`, pushes the held value.
    Constant(Value),

    /// A `VALUE`, pushes the contents of its data address.
    Value,

    /// A `DEFER`red word, executes the execution token stored at its data address.
    Deferred,

    /// A `MARKER`, rolls the dictionary and data space back when executed.
    Marker(Arc<Snapshot>, usize)
}


/// A word known to the interpreter.  Once built a word is never modified, redefinition installs a
/// new word that shadows the old one.
#[derive(Clone)]
pub struct Word
{
    name: Option<String>,
    namespace: Option<String>,
    location: SourceLocation,
    runtime: WordRuntime,
    description: String,
    signature: String,
    data_address: Option<usize>,
    body: WordBody
}


/// Words are handed around by reference, on the stack as execution tokens and between threads.
pub type WordRef = Arc<Word>;


impl Display for Word
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self.display_name())
    }
}


impl Debug for Word
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{} ({})", self.display_name(), self.location)
    }
}


impl Word
{
    /// Create a new word.  The namespace is filled in by the dictionary's owner when the word is
    /// installed.
    pub fn new(name: Option<String>, location: SourceLocation, body: WordBody) -> Word
    {
        Word
            {
                name,
                namespace: None,
                location,
                runtime: WordRuntime::Normal,
                description: String::new(),
                signature: String::new(),
                data_address: None,
                body
            }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Word
    {
        self.namespace = namespace;
        self
    }

    pub fn with_runtime(mut self, runtime: WordRuntime) -> Word
    {
        self.runtime = runtime;
        self
    }

    pub fn with_help(mut self, description: String, signature: String) -> Word
    {
        self.description = description;
        self.signature = signature;
        self
    }

    pub fn with_data_address(mut self, address: usize) -> Word
    {
        self.data_address = Some(address);
        self
    }

    pub fn with_body(mut self, body: WordBody) -> Word
    {
        self.body = body;
        self
    }

    /// The word's name, anonymous words don't have one.
    pub fn name(&self) -> &Option<String>
    {
        &self.name
    }

    /// The name for display purposes.
    pub fn display_name(&self) -> String
    {
        match &self.name
        {
            Some(name) => name.clone(),
            None => "<anonymous>".to_string()
        }
    }

    pub fn namespace(&self) -> &Option<String>
    {
        &self.namespace
    }

    /// Where the word was defined, either in script or Rust source.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    pub fn runtime(&self) -> WordRuntime
    {
        self.runtime
    }

    pub fn is_immediate(&self) -> bool
    {
        self.runtime == WordRuntime::Immediate
    }

    pub fn description(&self) -> &String
    {
        &self.description
    }

    pub fn signature(&self) -> &String
    {
        &self.signature
    }

    /// The data space address owned by the word, if any.
    pub fn data_address(&self) -> Option<usize>
    {
        self.data_address
    }

    pub fn body(&self) -> &WordBody
    {
        &self.body
    }

    pub fn is_native(&self) -> bool
    {
        matches!(self.body, WordBody::Native(_))
    }
}
