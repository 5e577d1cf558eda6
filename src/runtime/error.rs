
use std::{ error::Error,
           process::Termination,
           fmt::{ self, Debug, Display, Formatter }, process::ExitCode };
use crate::{ runtime::interpreter::CallStack,
             lang::source_buffer::SourceLocation };

use super::interpreter::Interpreter;



pub type Result<T> = std::result::Result<T, ScriptError>;



/// The classes of error the engine distinguishes.  Each kind has a default numeric code which is
/// what `CATCH` pushes when it intercepts an error of that kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind
{
    /// A word needed more values than the data stack held.
    StackUnderflow,

    /// A value had the wrong type for the operation.
    TypeError,

    /// Integer division or modulo by zero.
    DivideByZero,

    /// Malformed definition or control structure.
    CompileError,

    /// A token was neither a known word nor a number.
    UndefinedWord,

    /// Everything else, `ABORT`, arbitrary `THROW` codes and host failures.
    Unknown
}


impl Display for ErrorKind
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        let name = match self
            {
                ErrorKind::StackUnderflow => "stack underflow",
                ErrorKind::TypeError => "type error",
                ErrorKind::DivideByZero => "divide by zero",
                ErrorKind::CompileError => "compile error",
                ErrorKind::UndefinedWord => "undefined word",
                ErrorKind::Unknown => "error"
            };

        write!(f, "{}", name)
    }
}


impl ErrorKind
{
    /// The default numeric code for errors of this kind.
    pub fn code(&self) -> i64
    {
        match self
        {
            ErrorKind::StackUnderflow => -4,
            ErrorKind::TypeError => -12,
            ErrorKind::DivideByZero => -10,
            ErrorKind::CompileError => -22,
            ErrorKind::UndefinedWord => -13,
            ErrorKind::Unknown => -1
        }
    }

    /// Map a numeric code back to the kind it stands for.  Codes without a dedicated kind map to
    /// `Unknown`.
    pub fn from_code(code: i64) -> ErrorKind
    {
        match code
        {
            -4 => ErrorKind::StackUnderflow,
            -12 => ErrorKind::TypeError,
            -10 => ErrorKind::DivideByZero,
            -22 => ErrorKind::CompileError,
            -13 => ErrorKind::UndefinedWord,
            _ => ErrorKind::Unknown
        }
    }
}



/// The code used for errors that don't originate from the language itself, such as I/O failures
/// or a worker thread that panicked.
pub const HOST_ERROR_CODE: i64 = 1;

/// `ABORT` reports this code.
pub const ABORT_CODE: i64 = -1;

/// `ABORT"` reports this code.
pub const ABORT_QUOTE_CODE: i64 = -2;

/// Too many nested word calls.
pub const RETURN_STACK_OVERFLOW_CODE: i64 = -5;

/// A memory access outside of the allotted data space.
pub const INVALID_ADDRESS_CODE: i64 = -9;



/// Any error that occurs during the execution of a script.
#[derive(Clone)]
pub struct ScriptError
{
    /// What class of error this is.
    kind: ErrorKind,

    /// The numeric code reported to `CATCH`.
    code: i64,

    /// Where in the script the error was raised.
    location: Option<SourceLocation>,

    error: String,

    /// Snapshot of the words being executed when the error was raised.
    call_stack: Option<CallStack>
}


impl Error for ScriptError
{
}


/// Lets `main` return the error directly.
impl Termination for ScriptError
{
    fn report(self) -> ExitCode
    {
        eprintln!("Error: {}", self);
        ExitCode::FAILURE
    }
}


/// Pretty print the ScriptError for the user, including where it happened and how we got there.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}", location, self.error)?,
            None => write!(f, "{}", self.error)?
        }

        if let Some(call_stack) = &self.call_stack
        {
            if !call_stack.is_empty()
            {
                write!(f, "\n\nCall stack\n")?;

                for item in call_stack.iter().rev()
                {
                    writeln!(f, "  {}", item)?;
                }
            }
        }

        Ok(())
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "[{} {}] {}", self.kind, self.code, self)
    }
}


impl ScriptError
{
    /// Create a new ScriptError for a failure outside of the language's own error classes.
    pub fn new(location: Option<SourceLocation>,
               error: String,
               call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                kind: ErrorKind::Unknown,
                code: HOST_ERROR_CODE,
                location,
                error,
                call_stack
            }
    }

    /// Create a new ScriptError of the given kind, using the kind's default code.
    pub fn new_with_kind(kind: ErrorKind,
                         location: Option<SourceLocation>,
                         error: String,
                         call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                kind,
                code: kind.code(),
                location,
                error,
                call_stack
            }
    }

    /// Shorthand for `Err(ScriptError::new(..))`.
    pub fn new_as_result<T>(location: Option<SourceLocation>,
                            error: String,
                            call_stack: Option<CallStack>) -> Result<T>
    {
        Err(ScriptError::new(location, error, call_stack))
    }

    /// Replace the code reported by this error.  The kind follows the code where a dedicated kind
    /// exists for it.
    pub fn with_code(mut self, code: i64) -> ScriptError
    {
        self.code = code;
        self.kind = ErrorKind::from_code(code);
        self
    }

    /// Attach a location if the error doesn't already know where it happened.
    pub fn with_location(mut self, location: Option<SourceLocation>) -> ScriptError
    {
        if self.location.is_none()
        {
            self.location = location;
        }

        self
    }

    /// What class of error this is.
    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    /// The numeric code of the error.
    pub fn code(&self) -> i64
    {
        self.code
    }

    /// The code as reported by `CATCH`.  This is never zero as zero means success.
    pub fn catch_code(&self) -> i64
    {
        if self.code == 0 { HOST_ERROR_CODE } else { self.code }
    }

    /// Where the error was raised, when known.
    pub fn location(&self) -> &Option<SourceLocation>
    {
        &self.location
    }

    /// The message.
    pub fn error(&self) -> &String
    {
        &self.error
    }

    /// The script's call stack when the error was raised.
    pub fn call_stack(&self) -> &Option<CallStack>
    {
        &self.call_stack
    }
}


/// I/O failures surface as host errors so `?` works on file and console operations.
impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(None, format!("I/O error: {}", error), None)
    }
}



/// Fail with a host error at the interpreter's current location, capturing its call stack.
pub fn script_error<T>(interpreter: &dyn Interpreter, message: String) -> Result<T>
{
    let location = interpreter.current_location().clone();
    let call_stack = interpreter.call_stack().clone();

    ScriptError::new_as_result(location, message, Some(call_stack))
}


pub fn script_error_str<T>(interpreter: &dyn Interpreter, message: &str) -> Result<T>
{
    script_error(interpreter, message.to_string())
}


/// Raise an error of a specific kind at the interpreter's current location.
pub fn kind_error<T>(interpreter: &dyn Interpreter, kind: ErrorKind, message: String) -> Result<T>
{
    let location = interpreter.current_location().clone();
    let call_stack = interpreter.call_stack().clone();

    Err(ScriptError::new_with_kind(kind, location, message, Some(call_stack)))
}


/// Raise an error with an explicit numeric code, as `THROW` does.
pub fn code_error<T>(interpreter: &dyn Interpreter, code: i64, message: String) -> Result<T>
{
    let location = interpreter.current_location().clone();
    let call_stack = interpreter.call_stack().clone();

    Err(ScriptError::new(location, message, Some(call_stack)).with_code(code))
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn kinds_round_trip_through_codes()
    {
        for kind in [ ErrorKind::StackUnderflow, ErrorKind::TypeError, ErrorKind::DivideByZero,
                      ErrorKind::CompileError, ErrorKind::UndefinedWord ]
        {
            assert_eq!(ErrorKind::from_code(kind.code()), kind);
        }

        assert_eq!(ErrorKind::from_code(42), ErrorKind::Unknown);
    }

    #[test]
    fn host_errors_report_one()
    {
        let error = ScriptError::new(None, "boom".to_string(), None);

        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert_eq!(error.catch_code(), 1);
    }

    #[test]
    fn with_code_updates_kind()
    {
        let error = ScriptError::new(None, "x".to_string(), None).with_code(-4);

        assert_eq!(error.kind(), ErrorKind::StackUnderflow);
        assert_eq!(error.code(), -4);
    }

    #[test]
    fn display_includes_location()
    {
        let location = SourceLocation::new_from_info("script.f", 3, 7);
        let error = ScriptError::new_with_kind(ErrorKind::UndefinedWord,
                                               Some(location),
                                               "Word FOO not found.".to_string(),
                                               None);

        assert_eq!(error.to_string(), "script.f (3, 7): Word FOO not found.");
    }
}
