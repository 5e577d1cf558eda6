use arcstr::ArcStr;
use std::{ fmt::{ self,
                  Debug,
                  Display,
                  Formatter },
           sync::Arc };
use crate::{ lang::tokenizing::NumberType,
             runtime::{ data_structures::{ task::TaskHandle,
                                           word::WordRef },
                        error::{ self,
                                 kind_error,
                                 ErrorKind },
                        interpreter::Interpreter } };



/// The value type flowing through the data stack and the data space.  Every primitive matches on
/// the variant it needs and reports a type error otherwise.  There are no implicit conversions
/// between integers and floats.
#[derive(Clone)]
pub enum Value
{
    /// A 64-bit signed integer.  Flags are integers too, -1 for true and 0 for false.
    Int(i64),

    /// A 64-bit floating point value.
    Float(f64),

    /// Shared immutable text.
    String(ArcStr),

    /// An execution token.
    Word(WordRef),

    /// A reference to a child evaluation.
    Task(TaskHandle)
}


impl Default for Value
{
    fn default() -> Value
    {
        Value::Int(0)
    }
}


/// Values compare equal only when they hold the same variant.  Words and tasks compare by
/// identity.
impl PartialEq for Value
{
    fn eq(&self, other: &Value) -> bool
    {
        match ( self, other )
        {
            ( Value::Int(a), Value::Int(b) ) => a == b,
            ( Value::Float(a), Value::Float(b) ) => a == b,
            ( Value::String(a), Value::String(b) ) => a == b,
            ( Value::Word(a), Value::Word(b) ) => Arc::ptr_eq(a, b),
            ( Value::Task(a), Value::Task(b) ) => a.id() == b.id(),
            _ => false
        }
    }
}


impl Display for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{:?}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Word(word) => write!(f, "{}", word.display_name()),
            Value::Task(task) => write!(f, "<task {}>", task.id())
        }
    }
}


/// Strings are quoted so that they stand out in stack dumps.
impl Debug for Value
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Value::String(value) => write!(f, "{:?}", value.as_str()),
            Value::Word(word) => write!(f, "' {}", word.display_name()),
            _ => write!(f, "{}", self)
        }
    }
}


/// Implement the checked accessors and the conversions into the Value for the variants that wrap
/// a single plain type.
macro_rules! value_conversion
{
    ($variant:ident, $data_type:ty, $as_ident:ident, $type_name:literal) =>
    {
        impl Value
        {
            /// Access the held data, or fail with a type error naming the expected type.
            pub fn $as_ident(&self, interpreter: &dyn Interpreter) -> error::Result<&$data_type>
            {
                match self
                {
                    Value::$variant(value) => Ok(value),
                    _ => kind_error(interpreter,
                                    ErrorKind::TypeError,
                                    format!("Expected {}, found {} {:?}.",
                                            $type_name,
                                            self.type_name(),
                                            self))
                }
            }
        }

        impl From<$data_type> for Value
        {
            fn from(original: $data_type) -> Value
            {
                Value::$variant(original)
            }
        }
    };
}


value_conversion!(Int, i64, as_int, "an integer");
value_conversion!(Float, f64, as_float, "a float");
value_conversion!(String, ArcStr, as_string, "a string");
value_conversion!(Word, WordRef, as_word, "an execution token");
value_conversion!(Task, TaskHandle, as_task, "a task handle");


impl From<bool> for Value
{
    fn from(flag: bool) -> Value
    {
        Value::Int(if flag { -1 } else { 0 })
    }
}


impl From<&str> for Value
{
    fn from(text: &str) -> Value
    {
        Value::String(ArcStr::from(text))
    }
}


impl From<String> for Value
{
    fn from(text: String) -> Value
    {
        Value::String(ArcStr::from(text))
    }
}


impl From<usize> for Value
{
    fn from(value: usize) -> Value
    {
        Value::Int(value as i64)
    }
}


impl From<NumberType> for Value
{
    fn from(number: NumberType) -> Value
    {
        match number
        {
            NumberType::Int(value) => Value::Int(value),
            NumberType::Float(value) => Value::Float(value)
        }
    }
}


impl Value
{
    /// A short name of the held type, used in error messages.
    pub fn type_name(&self) -> &'static str
    {
        match self
        {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Word(_) => "execution token",
            Value::Task(_) => "task"
        }
    }
}


#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn equality_requires_matching_variants()
    {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Float(3.0));
        assert_ne!(Value::from("3"), Value::Int(3));
        assert_eq!(Value::from("abc"), Value::from("abc".to_string()));
    }

    #[test]
    fn flags_are_all_bits()
    {
        assert_eq!(Value::from(true), Value::Int(-1));
        assert_eq!(Value::from(false), Value::Int(0));
    }

    #[test]
    fn display_and_debug()
    {
        assert_eq!(Value::Int(-12).to_string(), "-12");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(format!("{:?}", Value::from("hi")), "\"hi\"");
    }
}
