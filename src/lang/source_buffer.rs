use std::fmt::{ self,
                Display,
                Formatter };



/// A position in some source text: the file or tag the text came from and the 1 based line and
/// column.  Tokens, words and errors all carry one.
#[derive(Clone, PartialEq, PartialOrd, Eq, Hash)]
pub struct SourceLocation
{
    /// File path, or a tag such as `<repl>` or `<evaluate>` for text that isn't from a file.
    path: String,

    line: usize,

    column: usize
}


/// Shown as `path (line, column)` in error messages.
impl Display for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result
    {
        write!(formatter, "{} ({}, {})", self.path, self.line, self.column)
    }
}


impl Default for SourceLocation
{
    fn default() -> Self
    {
        Self::new()
    }
}


impl SourceLocation
{
    /// A location that doesn't point anywhere in particular.
    pub fn new() -> SourceLocation
    {
        SourceLocation::new_from_info("unspecified", 1, 1)
    }

    /// The start of the text tagged with the path.
    pub fn new_from_path(path: &str) -> Self
    {
        SourceLocation::new_from_info(path, 1, 1)
    }

    pub fn new_from_info(path: &str, line: usize, column: usize) -> Self
    {
        SourceLocation { path: path.to_owned(), line, column }
    }

    pub fn path(&self) -> &String
    {
        &self.path
    }

    pub fn line(&self) -> usize
    {
        self.line
    }

    pub fn column(&self) -> usize
    {
        self.column
    }
}



/// The location of the macro invocation in the Rust source.  Native words are registered with
/// it, and errors raised outside of any script text report it.
#[macro_export]
macro_rules! location_here
{
    () =>
    {
        $crate::lang::source_buffer::SourceLocation::new_from_info(file!(),
                                      line!() as usize,
                                      column!() as usize)
    };
}



/// A buffer for processing source code.  The tokenizer pulls characters from it one at a time and
/// the buffer keeps track of the cursor's logical location as it goes.
///
/// Unlike a one-shot tokenizer pass the buffer owns its text and is kept alive on the
/// interpreter's input stack for as long as the text is being evaluated.  This is what lets words
/// like `:` or `S"` reach in and consume more of the raw input before the evaluator carries on.
pub struct SourceBuffer
{
    /// The characters of the source text.
    chars: Vec<char>,

    /// Index of the next character to be consumed.
    position: usize,

    location: SourceLocation
}


impl SourceBuffer
{
    /// Buffer the text, locations are reported against the path or tag given.
    pub fn new(path: &str, source: &str) -> Self
    {
        SourceBuffer
            {
                chars: source.chars().collect(),
                position: 0,
                location: SourceLocation::new_from_path(path)
            }
    }

    /// Where the next character comes from.
    pub fn location(&self) -> &SourceLocation
    {
        &self.location
    }

    /// Has all of the text been consumed?
    pub fn is_exhausted(&self) -> bool
    {
        self.position >= self.chars.len()
    }

    pub fn peek_next(&self) -> Option<char>
    {
        self.chars.get(self.position).copied()
    }

    /// Consume a character, advancing the location past it.
    pub fn next_char(&mut self) -> Option<char>
    {
        let consumed = self.peek_next()?;

        self.position += 1;
        self.advance_location(consumed);

        Some(consumed)
    }

    /// Skip the rest of the current line, including the new line itself.
    pub fn skip_line(&mut self)
    {
        while let Some(next) = self.next_char()
        {
            if next == '\n'
            {
                break;
            }
        }
    }

    fn advance_location(&mut self, consumed: char)
    {
        match consumed
        {
            '\n' =>
                {
                    self.location.line += 1;
                    self.location.column = 1;
                },

            _ => self.location.column += 1
        }
    }
}
