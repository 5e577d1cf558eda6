use crate::{
    lang::source_buffer::{SourceBuffer, SourceLocation},
    runtime::error::{self, ErrorKind, ScriptError},
};
use lazy_static::lazy_static;
use std::{
    collections::HashSet,
    fmt::{self, Debug, Display, Formatter},
};

lazy_static! {
    /// Words whose payload runs up to the next `"` and is captured as part of the token.
    static ref QUOTING_WORDS: HashSet<&'static str> = ["S\"", ".\"", "ABORT\""]
        .into_iter()
        .collect();
}

/// A number literal can be either an integer or a floating point value.
#[derive(Clone, Copy, PartialEq)]
pub enum NumberType {
    /// We're holding an integer value.
    Int(i64),

    /// We're holding a floating point value.
    Float(f64),
}

/// Print the value of the held number.
impl Display for NumberType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberType::Int(num) => write!(f, "{}", num),
            NumberType::Float(num) => write!(f, "{:e}", num),
        }
    }
}

/// Print the value of the held number as well as an indicator of which variant we're holding for
/// debugging purposes.
impl Debug for NumberType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberType::Int(num) => write!(f, "{} i", num),
            NumberType::Float(num) => write!(f, "{} f", num),
        }
    }
}

/// A token is a whitespace delimited unit of the source text.  Numbers are not distinguished here
/// because what counts as a number depends on the interpreter's current base, which is only known
/// when the token is evaluated.
///
/// The token also holds the location in the original source code where it was found.
#[derive(Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain word, (or a number still to be recognized.)
    Word(SourceLocation, String),

    /// A quoting word such as `S"` or `."` together with its payload.  The payload has had the
    /// single separating space after the opening word removed.
    Quoted(SourceLocation, String, String),
}

/// Make sure that the tokens are printable the way they appeared in the source.
impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Word(_, text) => write!(f, "{}", text),
            Token::Quoted(_, word, payload) => write!(f, "{} {}\"", word, payload),
        }
    }
}

/// Include the original location when debugging.
impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self)
    }
}

impl Token {
    /// Get the token's location in the original source text.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Token::Word(location, _) => location,
            Token::Quoted(location, _, _) => location,
        }
    }

    /// The text of the word, or of the quoting word for a quoted token.
    pub fn text(&self) -> &String {
        match self {
            Token::Word(_, text) => text,
            Token::Quoted(_, word, _) => word,
        }
    }
}

/// Check if the given character is considered whitespace.
fn is_whitespace(next: &char) -> bool {
    next.is_whitespace()
}

/// Skip over whitespace in the text.  Stopping only at either the end of the buffer or the next
/// non-whitespace character.
fn skip_whitespace(buffer: &mut SourceBuffer) {
    while let Some(next) = buffer.peek_next() {
        if !is_whitespace(&next) {
            break;
        }

        let _ = buffer.next_char();
    }
}

/// Pull text out of the buffer until we hit a whitespace character.  This is used to process words.
/// Words can contain any character except whitespace.
fn process_until_whitespace(buffer: &mut SourceBuffer) -> (SourceLocation, String) {
    let location = buffer.location().clone();
    let mut text = String::new();

    while let Some(next) = buffer.peek_next() {
        if is_whitespace(&next) {
            break;
        }

        text.push(next);
        let _ = buffer.next_char();
    }

    (location, text)
}

/// Is the word text one that introduces a quoted payload?
pub fn is_quoting_word(text: &str) -> bool {
    QUOTING_WORDS.contains(text.to_uppercase().as_str())
}

/// Read the payload of a quoting word.  Exactly one whitespace character after the quoting word is
/// a separator and not part of the payload.  No escape processing is performed.
fn process_quoted_payload(location: &SourceLocation, buffer: &mut SourceBuffer) -> error::Result<String> {
    if let Some(next) = buffer.peek_next() {
        if is_whitespace(&next) {
            let _ = buffer.next_char();
        }
    }

    let mut text = String::new();

    loop {
        match buffer.next_char() {
            Some('"') => return Ok(text),
            Some(next) => text.push(next),
            None => {
                return Err(ScriptError::new_with_kind(
                    ErrorKind::CompileError,
                    Some(location.clone()),
                    "Unexpected end of input in string literal.".to_string(),
                    None,
                ));
            }
        }
    }
}

/// Get the next token from the buffer.  `Ok(None)` signals the end of the input.
pub fn next_token(buffer: &mut SourceBuffer) -> error::Result<Option<Token>> {
    skip_whitespace(buffer);

    if buffer.is_exhausted() {
        return Ok(None);
    }

    let (location, text) = process_until_whitespace(buffer);

    if is_quoting_word(&text) {
        let payload = process_quoted_payload(&location, buffer)?;
        return Ok(Some(Token::Quoted(location, text, payload)));
    }

    Ok(Some(Token::Word(location, text)))
}

/// Consume raw text up to, and including, the delimiter.  The delimiter is not part of the
/// returned text.  The flag is false if the input ran out before the delimiter was found.
///
/// Like with the quoting words a single leading whitespace separator is dropped.
pub fn parse_until(buffer: &mut SourceBuffer, delimiter: char) -> (String, bool) {
    if let Some(next) = buffer.peek_next() {
        if is_whitespace(&next) && next != delimiter {
            let _ = buffer.next_char();
        }
    }

    let mut text = String::new();

    while let Some(next) = buffer.next_char() {
        if next == delimiter {
            return (text, true);
        }

        text.push(next);
    }

    (text, false)
}

/// Convert a single digit character to its value in the given base.
fn digit_value(c: char, base: u32) -> Option<u32> {
    c.to_digit(36).filter(|digit| *digit < base)
}

/// Parse an integer in the given base, allowing a leading minus sign.  Negative numbers are
/// accumulated below zero so that the most negative integer can be written.
fn parse_integer(text: &str, base: u32) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if digits.is_empty() {
        return None;
    }

    let mut value: i64 = 0;

    for c in digits.chars() {
        let digit = digit_value(c, base)? as i64;
        let shifted = value.checked_mul(base as i64)?;

        value = if negative {
            shifted.checked_sub(digit)?
        } else {
            shifted.checked_add(digit)?
        };
    }

    Some(value)
}

/// Attempt to read a float literal.  A float needs a decimal point or an exponent marker, a
/// trailing bare exponent marker such as in `1.5e` is allowed and means an exponent of zero.
fn parse_float(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();

    if !lower.contains('.') && !lower.contains('e') {
        return None;
    }

    if !lower.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = if lower.ends_with('e') {
        format!("{}0", lower)
    } else {
        lower
    };

    normalized.parse::<f64>().ok()
}

/// Attempt to convert the token text into a numeric literal honoring the given base.  The
/// prefixes `$`, `#` and `%` force hexadecimal, decimal and binary.  A character literal in the
/// form `'c'` is also accepted.  Floats are only recognized in base 10.
pub fn parse_number(text: &str, base: u32) -> Option<NumberType> {
    let chars: Vec<char> = text.chars().collect();

    if chars.len() == 3 && chars[0] == '\'' && chars[2] == '\'' {
        return Some(NumberType::Int(chars[1] as i64));
    }

    let (base, digits) = if let Some(rest) = text.strip_prefix('$') {
        (16, rest)
    } else if let Some(rest) = text.strip_prefix('#') {
        (10, rest)
    } else if let Some(rest) = text.strip_prefix('%') {
        (2, rest)
    } else {
        (base, text)
    };

    if let Some(value) = parse_integer(digits, base) {
        return Some(NumberType::Int(value));
    }

    if base == 10 {
        return parse_float(digits).map(NumberType::Float);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_from_source(path: &str, source: &str) -> error::Result<Vec<Token>> {
        let mut buffer = SourceBuffer::new(path, source);
        let mut tokens = Vec::new();

        while let Some(token) = next_token(&mut buffer)? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize_from_source("<test>", source)
            .unwrap()
            .iter()
            .map(|token| token.to_string())
            .collect()
    }

    #[test]
    fn whitespace_separates_words() {
        assert_eq!(texts("  dup\n\tswap   drop "), vec!["dup", "swap", "drop"]);
        assert!(texts(" \n\t ").is_empty());
    }

    #[test]
    fn quoted_payload_keeps_interior_whitespace() {
        let tokens = tokenize_from_source("<test>", ".\" hello   world\" cr").unwrap();

        assert_eq!(tokens.len(), 2);

        match &tokens[0] {
            Token::Quoted(_, word, payload) => {
                assert_eq!(word, ".\"");
                assert_eq!(payload, "hello   world");
            }
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn only_one_leading_space_is_dropped() {
        let tokens = tokenize_from_source("<test>", "s\"   padded\"").unwrap();

        match &tokens[0] {
            Token::Quoted(_, _, payload) => assert_eq!(payload, "  padded"),
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn no_escape_processing() {
        let tokens = tokenize_from_source("<test>", "S\" a\\nb\"").unwrap();

        match &tokens[0] {
            Token::Quoted(_, _, payload) => assert_eq!(payload, "a\\nb"),
            other => panic!("unexpected token {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_a_compile_error() {
        let error = tokenize_from_source("<test>", "S\" never closed").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CompileError);
    }

    #[test]
    fn token_locations_track_lines() {
        let tokens = tokenize_from_source("<test>", "a\n  b").unwrap();

        assert_eq!(tokens[1].location().line(), 2);
        assert_eq!(tokens[1].location().column(), 3);
    }

    #[test]
    fn parse_until_consumes_delimiter() {
        let mut buffer = SourceBuffer::new("<test>", " comment here) next");
        let (text, found) = parse_until(&mut buffer, ')');

        assert!(found);
        assert_eq!(text, "comment here");
        assert_eq!(next_token(&mut buffer).unwrap().unwrap().text(), "next");
    }

    #[test]
    fn numbers_honor_base() {
        assert_eq!(parse_number("42", 10), Some(NumberType::Int(42)));
        assert_eq!(parse_number("-17", 10), Some(NumberType::Int(-17)));
        assert_eq!(parse_number("ff", 16), Some(NumberType::Int(255)));
        assert_eq!(parse_number("FF", 16), Some(NumberType::Int(255)));
        assert_eq!(parse_number("ff", 10), None);
        assert_eq!(parse_number("$10", 10), Some(NumberType::Int(16)));
        assert_eq!(parse_number("%101", 10), Some(NumberType::Int(5)));
        assert_eq!(parse_number("'A'", 10), Some(NumberType::Int(65)));
    }

    #[test]
    fn integers_cover_the_full_range() {
        assert_eq!(parse_number("-9223372036854775808", 10), Some(NumberType::Int(i64::MIN)));
        assert_eq!(parse_number("9223372036854775807", 10), Some(NumberType::Int(i64::MAX)));
        assert_eq!(parse_number("-$8000000000000000", 10), None);
        assert_eq!(parse_number("$-8000000000000000", 10), Some(NumberType::Int(i64::MIN)));
        assert_eq!(parse_number("9223372036854775808", 10), None);
        assert_eq!(parse_number("-9223372036854775809", 10), None);
    }

    #[test]
    fn floats_need_point_or_exponent() {
        assert_eq!(parse_number("1.5", 10), Some(NumberType::Float(1.5)));
        assert_eq!(parse_number("2e3", 10), Some(NumberType::Float(2000.0)));
        assert_eq!(parse_number("1.5e", 10), Some(NumberType::Float(1.5)));
        assert_eq!(parse_number("e", 10), None);
        assert_eq!(parse_number(".", 10), None);
        assert_eq!(parse_number("-", 10), None);
    }
}
