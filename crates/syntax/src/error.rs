use thiserror::Error;

/// What went wrong while parsing query text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Key expected")]
    KeyExpected,

    #[error("Property expected")]
    PropertyExpected,

    #[error("Value expected")]
    ValueExpected,

    #[error("Character '{0}' expected")]
    CharacterExpected(char),

    #[error("Unexpected part '{0}'")]
    UnexpectedPart(String),
}

/// A syntax error, usually carrying the byte offset where it was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}{}", position_suffix(.position))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Option<usize>,
}

fn position_suffix(position: &Option<usize>) -> String {
    position.map(|pos| format!(" (pos: {})", pos)).unwrap_or_default()
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: Option<usize>) -> Self {
        Self { kind, position }
    }

    pub fn key_expected(position: usize) -> Self {
        Self::new(ParseErrorKind::KeyExpected, Some(position))
    }

    pub fn property_expected(position: usize) -> Self {
        Self::new(ParseErrorKind::PropertyExpected, Some(position))
    }

    pub fn value_expected(position: usize) -> Self {
        Self::new(ParseErrorKind::ValueExpected, Some(position))
    }

    pub fn character_expected(ch: char, position: usize) -> Self {
        Self::new(ParseErrorKind::CharacterExpected(ch), Some(position))
    }

    pub fn unexpected_part(part: impl Into<String>, position: Option<usize>) -> Self {
        Self::new(ParseErrorKind::UnexpectedPart(part.into()), position)
    }
}

/// A JSON document that is not valid function notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    #[error("Query array cannot be empty")]
    EmptyCall,

    #[error("First element of query array must be a function name string")]
    MissingFunctionName,

    #[error("Function notation [\"object\", {{...}}] expected but got {0}")]
    ObjectNotation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ParseError::value_expected(4).to_string(), "Value expected (pos: 4)");
        assert_eq!(
            ParseError::character_expected(')', 9).to_string(),
            "Character ')' expected (pos: 9)"
        );
        assert_eq!(
            ParseError::unexpected_part("#x", None).to_string(),
            "Unexpected part '#x'"
        );
        assert_eq!(
            AstError::ObjectNotation("{}".into()).to_string(),
            "Function notation [\"object\", {...}] expected but got {}"
        );
    }
}
