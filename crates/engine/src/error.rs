use crate::registry::Arity;
use jsonquery_selector::SelectorError;
use jsonquery_syntax::AstError;
use thiserror::Error;

/// A query that cannot be turned into a program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unknown function \"{0}\"")]
    UnknownFunction(String),

    #[error("{function} expects {expected}")]
    Arity { function: String, expected: Arity },

    #[error("{message}")]
    InvalidArgument { function: String, message: String },

    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    InvalidQuery(#[from] AstError),
}

impl CompileError {
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// A failure while applying a compiled program to a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("{0} expected")]
    TypeMismatch(&'static str),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unsupported regex flag: {0}")]
    UnsupportedRegexFlag(char),

    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("{0} produced a number outside the JSON range")]
    NonFinite(&'static str),
}

impl EvalError {
    pub fn array_expected() -> Self {
        Self::TypeMismatch("Array")
    }

    pub fn object_expected() -> Self {
        Self::TypeMismatch("Object")
    }

    pub fn number_expected() -> Self {
        Self::TypeMismatch("Number")
    }

    pub fn string_expected() -> Self {
        Self::TypeMismatch("String")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            CompileError::UnknownFunction("foo".into()).to_string(),
            "Unknown function \"foo\""
        );
        assert_eq!(
            CompileError::Arity {
                function: "sort".into(),
                expected: Arity::Range(0, 2),
            }
            .to_string(),
            "sort expects 0 to 2 arguments"
        );
        assert_eq!(EvalError::array_expected().to_string(), "Array expected");
        assert_eq!(EvalError::DivisionByZero.to_string(), "Division by zero");
        assert_eq!(
            EvalError::UnsupportedRegexFlag('x').to_string(),
            "Unsupported regex flag: x"
        );
        assert_eq!(
            CompileError::from(AstError::EmptyCall).to_string(),
            "Query array cannot be empty"
        );
    }
}
