use jsonquery_engine::{CompileError, EvalError};
use jsonquery_syntax::{AstError, ParseError};
use thiserror::Error;

/// Any failure between query text and query result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JsonQueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<AstError> for JsonQueryError {
    fn from(error: AstError) -> Self {
        JsonQueryError::Compile(error.into())
    }
}
