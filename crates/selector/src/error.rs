use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("syntax error at position {position} near '{found}'")]
    Syntax { position: usize, found: String },
}
