//! Text and JSON surface of the query language.
//!
//! This crate turns query text such as `.friends | sort(.age) | pick(.name)`
//! into an AST, converts the AST to and from its JSON "function notation"
//! (`["pipe", ["get", "friends"], ...]`), and renders an AST back into text.
//! Evaluation lives in the engine crate.

pub mod ast;
pub mod error;
pub mod normalize;
mod parser;
pub mod stringify;
pub mod value;

// --- Public API ---
pub use ast::Node;
pub use error::{AstError, ParseError, ParseErrorKind};
pub use parser::parse;
pub use stringify::{StringifyOptions, stringify};
