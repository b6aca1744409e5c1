//! A small query language for JSON documents.
//!
//! Queries are written as text, e.g.
//! `.friends | filter(.city == "New York") | sort(.age) | pick(.name, .age)`,
//! or as JSON function notation,
//! `["pipe", ["get", "friends"], ["sort", ["get", "age"]]]`.
//! Both forms compile to the same program.
//!
//! # Key Types
//!
//! - [`JsonQuery`]: a parsed and compiled query, ready to apply
//! - [`Node`]: the query AST, convertible to and from function notation
//! - [`Compiler`] / [`FunctionRegistry`]: compilation with custom functions
//! - [`JsonQueryError`]: parse, compile and evaluation errors
//!
//! # Example
//!
//! ```
//! use jsonquery::JsonQuery;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), jsonquery::JsonQueryError> {
//! let query = JsonQuery::parse(".items | filter(.price > 10) | map(.name)")?;
//! let names = query.apply(&json!({ "items": [{ "name": "a", "price": 12 }] }))?;
//! assert_eq!(names, json!(["a"]));
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use jsonquery_engine as engine;
pub use jsonquery_selector as selector;
pub use jsonquery_syntax as syntax;

// --- Public API ---
pub use error::JsonQueryError;
pub use jsonquery_engine::{
    Arity, CompileError, CompiledProgram, Compiler, EvalError, FunctionDescriptor,
    FunctionRegistry,
};
pub use jsonquery_syntax::{Node, ParseError, ParseErrorKind, StringifyOptions, parse, stringify};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A query together with its compiled program.
///
/// The AST is kept so the query can be printed or serialized back to
/// function notation; the program is what [`JsonQuery::apply`] runs.
#[derive(Debug, Clone)]
pub struct JsonQuery {
    node: Node,
    program: CompiledProgram,
}

impl JsonQuery {
    /// Parses and compiles query text against the built-in functions.
    pub fn parse(text: &str) -> Result<Self, JsonQueryError> {
        Self::parse_with(text, &Compiler::new())
    }

    /// Parses query text and compiles it with `compiler`.
    pub fn parse_with(text: &str, compiler: &Compiler) -> Result<Self, JsonQueryError> {
        Self::from_node_with(parse(text)?, compiler)
    }

    /// Decodes function notation and compiles it against the built-in functions.
    pub fn from_json(query: &Value) -> Result<Self, JsonQueryError> {
        Self::from_node_with(Node::from_json(query)?, &Compiler::new())
    }

    pub fn from_node_with(node: Node, compiler: &Compiler) -> Result<Self, JsonQueryError> {
        let program = compiler.compile(&node)?;
        log::debug!("Compiled query {}", node.to_json());
        Ok(Self { node, program })
    }

    /// Runs the query against `document`.
    pub fn apply(&self, document: &Value) -> Result<Value, JsonQueryError> {
        Ok(self.program.apply(document)?)
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    /// The query in function notation.
    pub fn to_json(&self) -> Value {
        self.node.to_json()
    }

    /// The query as text, laid out according to `options`.
    pub fn to_text(&self, options: &StringifyOptions) -> String {
        stringify(&self.node, options)
    }
}

impl fmt::Display for JsonQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}

impl Serialize for JsonQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JsonQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        JsonQuery::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Parses, compiles and applies `text` to `document` in one call.
pub fn query(text: &str, document: &Value) -> Result<Value, JsonQueryError> {
    JsonQuery::parse(text)?.apply(document)
}
