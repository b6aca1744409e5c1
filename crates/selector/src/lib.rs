//! A small SQL-style predicate language for filtering JSON objects.
//!
//! Selectors such as `address.state = 'Alaska' AND age < 10` are compiled
//! once and then evaluated against many values. Field names are dotted paths
//! resolved from the value being tested; string literals use single quotes.

pub mod ast;
mod engine;
pub mod error;
mod parser;

// --- Public API ---
pub use ast::{CompareOp, Operand, Predicate};
pub use error::SelectorError;

use serde_json::Value;

/// A compiled selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    predicate: Predicate,
}

impl Selector {
    /// Returns `true` when `item` satisfies the selector.
    pub fn evaluate(&self, item: &Value) -> bool {
        engine::evaluate(&self.predicate, item)
    }

    /// The text the selector was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

/// Compiles selector text.
pub fn compile(source: &str) -> Result<Selector, SelectorError> {
    let predicate = parser::parse_predicate(source)?;
    log::trace!("Compiled selector '{}' into {:?}", source, predicate);
    Ok(Selector {
        source: source.to_string(),
        predicate,
    })
}
