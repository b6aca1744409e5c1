//! The executable form of a query.
use crate::error::EvalError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type EvalResult = Result<Value, EvalError>;

type Run = dyn Fn(&Value) -> EvalResult + Send + Sync;

/// A pure transformation from one JSON document to another.
///
/// Programs hold no mutable state, so a single program can be applied to any
/// number of documents, from any number of threads. Cloning is cheap.
#[derive(Clone)]
pub struct CompiledProgram {
    run: Arc<Run>,
}

impl CompiledProgram {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&Value) -> EvalResult + Send + Sync + 'static,
    {
        Self { run: Arc::new(run) }
    }

    /// A program that ignores its input.
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    /// A program that returns its input unchanged.
    pub fn identity() -> Self {
        Self::new(|input| Ok(input.clone()))
    }

    pub fn apply(&self, input: &Value) -> EvalResult {
        (self.run)(input)
    }
}

impl fmt::Debug for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProgram").finish_non_exhaustive()
    }
}
