pub mod fixtures;

use jsonquery::{JsonQuery, JsonQueryError};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Installs the test logger; safe to call from every test.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parses, compiles and applies query text.
pub fn run_text(text: &str, data: &Value) -> Result<Value, JsonQueryError> {
    init_logger();
    JsonQuery::parse(text)?.apply(data)
}

/// Compiles function notation and applies it.
pub fn run_json(query: &Value, data: &Value) -> Result<Value, JsonQueryError> {
    init_logger();
    JsonQuery::from_json(query)?.apply(data)
}

/// The function notation produced by parsing `text`.
pub fn parsed(text: &str) -> Value {
    match jsonquery::parse(text) {
        Ok(node) => node.to_json(),
        Err(err) => panic!("failed to parse {:?}: {}", text, err),
    }
}
