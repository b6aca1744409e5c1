//! The built-in function library.
//!
//! Each submodule registers a family of functions. Helpers here capture the
//! conventions they share: `null` input propagates as `null`, while a
//! non-null value of the wrong kind is a runtime error.
mod aggregate;
mod arithmetic;
mod collections;
mod logic;
mod navigation;
mod regex;
mod sort;
mod strings;

use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::{CompiledProgram, EvalResult};
use crate::registry::FunctionRegistry;
use jsonquery_syntax::Node;
use jsonquery_syntax::value::normalize_number;
use serde_json::{Map, Value};

pub(crate) fn register_builtins(registry: &mut FunctionRegistry) {
    navigation::register(registry);
    sort::register(registry);
    logic::register(registry);
    arithmetic::register(registry);
    strings::register(registry);
    regex::register(registry);
    collections::register(registry);
    aggregate::register(registry);
}

/// Converts a computed float into a JSON number, rejecting NaN and infinities.
fn number_result(function: &'static str, value: f64) -> EvalResult {
    normalize_number(value).ok_or(EvalError::NonFinite(function))
}

/// A literal string argument.
fn literal_str(node: &Node) -> Option<&str> {
    match node {
        Node::Literal(Value::String(text)) => Some(text),
        _ => None,
    }
}

/// `Ok(None)` for `null`, the items for an array, an error otherwise.
fn as_array(value: &Value) -> Result<Option<&Vec<Value>>, EvalError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items)),
        _ => Err(EvalError::array_expected()),
    }
}

/// `Ok(None)` for `null`, the fields for an object, an error otherwise.
fn as_object(value: &Value) -> Result<Option<&Map<String, Value>>, EvalError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(fields) => Ok(Some(fields)),
        _ => Err(EvalError::object_expected()),
    }
}

/// The string key used by `uniqBy`, `keyBy` and `groupBy`. Only scalars
/// other than `null` produce a key.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// The optional leading argument of functions such as `abs` or `size`,
/// defaulting to the input itself.
fn operand_or_input(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    match args.first() {
        Some(arg) => compiler.compile(arg),
        None => Ok(CompiledProgram::identity()),
    }
}

/// Applies `transform` to the items of an array input; `null` stays `null`.
fn array_transform<F>(transform: F) -> CompiledProgram
where
    F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
{
    CompiledProgram::new(move |input| match as_array(input)? {
        Some(items) => transform(items),
        None => Ok(Value::Null),
    })
}

/// Applies `transform` to the fields of an object input; `null` stays `null`.
fn object_transform<F>(transform: F) -> CompiledProgram
where
    F: Fn(&Map<String, Value>) -> EvalResult + Send + Sync + 'static,
{
    CompiledProgram::new(move |input| match as_object(input)? {
        Some(fields) => transform(fields),
        None => Ok(Value::Null),
    })
}

#[cfg(test)]
mod test_support {
    use crate::compiler::Compiler;
    use crate::error::{CompileError, EvalError};
    use serde_json::Value;

    /// Compiles function notation and applies it to `input`.
    pub fn run(query: Value, input: Value) -> Result<Value, EvalError> {
        match Compiler::new().compile_json(&query) {
            Ok(program) => program.apply(&input),
            Err(err) => panic!("failed to compile {}: {}", query, err),
        }
    }

    pub fn compile_error(query: Value) -> CompileError {
        match Compiler::new().compile_json(&query) {
            Ok(_) => panic!("expected {} to fail compilation", query),
            Err(err) => err,
        }
    }
}
