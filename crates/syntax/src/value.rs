//! Helpers over `serde_json::Value` shared by the parser and the evaluator.
//!
//! Objects keep insertion order (`preserve_order`), numbers keep the
//! int/float duality of `serde_json::Number`.
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Largest magnitude at which an `f64` can still be converted to `i64` exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Converts a computed float into a JSON number.
///
/// Integral values that fit an `i64` become integers, everything else stays a
/// float. Returns `None` for NaN and infinities, which JSON cannot represent.
pub fn normalize_number(value: f64) -> Option<Value> {
    if !value.is_finite() {
        return None;
    }
    if value == value.trunc() && value >= -I64_BOUND && value < I64_BOUND {
        return Some(Value::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number)
}

/// The boolean interpretation of a value.
///
/// Empty strings, empty arrays and empty objects are falsy, as are `null`,
/// `false` and zero.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Structural equality where numbers compare by value and object key order
/// is ignored.
pub fn deep_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| deep_equals(x, y)))
        }
        _ => false,
    }
}

/// Orders two numbers, exactly when both are integers.
pub fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return Some(a.cmp(&b));
    }
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

/// Orders two scalars of the same kind. Any other pairing is unordered.
pub fn compare_scalars(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A short name for the kind of a value, used in diagnostics.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
