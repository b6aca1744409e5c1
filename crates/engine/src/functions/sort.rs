//! `sort([key], ["asc" | "desc"])`.
use super::{as_array, literal_str};
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::CompiledProgram;
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use jsonquery_syntax::value::compare_numbers;
use serde_json::Value;
use std::cmp::Ordering;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register("sort", FunctionDescriptor::new(Arity::Range(0, 2), compile_sort));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("asc") {
            Some(Direction::Ascending)
        } else if text.eq_ignore_ascii_case("desc") {
            Some(Direction::Descending)
        } else {
            None
        }
    }
}

fn compile_sort(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let (key, direction) = match args {
        [] => (CompiledProgram::identity(), Direction::Ascending),
        [only] => match literal_str(only).and_then(Direction::parse) {
            Some(direction) => (CompiledProgram::identity(), direction),
            None => (compiler.compile(only)?, Direction::Ascending),
        },
        [key, direction, ..] => {
            let direction = literal_str(direction).and_then(Direction::parse).ok_or_else(|| {
                CompileError::invalid_argument("sort", "sort direction must be \"asc\" or \"desc\"")
            })?;
            (compiler.compile(key)?, direction)
        }
    };

    Ok(CompiledProgram::new(move |input| {
        let Some(items) = as_array(input)? else {
            return Ok(Value::Null);
        };
        let mut entries = items
            .iter()
            .enumerate()
            .map(|(index, item)| Ok((index, key.apply(item)?, item)))
            .collect::<Result<Vec<_>, EvalError>>()?;
        entries.sort_by(|(left_index, left_key, _), (right_index, right_key, _)| {
            let ordering = compare_keys(left_key, right_key);
            let ordering = match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            ordering.then(left_index.cmp(right_index))
        });
        Ok(Value::Array(
            entries.into_iter().map(|(_, _, item)| item.clone()).collect(),
        ))
    }))
}

/// Sort buckets: null, booleans, numbers, strings, then everything else.
fn bucket(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) | Value::Object(_) => 4,
    }
}

/// Orders sort keys by bucket, then naturally within a scalar bucket.
/// Containers never reorder among themselves.
fn compare_keys(left: &Value, right: &Value) -> Ordering {
    bucket(left).cmp(&bucket(right)).then_with(|| match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b).unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    })
}
