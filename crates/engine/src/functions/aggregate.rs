//! Aggregation over arrays of numbers: `sum`, `average`, `max` and `min`.
//! `null` elements are skipped.
use super::{array_transform, number_result};
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::CompiledProgram;
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use jsonquery_syntax::value::compare_numbers;
use serde_json::{Number, Value};
use std::cmp::Ordering;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register("sum", FunctionDescriptor::new(Arity::Exact(0), compile_sum));
    registry.register("average", FunctionDescriptor::new(Arity::Exact(0), compile_average));
    registry.register("max", FunctionDescriptor::new(Arity::Exact(0), |args, compiler| {
        compile_extreme(args, compiler, "max", Ordering::Greater)
    }));
    registry.register("min", FunctionDescriptor::new(Arity::Exact(0), |args, compiler| {
        compile_extreme(args, compiler, "min", Ordering::Less)
    }));
}

/// The non-null elements, all of which must be numbers.
fn numbers(items: &[Value]) -> Result<Vec<&Number>, EvalError> {
    items
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| match item {
            Value::Number(number) => Ok(number),
            _ => Err(EvalError::number_expected()),
        })
        .collect()
}

/// Sums exactly while every element is an integer and no overflow occurs.
fn total(numbers: &[&Number]) -> Result<Value, EvalError> {
    let exact = numbers
        .iter()
        .try_fold(0i64, |sum, number| sum.checked_add(number.as_i64()?));
    match exact {
        Some(sum) => Ok(Value::from(sum)),
        None => number_result("sum", numbers.iter().filter_map(|n| n.as_f64()).sum()),
    }
}

fn compile_sum(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(array_transform(|items| total(&numbers(items)?)))
}

fn compile_average(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(array_transform(|items| {
        let numbers = numbers(items)?;
        if numbers.is_empty() {
            return Ok(Value::Null);
        }
        let sum: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
        number_result("average", sum / numbers.len() as f64)
    }))
}

fn compile_extreme(
    _args: &[Node],
    _compiler: &Compiler,
    function: &'static str,
    wanted: Ordering,
) -> Result<CompiledProgram, CompileError> {
    Ok(array_transform(move |items| {
        let mut best: Option<&Number> = None;
        for number in numbers(items)? {
            if best.is_none_or(|current| compare_numbers(number, current) == Some(wanted)) {
                best = Some(number);
            }
        }
        match best {
            None => Ok(Value::Null),
            Some(number) => match number.as_i64() {
                Some(integer) => Ok(Value::from(integer)),
                None => number_result(function, number.as_f64().unwrap_or(f64::NAN)),
            },
        }
    }))
}
