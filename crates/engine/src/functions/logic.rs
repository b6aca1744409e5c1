//! Comparison and boolean logic.
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::CompiledProgram;
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use jsonquery_syntax::value::{compare_scalars, deep_equals, truthy};
use serde_json::Value;
use std::cmp::Ordering;

pub(super) fn register(registry: &mut FunctionRegistry) {
    let comparisons: [(&str, fn(&Value, &Value) -> bool); 6] = [
        ("eq", deep_equals),
        ("ne", |a, b| !deep_equals(a, b)),
        ("lt", |a, b| compare_scalars(a, b) == Some(Ordering::Less)),
        ("lte", |a, b| compare_scalars(a, b).is_some_and(Ordering::is_le)),
        ("gt", |a, b| compare_scalars(a, b) == Some(Ordering::Greater)),
        ("gte", |a, b| compare_scalars(a, b).is_some_and(Ordering::is_ge)),
    ];
    for (name, test) in comparisons {
        registry.register(
            name,
            FunctionDescriptor::new(Arity::Exact(2), move |args, compiler| {
                let (left, right) = (compiler.compile(&args[0])?, compiler.compile(&args[1])?);
                Ok(CompiledProgram::new(move |input| {
                    Ok(Value::Bool(test(&left.apply(input)?, &right.apply(input)?)))
                }))
            }),
        );
    }

    registry.register("and", FunctionDescriptor::new(Arity::AtLeast(0), compile_and));
    registry.register("or", FunctionDescriptor::new(Arity::AtLeast(0), compile_or));
    registry.register("not", FunctionDescriptor::new(Arity::Exact(1), compile_not));
    registry.register("if", FunctionDescriptor::new(Arity::Exact(3), compile_if));
    registry.register("in", FunctionDescriptor::new(Arity::Exact(2), compile_in));
    registry.register("not in", FunctionDescriptor::new(Arity::Exact(2), compile_not_in));
}

fn compile_and(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    if args.is_empty() {
        return Ok(CompiledProgram::identity());
    }
    let terms = compiler.compile_all(args)?;
    Ok(CompiledProgram::new(move |input| {
        for term in &terms {
            if !truthy(&term.apply(input)?) {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }))
}

fn compile_or(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    if args.is_empty() {
        return Ok(CompiledProgram::identity());
    }
    let terms = compiler.compile_all(args)?;
    Ok(CompiledProgram::new(move |input| {
        for term in &terms {
            if truthy(&term.apply(input)?) {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }))
}

fn compile_not(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let operand = compiler.compile(&args[0])?;
    Ok(CompiledProgram::new(move |input| {
        Ok(Value::Bool(!truthy(&operand.apply(input)?)))
    }))
}

fn compile_if(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let condition = compiler.compile(&args[0])?;
    let then = compiler.compile(&args[1])?;
    let otherwise = compiler.compile(&args[2])?;
    Ok(CompiledProgram::new(move |input| {
        if truthy(&condition.apply(input)?) {
            then.apply(input)
        } else {
            otherwise.apply(input)
        }
    }))
}

fn compile_in(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let needle = compiler.compile(&args[0])?;
    let haystack = compiler.compile(&args[1])?;
    Ok(CompiledProgram::new(move |input| {
        let value = needle.apply(input)?;
        match haystack.apply(input)? {
            Value::Null => Ok(Value::Bool(false)),
            Value::Array(items) => Ok(Value::Bool(items.iter().any(|item| deep_equals(&value, item)))),
            _ => Err(EvalError::array_expected()),
        }
    }))
}

fn compile_not_in(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let membership = compile_in(args, compiler)?;
    Ok(CompiledProgram::new(move |input| {
        Ok(Value::Bool(!truthy(&membership.apply(input)?)))
    }))
}
