//! Array and object transforms.
use super::{array_transform, object_transform, scalar_key};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::program::CompiledProgram;
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use jsonquery_syntax::value::deep_equals;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register("keys", FunctionDescriptor::new(Arity::Exact(0), compile_keys));
    registry.register("values", FunctionDescriptor::new(Arity::Exact(0), compile_values));
    registry.register("mapKeys", FunctionDescriptor::new(Arity::Exact(1), compile_map_keys));
    registry.register("mapValues", FunctionDescriptor::new(Arity::Exact(1), compile_map_values));
    registry.register("mapObject", FunctionDescriptor::new(Arity::Exact(1), compile_map_object));
    registry.register("flatten", FunctionDescriptor::new(Arity::Exact(0), compile_flatten));
    registry.register("reverse", FunctionDescriptor::new(Arity::Exact(0), compile_reverse));
    registry.register("limit", FunctionDescriptor::new(Arity::Exact(1), compile_limit));
    registry.register("uniq", FunctionDescriptor::new(Arity::Exact(0), compile_uniq));
    registry.register("uniqBy", FunctionDescriptor::new(Arity::Exact(1), compile_uniq_by));
    registry.register("keyBy", FunctionDescriptor::new(Arity::Exact(1), compile_key_by));
    registry.register("groupBy", FunctionDescriptor::new(Arity::Exact(1), compile_group_by));
}

// --- Objects ---

fn compile_keys(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(object_transform(|fields| {
        Ok(Value::Array(fields.keys().cloned().map(Value::String).collect()))
    }))
}

fn compile_values(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(object_transform(|fields| Ok(Value::Array(fields.values().cloned().collect()))))
}

fn compile_map_keys(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let mapper = compiler.compile(&args[0])?;
    Ok(object_transform(move |fields| {
        let mut mapped = Map::new();
        for (key, value) in fields {
            if let Value::String(key) = mapper.apply(&Value::String(key.clone()))? {
                mapped.insert(key, value.clone());
            }
        }
        Ok(Value::Object(mapped))
    }))
}

fn compile_map_values(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let mapper = compiler.compile(&args[0])?;
    Ok(object_transform(move |fields| {
        let mut mapped = Map::new();
        for (key, value) in fields {
            mapped.insert(key.clone(), mapper.apply(value)?);
        }
        Ok(Value::Object(mapped))
    }))
}

/// Maps every `{ key, value }` entry; results without a string `key` are dropped.
fn compile_map_object(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let mapper = compiler.compile(&args[0])?;
    Ok(object_transform(move |fields| {
        let mut mapped = Map::new();
        for (key, value) in fields {
            let mut entry = Map::new();
            entry.insert("key".to_string(), Value::String(key.clone()));
            entry.insert("value".to_string(), value.clone());
            if let Value::Object(mut result) = mapper.apply(&Value::Object(entry))?
                && let Some(Value::String(key)) = result.remove("key")
            {
                mapped.insert(key, result.remove("value").unwrap_or(Value::Null));
            }
        }
        Ok(Value::Object(mapped))
    }))
}

// --- Arrays ---

fn compile_flatten(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(array_transform(|items| {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Array(inner) => flat.extend(inner.iter().cloned()),
                other => flat.push(other.clone()),
            }
        }
        Ok(Value::Array(flat))
    }))
}

fn compile_reverse(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(array_transform(|items| Ok(Value::Array(items.iter().rev().cloned().collect()))))
}

fn compile_limit(args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let count = match &args[0] {
        Node::Literal(Value::Number(count)) => count.as_f64().map_or(0, |count| count.max(0.0) as usize),
        other => {
            return Err(CompileError::invalid_argument(
                "limit",
                format!("limit expects a literal number, got {}", other),
            ));
        }
    };
    Ok(array_transform(move |items| {
        Ok(Value::Array(items.iter().take(count).cloned().collect()))
    }))
}

fn compile_uniq(_args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    Ok(array_transform(|items| {
        let mut unique: Vec<Value> = Vec::new();
        for item in items {
            if !unique.iter().any(|seen| deep_equals(seen, item)) {
                unique.push(item.clone());
            }
        }
        Ok(Value::Array(unique))
    }))
}

fn compile_uniq_by(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let key_of = compiler.compile(&args[0])?;
    Ok(array_transform(move |items| {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for item in items {
            if let Some(key) = scalar_key(&key_of.apply(item)?)
                && seen.insert(key)
            {
                unique.push(item.clone());
            }
        }
        Ok(Value::Array(unique))
    }))
}

/// Indexes elements by key; the first element with a given key wins.
fn compile_key_by(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let key_of = compiler.compile(&args[0])?;
    Ok(array_transform(move |items| {
        let mut keyed = Map::new();
        for item in items {
            if let Some(key) = scalar_key(&key_of.apply(item)?) {
                keyed.entry(key).or_insert_with(|| item.clone());
            }
        }
        Ok(Value::Object(keyed))
    }))
}

fn compile_group_by(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let key_of = compiler.compile(&args[0])?;
    Ok(array_transform(move |items| {
        let mut groups: Map<String, Value> = Map::new();
        for item in items {
            if let Some(key) = scalar_key(&key_of.apply(item)?)
                && let Value::Array(group) = groups.entry(key).or_insert_with(|| Value::Array(Vec::new()))
            {
                group.push(item.clone());
            }
        }
        Ok(Value::Object(groups))
    }))
}
