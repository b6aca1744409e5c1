//! Conversions and string functions: `string`, `number`, `size`,
//! `substring`, `split` and `join`.
use super::{as_array, literal_str, number_result, operand_or_input};
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::CompiledProgram;
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use serde_json::Value;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register("string", FunctionDescriptor::new(Arity::Exact(1), compile_string));
    registry.register("number", FunctionDescriptor::new(Arity::Range(0, 1), compile_number));
    registry.register("size", FunctionDescriptor::new(Arity::Range(0, 1), compile_size));
    registry.register("substring", FunctionDescriptor::new(Arity::Range(1, 3), compile_substring));
    registry.register("split", FunctionDescriptor::new(Arity::Range(0, 2), compile_split));
    registry.register("join", FunctionDescriptor::new(Arity::Range(0, 1), compile_join));
}

/// The text of a scalar; `None` for `null` and containers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn compile_string(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let operand = compiler.compile(&args[0])?;
    Ok(CompiledProgram::new(move |input| {
        Ok(scalar_text(&operand.apply(input)?).map_or(Value::Null, Value::String))
    }))
}

fn compile_number(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let operand = operand_or_input(args, compiler)?;
    Ok(CompiledProgram::new(move |input| match operand.apply(input)? {
        Value::Number(number) => Ok(Value::Number(number)),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(int) = text.parse::<i64>() {
                return Ok(Value::from(int));
            }
            match text.parse::<f64>() {
                Ok(float) if float.is_finite() => number_result("number", float),
                _ => Ok(Value::Null),
            }
        }
        _ => Ok(Value::Null),
    }))
}

fn compile_size(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let operand = operand_or_input(args, compiler)?;
    Ok(CompiledProgram::new(move |input| {
        let size = match operand.apply(input)? {
            Value::Array(items) => items.len(),
            Value::Object(fields) => fields.len(),
            Value::String(text) => text.chars().count(),
            _ => 0,
        };
        Ok(Value::from(size))
    }))
}

fn compile_substring(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let (value, bounds) = match args {
        [start] => (CompiledProgram::identity(), vec![compiler.compile(start)?]),
        [value, rest @ ..] => (compiler.compile(value)?, compiler.compile_all(rest)?),
        [] => return Err(CompileError::invalid_argument("substring", "substring expects a start index")),
    };
    Ok(CompiledProgram::new(move |input| {
        let Value::String(text) = value.apply(input)? else {
            return Ok(Value::Null);
        };
        let mut indices = Vec::with_capacity(bounds.len());
        for bound in &bounds {
            match bound.apply(input)?.as_f64() {
                Some(index) => indices.push(index),
                None => return Ok(Value::Null),
            }
        }
        let length = text.chars().count();
        let clamp = |index: f64| index.clamp(0.0, length as f64) as usize;
        let start = clamp(indices[0]);
        let end = indices.get(1).map_or(length, |end| clamp(*end));
        if end <= start {
            return Ok(Value::String(String::new()));
        }
        Ok(Value::String(text.chars().skip(start).take(end - start).collect()))
    }))
}

fn compile_split(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let value = operand_or_input(args, compiler)?;
    let delimiter = match args.get(1) {
        Some(arg) => Some(compiler.compile(arg)?),
        None => None,
    };
    Ok(CompiledProgram::new(move |input| {
        let Value::String(text) = value.apply(input)? else {
            return Ok(Value::Null);
        };
        let delimiter = match &delimiter {
            None => None,
            Some(program) => match program.apply(input)? {
                Value::Null => None,
                Value::String(delimiter) => Some(delimiter),
                _ => return Err(EvalError::string_expected()),
            },
        };
        if text.is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        let parts: Vec<Value> = match delimiter.as_deref() {
            None => text.split_whitespace().map(Value::from).collect(),
            Some("") => text.chars().map(|c| Value::String(c.to_string())).collect(),
            Some(delimiter) => text.split(delimiter).map(Value::from).collect(),
        };
        Ok(Value::Array(parts))
    }))
}

fn compile_join(args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let separator = match args.first() {
        None => ",".to_string(),
        Some(arg) => literal_str(arg)
            .ok_or_else(|| CompileError::invalid_argument("join", "join separator must be a string"))?
            .to_string(),
    };
    Ok(CompiledProgram::new(move |input| {
        let Some(items) = as_array(input)? else {
            return Ok(Value::Null);
        };
        let parts: Vec<String> = items
            .iter()
            .map(|item| scalar_text(item).unwrap_or_else(|| item.to_string()))
            .collect();
        Ok(Value::String(parts.join(&separator)))
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compile_error, run};
    use crate::error::{CompileError, EvalError};
    use serde_json::{Value, json};

    fn eval(query: Value) -> Result<Value, EvalError> {
        run(query, Value::Null)
    }

    #[test]
    fn test_string_and_number() {
        assert_eq!(eval(json!(["string", 42])), Ok(json!("42")));
        assert_eq!(eval(json!(["string", 2.5])), Ok(json!("2.5")));
        assert_eq!(eval(json!(["string", true])), Ok(json!("true")));
        assert_eq!(eval(json!(["string", null])), Ok(json!(null)));
        assert_eq!(eval(json!(["string", ["array", 1]])), Ok(json!(null)));
        assert_eq!(eval(json!(["number", " 42 "])), Ok(json!(42)));
        assert_eq!(eval(json!(["number", "2.50"])), Ok(json!(2.5)));
        assert_eq!(eval(json!(["number", "1e3"])), Ok(json!(1000)));
        assert_eq!(eval(json!(["number", "abc"])), Ok(json!(null)));
        assert_eq!(run(json!(["number"]), json!("7")), Ok(json!(7)));
    }

    #[test]
    fn test_size() {
        assert_eq!(run(json!(["size"]), json!([1, 2, 3])), Ok(json!(3)));
        assert_eq!(run(json!(["size"]), json!({ "a": 1 })), Ok(json!(1)));
        assert_eq!(run(json!(["size"]), json!("héllo")), Ok(json!(5)));
        assert_eq!(run(json!(["size"]), json!(null)), Ok(json!(0)));
        assert_eq!(run(json!(["size"]), json!(12)), Ok(json!(0)));
    }

    #[test]
    fn test_substring_clamps() {
        assert_eq!(eval(json!(["substring", "hello", 1, 3])), Ok(json!("el")));
        assert_eq!(eval(json!(["substring", "hello", 3])), Ok(json!("lo")));
        assert_eq!(eval(json!(["substring", "hello", -5, 99])), Ok(json!("hello")));
        assert_eq!(eval(json!(["substring", "hello", 4, 2])), Ok(json!("")));
        assert_eq!(run(json!(["substring", 2]), json!("hello")), Ok(json!("llo")));
        assert_eq!(eval(json!(["substring", 5, 1])), Ok(json!(null)));
        assert_eq!(eval(json!(["substring", "hello", "x"])), Ok(json!(null)));
    }

    #[test]
    fn test_split() {
        assert_eq!(run(json!(["split"]), json!("  a  b\tc ")), Ok(json!(["a", "b", "c"])));
        assert_eq!(eval(json!(["split", "a,b,,c", ","])), Ok(json!(["a", "b", "", "c"])));
        assert_eq!(eval(json!(["split", "abc", ""])), Ok(json!(["a", "b", "c"])));
        assert_eq!(eval(json!(["split", "", ","])), Ok(json!([])));
        assert_eq!(eval(json!(["split", 12, ","])), Ok(json!(null)));
        assert_eq!(eval(json!(["split", "a", 1])), Err(EvalError::string_expected()));
    }

    #[test]
    fn test_join() {
        let input = json!(["a", 1, null, true, [2]]);
        assert_eq!(run(json!(["join"]), input.clone()), Ok(json!("a,1,null,true,[2]")));
        assert_eq!(run(json!(["join", " - "]), json!(["x", "y"])), Ok(json!("x - y")));
        assert_eq!(run(json!(["join"]), json!(null)), Ok(json!(null)));
        assert_eq!(run(json!(["join"]), json!("x")), Err(EvalError::array_expected()));
        assert!(matches!(
            compile_error(json!(["join", ["get", "sep"]])),
            CompileError::InvalidArgument { .. }
        ));
    }
}
