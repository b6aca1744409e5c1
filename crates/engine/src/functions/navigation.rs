//! Navigation and structure: `get`, `pipe`, `object`, `array`, `map`,
//! `filter`, `selector`, `pick` and `exists`.
use super::literal_str;
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::{CompiledProgram, EvalResult};
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_selector::Selector;
use jsonquery_syntax::Node;
use jsonquery_syntax::value::truthy;
use serde_json::{Map, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register("get", FunctionDescriptor::new(Arity::AtLeast(0), compile_get));
    registry.register("pipe", FunctionDescriptor::new(Arity::AtLeast(0), compile_pipe));
    registry.register("object", FunctionDescriptor::new(Arity::Exact(1), compile_object));
    registry.register("array", FunctionDescriptor::new(Arity::AtLeast(0), compile_array));
    registry.register("map", FunctionDescriptor::new(Arity::Exact(1), compile_map));
    registry.register("filter", FunctionDescriptor::new(Arity::Exact(1), compile_filter));
    registry.register("selector", FunctionDescriptor::new(Arity::Exact(1), compile_selector));
    registry.register("pick", FunctionDescriptor::new(Arity::AtLeast(1), compile_pick));
    registry.register("exists", FunctionDescriptor::new(Arity::Exact(1), compile_exists));
}

// --- get ---

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(i64),
}

impl Segment {
    fn from_node(node: &Node) -> Result<Self, CompileError> {
        let segment = match node {
            Node::Literal(Value::String(key)) => Some(Segment::Key(key.clone())),
            Node::Literal(Value::Number(number)) => number
                .as_i64()
                .filter(|index| i32::try_from(*index).is_ok())
                .map(Segment::Index),
            _ => None,
        };
        segment.ok_or_else(|| {
            CompileError::invalid_argument(
                "get",
                format!("get path segment must be a string or an integer, got {}", node),
            )
        })
    }

    fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Segment::Key(key), Value::Object(fields)) => fields.get(key),
            (Segment::Index(index), Value::Array(items)) => {
                usize::try_from(*index).ok().and_then(|index| items.get(index))
            }
            _ => None,
        }
    }
}

fn compile_get(args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    if args.is_empty() {
        return Ok(CompiledProgram::identity());
    }
    let segments = args.iter().map(Segment::from_node).collect::<Result<Vec<_>, _>>()?;
    Ok(CompiledProgram::new(move |input| {
        Ok(segments
            .iter()
            .try_fold(input, |current, segment| segment.lookup(current))
            .cloned()
            .unwrap_or(Value::Null))
    }))
}

// --- pipe ---

fn compile_pipe(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let mut stages = compiler.compile_all(args)?;
    match stages.len() {
        0 => Ok(CompiledProgram::identity()),
        1 => Ok(stages.remove(0)),
        _ => Ok(CompiledProgram::new(move |input| {
            stages
                .iter()
                .try_fold(input.clone(), |current, stage| stage.apply(&current))
        })),
    }
}

// --- constructors ---

fn compile_object(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let fields = match &args[0] {
        Node::Object(fields) => fields,
        Node::Literal(value @ (Value::Null | Value::Object(_))) => {
            return Ok(CompiledProgram::constant(value.clone()));
        }
        other => {
            return Err(CompileError::invalid_argument(
                "object",
                format!("object expects a map of fields, got {}", other),
            ));
        }
    };
    let fields = fields
        .iter()
        .map(|(key, node)| Ok((key.clone(), compiler.compile(node)?)))
        .collect::<Result<Vec<_>, CompileError>>()?;
    Ok(CompiledProgram::new(move |input| {
        let mut object = Map::new();
        for (key, program) in &fields {
            object.insert(key.clone(), program.apply(input)?);
        }
        Ok(Value::Object(object))
    }))
}

fn compile_array(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let items = compiler.compile_all(args)?;
    Ok(CompiledProgram::new(move |input| {
        items
            .iter()
            .map(|item| item.apply(input))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }))
}

// --- map / filter / selector ---

fn compile_map(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let mapper = compiler.compile(&args[0])?;
    Ok(CompiledProgram::new(move |input| match input {
        Value::Array(items) => items
            .iter()
            .map(|item| mapper.apply(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }))
}

fn compile_filter(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    if literal_str(&args[0]).is_some() {
        return compile_selector(args, compiler);
    }
    let predicate = compiler.compile(&args[0])?;
    Ok(CompiledProgram::new(move |input| match input {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => {
            let mut kept = Vec::new();
            for item in items {
                if truthy(&predicate.apply(item)?) {
                    kept.push(item.clone());
                }
            }
            Ok(Value::Array(kept))
        }
        Value::Object(_) => Ok(if truthy(&predicate.apply(input)?) {
            input.clone()
        } else {
            Value::Null
        }),
        _ => Err(EvalError::array_expected()),
    }))
}

fn compile_selector(args: &[Node], _compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let text = literal_str(&args[0]).ok_or_else(|| {
        CompileError::invalid_argument("selector", "selector expects a literal selector string")
    })?;
    let selector = jsonquery_selector::compile(text)?;
    Ok(CompiledProgram::new(move |input| Ok(select(&selector, input))))
}

fn select(selector: &Selector, input: &Value) -> Value {
    match input {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| item.is_object() && selector.evaluate(item))
                .cloned()
                .collect(),
        ),
        other if selector.evaluate(other) => other.clone(),
        _ => Value::Null,
    }
}

// --- pick ---

/// A `pick` argument: either a literal path whose result is stored under
/// its last segment, or an expression yielding the name of a top-level key.
/// Paths are emitted before key names.
enum Pick {
    Path { key: String, program: CompiledProgram },
    KeyName(CompiledProgram),
}

fn compile_pick(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let mut picks = args
        .iter()
        .map(|arg| {
            let program = compiler.compile(arg)?;
            Ok(match arg.literal_path().and_then(|path| path.last().copied()) {
                Some(key) => Pick::Path {
                    key: key.to_string(),
                    program,
                },
                None => Pick::KeyName(program),
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;
    picks.sort_by_key(|pick| matches!(pick, Pick::KeyName(_)));

    Ok(CompiledProgram::new(move |input| match input {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => items
            .iter()
            .map(|item| pick_one(&picks, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(_) => pick_one(&picks, input),
        _ => Err(EvalError::object_expected()),
    }))
}

fn pick_one(picks: &[Pick], item: &Value) -> EvalResult {
    let Value::Object(source) = item else {
        return Ok(Value::Null);
    };
    let mut picked = Map::new();
    for pick in picks {
        match pick {
            Pick::Path { key, program } => {
                let value = program.apply(item)?;
                if !value.is_null() {
                    picked.insert(key.clone(), value);
                }
            }
            Pick::KeyName(program) => {
                if let Value::String(key) = program.apply(item)?
                    && let Some(value) = source.get(&key)
                {
                    picked.insert(key, value.clone());
                }
            }
        }
    }
    Ok(Value::Object(picked))
}

// --- exists ---

fn compile_exists(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    if let Some(path) = args[0].literal_path() {
        let path: Vec<String> = path.into_iter().map(str::to_string).collect();
        return Ok(CompiledProgram::new(move |input| Ok(Value::Bool(has_path(input, &path)))));
    }
    let operand = compiler.compile(&args[0])?;
    Ok(CompiledProgram::new(move |input| {
        Ok(Value::Bool(!operand.apply(input)?.is_null()))
    }))
}

/// True when every key of `path` is present; the last one may hold `null`.
fn has_path(input: &Value, path: &[String]) -> bool {
    let mut current = input;
    for key in path {
        match current.get(key.as_str()) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compile_error, run};
    use crate::error::{CompileError, EvalError};
    use serde_json::json;

    #[test]
    fn test_get_walks_objects_and_arrays() {
        let doc = json!({ "a": { "b": [10, { "c": "deep" }] } });
        assert_eq!(run(json!(["get", "a", "b", 1, "c"]), doc.clone()), Ok(json!("deep")));
        assert_eq!(run(json!(["get", "a", "b", 0]), doc.clone()), Ok(json!(10)));
        assert_eq!(run(json!(["get"]), doc.clone()), Ok(doc.clone()));
        assert_eq!(run(json!(["get", "a", "b", 5]), doc.clone()), Ok(json!(null)));
        assert_eq!(run(json!(["get", "a", "b", -1]), doc.clone()), Ok(json!(null)));
        assert_eq!(run(json!(["get", "a", 0]), doc.clone()), Ok(json!(null)));
        assert_eq!(run(json!(["get", "age"]), json!({ "name": "Chris" })), Ok(json!(null)));
        assert_eq!(run(json!(["get", "x"]), json!(null)), Ok(json!(null)));
    }

    #[test]
    fn test_get_rejects_bad_segments() {
        for query in [
            json!(["get", true]),
            json!(["get", 1.5]),
            json!(["get", 2.0]),
            json!(["get", 3_000_000_000i64]),
            json!(["get", ["get", "a"]]),
        ] {
            assert!(matches!(
                compile_error(query),
                CompileError::InvalidArgument { .. }
            ));
        }
    }

    #[test]
    fn test_pipe() {
        let doc = json!({ "a": { "b": 2 } });
        assert_eq!(run(json!(["pipe"]), doc.clone()), Ok(doc.clone()));
        assert_eq!(
            run(json!(["pipe", ["get", "a"], ["get", "b"]]), doc),
            Ok(json!(2))
        );
    }

    #[test]
    fn test_object_and_array_are_evaluated_per_input() {
        let query = json!(["array", ["object", { "n": ["get", "name"] }], ["get", "age"], 7]);
        assert_eq!(
            run(query.clone(), json!({ "name": "Ann", "age": 3 })),
            Ok(json!([{ "n": "Ann" }, 3, 7]))
        );
        assert_eq!(
            run(query, json!({ "name": "Bob" })),
            Ok(json!([{ "n": "Bob" }, null, 7]))
        );
        assert_eq!(run(json!(["object", null]), json!(1)), Ok(json!(null)));
    }

    #[test]
    fn test_map() {
        let input = json!([{ "age": 23 }, { "age": 32 }, { "age": 19 }]);
        assert_eq!(run(json!(["map", ["get", "age"]]), input), Ok(json!([23, 32, 19])));
        assert_eq!(run(json!(["map", ["get", "age"]]), json!(null)), Ok(json!(null)));
        assert_eq!(run(json!(["map", ["get", "age"]]), json!("x")), Ok(json!("x")));
    }

    #[test]
    fn test_filter_with_predicate() {
        let input = json!([{ "ok": true }, { "ok": 0 }, { "ok": [] }, { "ok": [1] }]);
        assert_eq!(
            run(json!(["filter", ["get", "ok"]]), input),
            Ok(json!([{ "ok": true }, { "ok": [1] }]))
        );
        assert_eq!(
            run(json!(["filter", ["get", "ok"]]), json!({ "ok": 1 })),
            Ok(json!({ "ok": 1 }))
        );
        assert_eq!(run(json!(["filter", ["get", "ok"]]), json!({ "ok": 0 })), Ok(json!(null)));
        assert_eq!(run(json!(["filter", ["get", "ok"]]), json!(null)), Ok(json!(null)));
        assert_eq!(
            run(json!(["filter", ["get", "ok"]]), json!(4)),
            Err(EvalError::array_expected())
        );
    }

    #[test]
    fn test_selector_and_filter_with_text() {
        let people = json!([
            { "name": "Chris", "age": 4 },
            { "name": "Pat", "age": 40 },
            "not an object"
        ]);
        assert_eq!(
            run(json!(["selector", "age < 10"]), people.clone()),
            Ok(json!([{ "name": "Chris", "age": 4 }]))
        );
        assert_eq!(
            run(json!(["filter", "age >= 10"]), people),
            Ok(json!([{ "name": "Pat", "age": 40 }]))
        );
        assert_eq!(
            run(json!(["selector", "age < 10"]), json!({ "age": 40 })),
            Ok(json!(null))
        );
    }

    #[test]
    fn test_selector_errors_are_compile_errors() {
        assert!(matches!(
            compile_error(json!(["selector", "age <"])),
            CompileError::Selector(_)
        ));
        assert!(matches!(
            compile_error(json!(["selector", ["get", "text"]])),
            CompileError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_selector_then_pick() {
        let query = json!(["pipe", ["selector", "age < 10"], ["pick", "name", "age"]]);
        assert_eq!(
            run(query.clone(), json!({ "name": "Chris", "age": 4 })),
            Ok(json!({ "name": "Chris", "age": 4 }))
        );
        assert_eq!(run(query, json!({ "name": "Pat", "age": 40 })), Ok(json!(null)));
    }

    #[test]
    fn test_pick_paths() {
        let input = json!([
            { "name": "Ann", "address": { "city": "Oslo" } },
            { "name": "Bob" },
            3
        ]);
        assert_eq!(
            run(json!(["pick", ["get", "name"], ["get", "address", "city"]]), input),
            Ok(json!([{ "name": "Ann", "city": "Oslo" }, { "name": "Bob" }, null]))
        );
        assert_eq!(
            run(json!(["pick", ["get", "name"]]), json!(true)),
            Err(EvalError::object_expected())
        );
    }

    #[test]
    fn test_pick_emits_paths_before_key_names() {
        let input = json!({ "name": "Ann", "age": 30, "city": "Oslo" });
        let picked = run(json!(["pick", "name", ["get", "age"], "city"]), input);
        let Ok(serde_json::Value::Object(fields)) = picked else {
            panic!("expected an object, got {:?}", picked);
        };
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["age", "name", "city"]);
    }

    #[test]
    fn test_exists() {
        let doc = json!({ "a": { "b": null }, "c": 1 });
        assert_eq!(run(json!(["exists", ["get", "a", "b"]]), doc.clone()), Ok(json!(true)));
        assert_eq!(run(json!(["exists", ["get", "a", "x"]]), doc.clone()), Ok(json!(false)));
        assert_eq!(run(json!(["exists", ["get", "c", "d"]]), doc.clone()), Ok(json!(false)));
        assert_eq!(
            run(json!(["exists", ["pipe", ["get", "a"], ["get", "b"]]]), doc.clone()),
            Ok(json!(false))
        );
        assert_eq!(run(json!(["exists", ["get", "c"]]), json!(null)), Ok(json!(false)));
    }
}
