mod common;

use common::{init_logger, run_json, run_text};
use jsonquery::{
    Arity, CompileError, EvalError, JsonQuery, JsonQueryError, ParseErrorKind, parse,
};
use serde_json::json;

fn parse_error(text: &str) -> (ParseErrorKind, Option<usize>) {
    init_logger();
    match parse(text) {
        Ok(node) => panic!("expected {:?} to fail, got {}", text, node.to_json()),
        Err(err) => (err.kind, err.position),
    }
}

fn compile_error(text: &str) -> CompileError {
    init_logger();
    match JsonQuery::parse(text) {
        Err(JsonQueryError::Compile(err)) => err,
        Err(other) => panic!("expected a compile error for {:?}, got {}", text, other),
        Ok(_) => panic!("expected {:?} to fail compilation", text),
    }
}

#[test]
fn test_parse_errors_carry_positions() {
    assert_eq!(parse_error(".friends | "), (ParseErrorKind::ValueExpected, Some(11)));
    assert_eq!(
        parse_error(".friends | sort(.age"),
        (ParseErrorKind::CharacterExpected(')'), Some(20))
    );
    assert_eq!(
        parse_error("pick(.name \"age\")"),
        (ParseErrorKind::CharacterExpected(','), Some(11))
    );
    assert_eq!(parse_error("{name: .n,}"), (ParseErrorKind::KeyExpected, Some(10)));
    assert_eq!(parse_error(".a | . b"), (ParseErrorKind::PropertyExpected, Some(6)));
    assert_eq!(
        parse_error(".a ]"),
        (ParseErrorKind::UnexpectedPart("]".into()), Some(3))
    );
}

#[test]
fn test_parse_error_messages() {
    let message = |text: &str| match parse(text) {
        Ok(_) => panic!("expected {:?} to fail", text),
        Err(err) => err.to_string(),
    };
    assert_eq!(message("sort(.age"), "Character ')' expected (pos: 9)");
    assert_eq!(message("[1 2]"), "Character ',' expected (pos: 3)");
    assert_eq!(message(".a == 1 == 2"), "Unexpected part '== 2'");
    assert_eq!(message("2 ^ 3 ^ 4"), "Unexpected part '^ 4'");
    assert_eq!(message(".foo#bar"), "Unexpected part '#bar'");
}

#[test]
fn test_compile_errors() {
    assert_eq!(
        compile_error(".a | nope(1)"),
        CompileError::UnknownFunction("nope".into())
    );
    assert_eq!(
        compile_error("map(Sort())").to_string(),
        "Unknown function \"Sort\""
    );
    assert_eq!(
        compile_error("sort(.a, \"desc\", 3)"),
        CompileError::Arity {
            function: "sort".into(),
            expected: Arity::Range(0, 2),
        }
    );
    assert_eq!(compile_error("if(.a, 1)").to_string(), "if expects 3 arguments");
    assert_eq!(compile_error("map()").to_string(), "map expects 1 argument");
    assert!(matches!(
        compile_error("filter(\"age >\")"),
        CompileError::Selector(_)
    ));
    assert!(matches!(
        compile_error("limit(.n)"),
        CompileError::InvalidArgument { .. }
    ));
}

#[test]
fn test_function_notation_errors() {
    let error = |query| match JsonQuery::from_json(&query) {
        Ok(_) => panic!("expected {} to be rejected", query),
        Err(err) => err.to_string(),
    };
    assert_eq!(error(json!([])), "Query array cannot be empty");
    assert_eq!(
        error(json!([1, 2])),
        "First element of query array must be a function name string"
    );
    assert_eq!(
        error(json!({ "a": 1 })),
        "Function notation [\"object\", {...}] expected but got {\"a\":1}"
    );
    assert_eq!(
        error(json!(["object", 1])),
        "Function notation [\"object\", {...}] expected but got [\"object\",1]"
    );
    assert_eq!(error(json!(["pipe", ["get", "a"], ["nope"]])), "Unknown function \"nope\"");
}

#[test]
fn test_evaluation_errors() {
    let eval_error = |text: &str, data| match run_text(text, &data) {
        Err(JsonQueryError::Eval(err)) => err,
        other => panic!("expected an evaluation error for {:?}, got {:?}", text, other),
    };
    assert_eq!(eval_error("keys()", json!([1])), EvalError::object_expected());
    assert_eq!(eval_error("filter(.a)", json!("text")), EvalError::array_expected());
    assert_eq!(eval_error(".a % 0", json!({ "a": 3 })), EvalError::DivisionByZero);
    assert_eq!(eval_error("sum()", json!([1, "2"])), EvalError::number_expected());
    assert_eq!(
        eval_error("match(.s, \"a\", \"g\")", json!({ "s": "a" })),
        EvalError::UnsupportedRegexFlag('g')
    );
    assert!(matches!(
        eval_error("regex(.s, .p)", json!({ "s": "a", "p": "(" })),
        EvalError::InvalidRegex(_)
    ));
    assert_eq!(
        eval_error("1e308 * 10", json!(null)),
        EvalError::NonFinite("multiply")
    );
}

#[test]
fn test_errors_are_not_raised_for_missing_data() {
    let data = json!({ "items": [{ "name": "a" }, {}] });
    assert_eq!(run_text(".items | map(.price * 2)", &data), Ok(json!([null, null])));
    assert_eq!(run_text(".items | sort(.price)", &data), Ok(data["items"].clone()));
    assert_eq!(run_json(&json!(["get", "items", 5, "name"]), &data), Ok(json!(null)));
}
