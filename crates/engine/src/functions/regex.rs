//! Regular expressions: `regex(text, pattern[, flags])`,
//! `match(text, pattern[, flags])` and `matchAll(text, pattern[, flags])`.
//!
//! Flags are single letters: `i` (case-insensitive), `m` (multi-line),
//! `s` (dot matches newline) and `u` (unicode), in either case.
use super::literal_str;
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::{CompiledProgram, EvalResult};
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use regex::{Captures, Regex, RegexBuilder};
use serde_json::{Map, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(
        "regex",
        FunctionDescriptor::new(Arity::Range(2, 3), |args, compiler| {
            compile_matcher(args, compiler, |regex, text| Value::Bool(regex.is_match(text)))
        }),
    );
    registry.register(
        "match",
        FunctionDescriptor::new(Arity::Range(2, 3), |args, compiler| {
            compile_matcher(args, compiler, |regex, text| {
                regex
                    .captures(text)
                    .map_or(Value::Null, |captures| describe(regex, &captures))
            })
        }),
    );
    registry.register(
        "matchAll",
        FunctionDescriptor::new(Arity::Range(2, 3), |args, compiler| {
            compile_matcher(args, compiler, |regex, text| {
                Value::Array(
                    regex
                        .captures_iter(text)
                        .map(|captures| describe(regex, &captures))
                        .collect(),
                )
            })
        }),
    );
}

fn build_regex(pattern: &str, flags: &str) -> Result<Regex, EvalError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag.to_ascii_lowercase() {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'u' => builder.unicode(true),
            _ => return Err(EvalError::UnsupportedRegexFlag(flag)),
        };
    }
    builder.build().map_err(|e| EvalError::InvalidRegex(e.to_string()))
}

/// Where the expression comes from: fixed at compile time when both the
/// pattern and the flags are literals, otherwise computed per input.
enum Pattern {
    Fixed(Result<Regex, EvalError>),
    Computed {
        pattern: CompiledProgram,
        flags: Option<CompiledProgram>,
    },
}

impl Pattern {
    fn compile(args: &[Node], compiler: &Compiler) -> Result<Self, CompileError> {
        let flags = args.get(2);
        if let Some(pattern) = literal_str(&args[1])
            && let Some(flags) = flags.map_or(Some(""), literal_str)
        {
            return Ok(Pattern::Fixed(build_regex(pattern, flags)));
        }
        Ok(Pattern::Computed {
            pattern: compiler.compile(&args[1])?,
            flags: flags.map(|flags| compiler.compile(flags)).transpose()?,
        })
    }

    fn resolve(&self, input: &Value) -> Result<Regex, EvalError> {
        match self {
            Pattern::Fixed(regex) => regex.clone(),
            Pattern::Computed { pattern, flags } => {
                let pattern = expect_string(pattern.apply(input)?)?;
                let flags = match flags {
                    Some(flags) => expect_string(flags.apply(input)?)?,
                    None => String::new(),
                };
                build_regex(&pattern, &flags)
            }
        }
    }
}

fn expect_string(value: Value) -> Result<String, EvalError> {
    match value {
        Value::String(text) => Ok(text),
        _ => Err(EvalError::string_expected()),
    }
}

fn compile_matcher(
    args: &[Node],
    compiler: &Compiler,
    on_match: fn(&Regex, &str) -> Value,
) -> Result<CompiledProgram, CompileError> {
    let text = compiler.compile(&args[0])?;
    let pattern = Pattern::compile(args, compiler)?;
    Ok(CompiledProgram::new(move |input| -> EvalResult {
        let text = match text.apply(input)? {
            Value::Null => return Ok(Value::Null),
            other => expect_string(other)?,
        };
        let regex = pattern.resolve(input)?;
        Ok(on_match(&regex, &text))
    }))
}

/// `{ value, groups?, namedGroups? }` for one match.
fn describe(regex: &Regex, captures: &Captures<'_>) -> Value {
    let group_text = |index: usize| {
        captures
            .get(index)
            .map_or(Value::Null, |group| Value::String(group.as_str().to_string()))
    };
    let mut result = Map::new();
    result.insert("value".to_string(), group_text(0));
    if captures.len() > 1 {
        result.insert(
            "groups".to_string(),
            Value::Array((1..captures.len()).map(group_text).collect()),
        );
    }
    let named: Map<String, Value> = regex
        .capture_names()
        .enumerate()
        .filter_map(|(index, name)| Some((name?.to_string(), group_text(index))))
        .collect();
    if !named.is_empty() {
        result.insert("namedGroups".to_string(), Value::Object(named));
    }
    Value::Object(result)
}
