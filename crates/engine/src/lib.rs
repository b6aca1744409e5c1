//! Compiler and function library for JSON queries.
//!
//! A [`Compiler`] walks a query [`Node`](jsonquery_syntax::Node) and asks
//! each called function to compile its own arguments. The result is a
//! [`CompiledProgram`]: a pure `Value -> Value` transformation that can be
//! applied to many documents, concurrently if needed.
//!
//! # Example
//!
//! ```
//! use jsonquery_engine::Compiler;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let program = Compiler::new().compile_json(&json!(["map", ["get", "age"]]))?;
//! assert_eq!(program.apply(&json!([{ "age": 23 }, { "age": 32 }]))?, json!([23, 32]));
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod error;
mod functions;
pub mod program;
pub mod registry;

// --- Public API ---
pub use compiler::Compiler;
pub use error::{CompileError, EvalError};
pub use program::{CompiledProgram, EvalResult};
pub use registry::{Arity, CompileFn, FunctionDescriptor, FunctionRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use jsonquery_syntax::parse;
    use serde_json::json;

    #[test]
    fn test_compile_parsed_query() {
        let node = parse(".friends | filter(.city == \"New York\") | sort(.age) | pick(.name, .age)").unwrap();
        let program = Compiler::new().compile(&node).unwrap();
        let data = json!({
            "friends": [
                { "name": "Chris", "age": 23, "city": "New York" },
                { "name": "Emily", "age": 19, "city": "Atlanta" },
                { "name": "Joe", "age": 16, "city": "New York" }
            ]
        });
        assert_eq!(
            program.apply(&data),
            Ok(json!([{ "name": "Joe", "age": 16 }, { "name": "Chris", "age": 23 }]))
        );
    }

    #[test]
    fn test_custom_function() {
        let double = FunctionDescriptor::new(Arity::Exact(1), |args, compiler| {
            let operand = compiler.compile(&args[0])?;
            Ok(CompiledProgram::new(move |input| match operand.apply(input)? {
                serde_json::Value::Number(n) => Ok(json!(n.as_f64().unwrap_or(0.0) * 2.0)),
                _ => Err(EvalError::number_expected()),
            }))
        });
        let compiler = Compiler::with_registry(FunctionRegistry::with_extensions([("double", double)]));
        let program = compiler.compile_json(&json!(["map", ["double", ["get", "n"]]])).unwrap();
        assert_eq!(program.apply(&json!([{ "n": 2 }, { "n": 0.5 }])), Ok(json!([4.0, 1.0])));
    }
}
