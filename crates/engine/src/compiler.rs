//! Turns query ASTs into executable programs.
use crate::error::CompileError;
use crate::program::CompiledProgram;
use crate::registry::FunctionRegistry;
use jsonquery_syntax::{AstError, Node};
use serde_json::Value;

/// Compiles AST nodes against a function registry.
///
/// Every argument of a call is compiled against the same registry, so an
/// extension function is visible at any depth of the query.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    registry: FunctionRegistry,
}

impl Compiler {
    /// A compiler over the built-in functions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn compile(&self, node: &Node) -> Result<CompiledProgram, CompileError> {
        match node {
            Node::Literal(value) => Ok(CompiledProgram::constant(value.clone())),
            Node::Call { name, args } => {
                let descriptor = self
                    .registry
                    .get(name)
                    .ok_or_else(|| CompileError::UnknownFunction(name.clone()))?;
                if !descriptor.arity().accepts(args.len()) {
                    return Err(CompileError::Arity {
                        function: name.clone(),
                        expected: descriptor.arity(),
                    });
                }
                log::debug!("Compiling function '{}' with {} argument(s)", name, args.len());
                descriptor.compile(args, self)
            }
            Node::Object(_) => Err(AstError::ObjectNotation(node.to_json().to_string()).into()),
        }
    }

    /// Compiles each node in order.
    pub fn compile_all(&self, nodes: &[Node]) -> Result<Vec<CompiledProgram>, CompileError> {
        nodes.iter().map(|node| self.compile(node)).collect()
    }

    /// Decodes function notation and compiles it.
    pub fn compile_json(&self, query: &Value) -> Result<CompiledProgram, CompileError> {
        self.compile(&Node::from_json(query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literals_are_constant() {
        let compiler = Compiler::new();
        for literal in [json!(null), json!(3), json!("x"), json!([1, 2]), json!({ "a": 1 })] {
            let program = compiler.compile(&Node::Literal(literal.clone())).unwrap();
            assert_eq!(program.apply(&json!({ "ignored": true })), Ok(literal));
        }
    }

    #[test]
    fn test_unknown_function() {
        let err = Compiler::new().compile_json(&json!(["nope", 1])).unwrap_err();
        assert_eq!(err, CompileError::UnknownFunction("nope".into()));
    }

    #[test]
    fn test_unknown_function_in_nested_argument() {
        let err = Compiler::new()
            .compile_json(&json!(["map", ["pipe", ["nope"]]]))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownFunction("nope".into()));
    }

    #[test]
    fn test_arity_is_checked_at_compile_time() {
        let err = Compiler::new().compile_json(&json!(["not", 1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "not expects 1 argument");
    }

    #[test]
    fn test_bare_object_is_rejected() {
        let err = Compiler::new().compile_json(&json!({ "a": 1 })).unwrap_err();
        assert!(matches!(err, CompileError::InvalidQuery(AstError::ObjectNotation(_))));
    }
}
