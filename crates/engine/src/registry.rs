//! Defines the registry that maps function names to their compilers.
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::functions;
use crate::program::CompiledProgram;
use jsonquery_syntax::Node;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "argument" } else { "arguments" }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "{} {}", n, plural(n)),
            Arity::Range(min, max) => write!(f, "{} to {} {}", min, max, plural(max)),
            Arity::AtLeast(min) => write!(f, "at least {} {}", min, plural(min)),
        }
    }
}

/// The signature of a function compiler: it receives the unevaluated
/// argument trees and the compiler used to turn them into sub-programs.
pub type CompileFn = dyn Fn(&[Node], &Compiler) -> Result<CompiledProgram, CompileError> + Send + Sync;

/// A named function: its arity contract and how to compile a call to it.
#[derive(Clone)]
pub struct FunctionDescriptor {
    arity: Arity,
    compile: Arc<CompileFn>,
}

impl FunctionDescriptor {
    pub fn new<F>(arity: Arity, compile: F) -> Self
    where
        F: Fn(&[Node], &Compiler) -> Result<CompiledProgram, CompileError> + Send + Sync + 'static,
    {
        Self {
            arity,
            compile: Arc::new(compile),
        }
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Compiles a call. The arity has already been checked by the compiler.
    pub fn compile(&self, args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
        (self.compile)(args, compiler)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A registry to hold all functions available to the compiler.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDescriptor>,
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Creates a registry populated with all built-in functions.
    pub fn builtins() -> Self {
        let mut registry = Self::new();
        functions::register_builtins(&mut registry);
        registry
    }

    /// The built-ins with `extensions` merged over them. An extension
    /// replaces a built-in of the same name.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = (S, FunctionDescriptor)>,
        S: Into<String>,
    {
        let mut registry = Self::builtins();
        for (name, descriptor) in extensions {
            let name = name.into();
            if registry.contains(&name) {
                log::debug!("Extension function '{}' overrides the built-in", name);
            }
            registry.functions.insert(name, descriptor);
        }
        registry
    }

    /// Registers a function, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, descriptor: FunctionDescriptor) {
        self.functions.insert(name.into(), descriptor);
    }

    /// Finds a function by name. Names are case-sensitive.
    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// The registered names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtins()
    }
}
