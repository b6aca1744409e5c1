//! Defines the AST for selector predicates.
use serde_json::Value;

/// A boolean predicate over a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare {
        op: CompareOp,
        left: Operand,
        right: Operand,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
    In {
        operand: Operand,
        values: Vec<Value>,
        negated: bool,
    },
    Like {
        operand: Operand,
        pattern: String,
        negated: bool,
    },
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
        negated: bool,
    },
    /// A bare operand, true only when it resolves to `true`.
    Operand(Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A value inside a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal such as `'Alaska'`, `10` or `TRUE`.
    Literal(Value),
    /// A dotted field path such as `address.state`.
    Field(Vec<String>),
}
