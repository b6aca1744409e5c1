//! Defines the Abstract Syntax Tree (AST) for query expressions and its
//! JSON "function notation" wire format.
use crate::error::AstError;
use crate::stringify::{StringifyOptions, stringify};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// A node of a parsed or decoded query.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A constant JSON value.
    Literal(Value),
    /// A call to a registered function, e.g. `sort(.age, "desc")`.
    Call { name: String, args: Vec<Node> },
    /// The field map of an object constructor. Only valid as the single
    /// argument of an `object` call.
    Object(IndexMap<String, Node>),
}

impl Node {
    pub fn literal(value: impl Into<Value>) -> Self {
        Node::Literal(value.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::Call {
            name: name.into(),
            args,
        }
    }

    /// A `get` call over the given path segments.
    pub fn get<I>(segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Node::call("get", segments.into_iter().map(Node::literal).collect())
    }

    /// An `object` constructor call with the given fields.
    pub fn object(fields: IndexMap<String, Node>) -> Self {
        Node::call("object", vec![Node::Object(fields)])
    }

    /// The function name if this node is a call.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Node::Call { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_call(&self, name: &str) -> bool {
        self.call_name() == Some(name)
    }

    /// The arguments of a call; empty for any other node.
    pub fn args(&self) -> &[Node] {
        match self {
            Node::Call { args, .. } => args,
            _ => &[],
        }
    }

    /// The string segments of a `get` call made only of literal string keys.
    pub fn literal_path(&self) -> Option<Vec<&str>> {
        match self {
            Node::Call { name, args } if name == "get" && !args.is_empty() => args
                .iter()
                .map(|arg| match arg {
                    Node::Literal(Value::String(key)) => Some(key.as_str()),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Decodes function notation: scalars are literals, arrays with a
    /// leading name are calls, and `["object", {...}]` builds an object.
    pub fn from_json(value: &Value) -> Result<Node, AstError> {
        match value {
            Value::Array(items) => {
                let (head, rest) = items.split_first().ok_or(AstError::EmptyCall)?;
                let name = head.as_str().ok_or(AstError::MissingFunctionName)?;
                if name == "object" {
                    return match rest {
                        [Value::Object(fields)] => Ok(Node::object(decode_fields(fields)?)),
                        _ => Err(AstError::ObjectNotation(Value::Array(items.clone()).to_string())),
                    };
                }
                let args = rest.iter().map(Node::from_json).collect::<Result<_, _>>()?;
                Ok(Node::call(name, args))
            }
            Value::Object(_) => Err(AstError::ObjectNotation(value.to_string())),
            scalar => Ok(Node::Literal(scalar.clone())),
        }
    }

    /// Encodes the node back into function notation.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Literal(value) => value.clone(),
            Node::Call { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().map(Node::to_json));
                Value::Array(items)
            }
            Node::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, node)| (key.clone(), node.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<IndexMap<String, Node>, AstError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), Node::from_json(value)?)))
        .collect()
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Literal(value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify(self, &StringifyOptions::default()))
    }
}
