//! Structural rewrites applied while the parser builds pipes, property
//! accesses and variadic operators.
//!
//! Every function takes its operands by value and returns a new node; no
//! caller-visible tree is modified in place.
use crate::ast::Node;
use serde_json::Value;

/// Splits a node into pipe stages. A `pipe` call contributes its stages,
/// anything else is a single stage.
pub fn into_stages(node: Node) -> Vec<Node> {
    match node {
        Node::Call { name, args } if name == "pipe" => args,
        other => vec![other],
    }
}

/// Joins two expressions with an explicit `|`, flattening nested pipes on
/// either side.
pub fn pipe(left: Node, right: Node) -> Node {
    let mut stages = into_stages(left);
    stages.extend(into_stages(right));
    Node::call("pipe", stages)
}

/// Applies a `.segment` suffix to `base`.
///
/// The suffix becomes a `get` stage of an implicit pipe; when the last stage
/// already is a `get`, the segment is appended to it instead. A pipe left
/// with one stage collapses into that stage.
pub fn property_access(base: Node, segment: Value) -> Node {
    let mut stages = into_stages(base);
    let extends_get = stages.last().is_some_and(|stage| stage.is_call("get"));
    if extends_get && let Some(Node::Call { args, .. }) = stages.last_mut() {
        args.push(Node::Literal(segment));
    } else {
        stages.push(Node::get([segment]));
    }
    if stages.len() == 1
        && let Some(stage) = stages.pop()
    {
        return stage;
    }
    Node::call("pipe", stages)
}

/// Combines two operands of a variadic operator (`and`, `or`), appending to
/// the left operand when it already is a call of the same operator.
pub fn merge_variadic(name: &str, left: Node, right: Node) -> Node {
    match left {
        Node::Call {
            name: left_name,
            mut args,
        } if left_name == name => {
            args.push(right);
            Node::call(left_name, args)
        }
        other => Node::call(name, vec![other, right]),
    }
}
