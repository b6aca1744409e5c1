//! Renders an AST back into query text.
//!
//! The output re-parses into the same AST: operator children are wrapped in
//! parentheses exactly where precedence or associativity requires it, and
//! long expressions are broken over several lines.
use crate::ast::Node;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Layout options for [`stringify`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringifyOptions {
    /// One level of indentation. Defaults to two spaces.
    pub indentation: String,
    /// Single-line renderings longer than this are broken up.
    ///
    /// Defaults to `40`.
    pub max_line_length: usize,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        Self {
            indentation: "  ".to_string(),
            max_line_length: 40,
        }
    }
}

/// Renders `node` as query text.
pub fn stringify(node: &Node, options: &StringifyOptions) -> String {
    Printer { options }.expr(node, Context::Top, 0)
}

// --- Operator table ---

const OR: u8 = 2;
const AND: u8 = 3;
const MEMBERSHIP: u8 = 4;
const EQUALITY: u8 = 5;
const COMPARISON: u8 = 6;
const ADDITIVE: u8 = 7;
const MULTIPLICATIVE: u8 = 8;
const POWER: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Associativity {
    Left,
    Variadic,
    None,
}

struct Operator {
    token: &'static str,
    precedence: u8,
    associativity: Associativity,
}

fn operator(name: &str) -> Option<Operator> {
    use Associativity::*;
    let (token, precedence, associativity) = match name {
        "or" => ("or", OR, Variadic),
        "and" => ("and", AND, Variadic),
        "in" => ("in", MEMBERSHIP, None),
        "not in" => ("not in", MEMBERSHIP, None),
        "eq" => ("==", EQUALITY, None),
        "ne" => ("!=", EQUALITY, None),
        "lt" => ("<", COMPARISON, None),
        "lte" => ("<=", COMPARISON, None),
        "gt" => (">", COMPARISON, None),
        "gte" => (">=", COMPARISON, None),
        "add" => ("+", ADDITIVE, Left),
        "subtract" => ("-", ADDITIVE, Left),
        "multiply" => ("*", MULTIPLICATIVE, Left),
        "divide" => ("/", MULTIPLICATIVE, Left),
        "mod" => ("%", MULTIPLICATIVE, Left),
        "pow" => ("^", POWER, None),
        _ => return Option::None,
    };
    Some(Operator {
        token,
        precedence,
        associativity,
    })
}

/// The operator a call renders as, if it renders infix at all. Binary
/// operators need exactly two operands, `and`/`or` at least two.
fn infix(name: &str, args: &[Node]) -> Option<Operator> {
    let op = operator(name)?;
    let arity_fits = match op.associativity {
        Associativity::Variadic => args.len() >= 2,
        _ => args.len() == 2,
    };
    arity_fits.then_some(op)
}

// --- Lexical helpers ---

fn is_plain_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn key(text: &str) -> String {
    if is_plain_identifier(text) {
        text.to_string()
    } else {
        quote(text)
    }
}

fn is_object_constructor(node: &Node) -> bool {
    matches!(node.args(), [Node::Object(_)]) && node.is_call("object")
}

// --- Printer ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Top,
    PipeStage,
    Nested,
}

struct Printer<'o> {
    options: &'o StringifyOptions,
}

impl Printer<'_> {
    fn indent(&self, level: usize) -> String {
        self.options.indentation.repeat(level)
    }

    fn fits(&self, line: &str) -> bool {
        !line.contains('\n') && line.chars().count() <= self.options.max_line_length
    }

    fn expr(&self, node: &Node, ctx: Context, level: usize) -> String {
        match node {
            Node::Literal(value) => literal(value),
            Node::Object(fields) => self.object(fields, ctx, level),
            Node::Call { name, args } => match name.as_str() {
                "get" => get_path(args).unwrap_or_else(|| self.call(name, args, level)),
                "pipe" if !args.is_empty() => self.pipe(args, level),
                "array" => self.array(args, ctx, level),
                "object" => match args.as_slice() {
                    [Node::Object(fields)] => self.object(fields, ctx, level),
                    _ => self.call(name, args, level),
                },
                _ => match infix(name, args) {
                    Some(op) => self.operation(&op, name, args, level),
                    None => self.call(name, args, level),
                },
            },
        }
    }

    fn operation(&self, op: &Operator, name: &str, args: &[Node], level: usize) -> String {
        let separator = format!(" {} ", op.token);
        args.iter()
            .enumerate()
            .map(|(index, arg)| {
                let rendered = self.expr(arg, Context::Nested, level);
                if needs_parentheses(op, name, arg, index) {
                    format!("({})", rendered)
                } else {
                    rendered
                }
            })
            .collect::<Vec<_>>()
            .join(&separator)
    }

    fn pipe(&self, stages: &[Node], level: usize) -> String {
        if let [stage] = stages {
            return self.expr(stage, Context::PipeStage, level);
        }

        if stages.len() <= 3 && !stages.iter().any(is_object_constructor) {
            let line = stages
                .iter()
                .map(|stage| self.expr(stage, Context::PipeStage, level))
                .collect::<Vec<_>>()
                .join(" | ");
            if self.fits(&line) {
                return line;
            }
        }

        let mut out = self.expr(&stages[0], Context::PipeStage, level);
        let indent = self.indent(level + 1);
        for stage in &stages[1..] {
            out.push('\n');
            out.push_str(&indent);
            out.push_str("| ");
            out.push_str(&self.expr(stage, Context::PipeStage, level + 1));
        }
        out
    }

    fn array(&self, items: &[Node], ctx: Context, level: usize) -> String {
        if items.is_empty() {
            return "[]".to_string();
        }

        if ctx != Context::PipeStage {
            let line = format!(
                "[{}]",
                items
                    .iter()
                    .map(|item| self.expr(item, Context::Nested, level))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if self.fits(&line) {
                return line;
            }
        }

        let indent = self.indent(level + 1);
        let body = items
            .iter()
            .map(|item| format!("{}{}", indent, self.expr(item, Context::Nested, level + 1)))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("[\n{}\n{}]", body, self.indent(level))
    }

    fn object(&self, fields: &IndexMap<String, Node>, ctx: Context, level: usize) -> String {
        if fields.is_empty() {
            return "{}".to_string();
        }

        let multiline =
            ctx == Context::PipeStage || fields.values().any(|value| value.is_call("pipe"));
        if !multiline {
            let line = format!(
                "{{ {} }}",
                fields
                    .iter()
                    .map(|(name, value)| {
                        format!("{}: {}", key(name), self.expr(value, Context::Nested, level))
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if self.fits(&line) {
                return line;
            }
        }

        let indent = self.indent(level + 1);
        let body = fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}{}: {}",
                    indent,
                    key(name),
                    self.expr(value, Context::Nested, level + 1)
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{{\n{}\n{}}}", body, self.indent(level))
    }

    fn call(&self, name: &str, args: &[Node], level: usize) -> String {
        if args.is_empty() {
            return format!("{}()", name);
        }

        // A lone object argument opens right after the parenthesis: `map({ ... })`.
        if let [Node::Call { args: fields, .. }] = args
            && let [Node::Object(fields)] = fields.as_slice()
            && args[0].is_call("object")
        {
            return format!("{}({})", name, self.object(fields, Context::Nested, level));
        }

        let line = format!(
            "{}({})",
            name,
            args.iter()
                .map(|arg| self.expr(arg, Context::Nested, level))
                .collect::<Vec<_>>()
                .join(", ")
        );
        if self.fits(&line) {
            return line;
        }

        let indent = self.indent(level + 1);
        let body = args
            .iter()
            .map(|arg| format!("{}{}", indent, self.expr(arg, Context::Nested, level + 1)))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{}(\n{}\n{})", name, body, self.indent(level))
    }
}

/// Whether operand `index` of an infix operator must be parenthesized to
/// keep its place in the tree when re-parsed.
fn needs_parentheses(parent: &Operator, parent_name: &str, child: &Node, index: usize) -> bool {
    let Node::Call { name, args } = child else {
        return false;
    };
    if name == "pipe" {
        return true;
    }
    let Some(child_op) = infix(name, args) else {
        return false;
    };
    if child_op.precedence != parent.precedence {
        return child_op.precedence < parent.precedence;
    }
    match parent.associativity {
        Associativity::None => true,
        Associativity::Left => index > 0,
        Associativity::Variadic => index > 0 || name == parent_name,
    }
}

/// A dotted path such as `.a."b c".2`, or `None` when some segment cannot be
/// written as a property.
fn get_path(segments: &[Node]) -> Option<String> {
    if segments.is_empty() {
        return None;
    }
    segments
        .iter()
        .map(|segment| match segment {
            Node::Literal(Value::String(name)) => Some(format!(".{}", key(name))),
            Node::Literal(Value::Number(n)) => n.as_u64().map(|index| format!(".{}", index)),
            _ => None,
        })
        .collect()
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(text) => quote(text),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => format!(
            "{{ {} }}",
            map.iter()
                .map(|(name, value)| format!("{}: {}", key(name), literal(value)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        scalar => scalar.to_string(),
    }
}
