//! A `nom`-based recursive descent parser for the query language.
//!
//! Precedence, lowest first: `|`, `or`, `and`, `in`/`not in`, `==`/`!=`,
//! `<`/`<=`/`>`/`>=`, `+`/`-`, `*`/`/`/`%`, `^`, postfix `.property`,
//! primaries. Equality, comparison, power and membership do not chain.
use crate::ast::Node;
use crate::error::{ParseError, ParseErrorKind};
use crate::normalize;
use crate::value::normalize_number;
use indexmap::IndexMap;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while_m_n},
    character::complete::{char, digit1, none_of, one_of, satisfy},
    combinator::{consumed, map, map_opt, map_res, opt, recognize, verify},
    error::ErrorKind,
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
};
use serde_json::Value;

// --- Main Public Parser ---

/// Parses query text into an AST.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    log::trace!("parsing query '{}'", source);
    let grammar = Grammar { source };
    match grammar.pipe(source) {
        Ok((rest, node)) => {
            let rest = space(rest);
            if rest.is_empty() {
                Ok(node)
            } else {
                Err(ParseError::unexpected_part(rest, Some(grammar.offset(rest))))
            }
        }
        Err(nom::Err::Error(failure) | nom::Err::Failure(failure)) => {
            Err(grammar.locate(failure))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::value_expected(source.len())),
    }
}

// --- Errors ---

/// Error carried through the combinators. `at` is the unconsumed input at
/// the point of failure, so the absolute offset can be recovered once the
/// whole source is known again.
#[derive(Debug)]
struct Failure<'s> {
    kind: ParseErrorKind,
    at: Option<&'s str>,
}

impl<'s> nom::error::ParseError<&'s str> for Failure<'s> {
    fn from_error_kind(input: &'s str, _kind: ErrorKind) -> Self {
        Failure {
            kind: ParseErrorKind::ValueExpected,
            at: Some(input),
        }
    }

    fn append(_input: &'s str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'s, T> = IResult<&'s str, T, Failure<'s>>;

fn fail<'s, T>(kind: ParseErrorKind, at: &'s str) -> PResult<'s, T> {
    Err(nom::Err::Failure(Failure { kind, at: Some(at) }))
}

fn fail_unpositioned<'s, T>(part: String) -> PResult<'s, T> {
    Err(nom::Err::Failure(Failure {
        kind: ParseErrorKind::UnexpectedPart(part),
        at: None,
    }))
}

// --- Lexical helpers ---

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn space(input: &str) -> &str {
    input.trim_start_matches(is_space)
}

/// Consumes `text` if the input starts with it.
fn symbol<'s>(input: &'s str, text: &'static str) -> Option<&'s str> {
    tag::<_, _, Failure<'s>>(text)
        .parse(input)
        .ok()
        .map(|(rest, _)| rest)
}

/// Consumes the first operator of `table` the input starts with.
fn operator<'s>(
    input: &'s str,
    table: &[(&'static str, &'static str)],
) -> Option<(&'s str, &'static str)> {
    table
        .iter()
        .find_map(|&(token, name)| symbol(input, token).map(|rest| (rest, name)))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_part))).parse(input)
}

/// A run of a string literal body: plain text or one decoded escape.
enum Fragment<'s> {
    Literal(&'s str),
    Escaped(char),
}

/// String lexing needs no positions: callers report failures at the
/// opening quote.
type LexResult<'s, T> = IResult<&'s str, T>;

/// Decodes a double-quoted string literal. Returns `None` when the literal
/// is unterminated or contains a malformed `\u` escape.
fn string_literal(input: &str) -> Option<(&str, String)> {
    let fragment = alt((
        map(is_not("\"\\"), Fragment::Literal),
        map(preceded(char('\\'), escaped_char), Fragment::Escaped),
    ));
    let body = fold_many0(fragment, String::new, |mut out, fragment| {
        match fragment {
            Fragment::Literal(text) => out.push_str(text),
            Fragment::Escaped(c) => out.push(c),
        }
        out
    });
    delimited(char('"'), body, char('"')).parse(input).ok()
}

/// The character after a backslash. Unknown escapes stand for themselves.
fn escaped_char(input: &str) -> LexResult<'_, char> {
    alt((
        preceded(char('u'), unicode_escape),
        map(none_of("u"), |c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'b' => '\u{8}',
            'f' => '\u{c}',
            other => other,
        }),
    ))
    .parse(input)
}

fn hex_quad(input: &str) -> LexResult<'_, u32> {
    map_res(take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()), |hex: &str| {
        u32::from_str_radix(hex, 16)
    })
    .parse(input)
}

/// The digits of a `\u` escape, joining a UTF-16 surrogate pair.
fn unicode_escape(input: &str) -> LexResult<'_, char> {
    let surrogate_pair = map_opt(
        (
            verify(hex_quad, |high: &u32| (0xD800..0xDC00).contains(high)),
            tag("\\u"),
            verify(hex_quad, |low: &u32| (0xDC00..0xE000).contains(low)),
        ),
        |(high, _, low)| char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)),
    );
    alt((surrogate_pair, map_opt(hex_quad, char::from_u32))).parse(input)
}

/// Slices the offending operator and its right-hand operand for chained
/// non-associative operators, e.g. `== 3` in `1 == 2 == 3`.
fn slice_operator_rhs(input: &str) -> String {
    let op_end = input.find(char::is_whitespace).unwrap_or(input.len());
    let op = &input[..op_end];
    let rhs = input[op_end..].trim_start();
    let Some(first) = rhs.chars().next() else {
        return input.to_string();
    };
    let len = if first == '"' {
        let mut escaped = false;
        rhs.char_indices()
            .skip(1)
            .find(|&(_, c)| {
                let closes = c == '"' && !escaped;
                escaped = c == '\\' && !escaped;
                closes
            })
            .map_or(rhs.len(), |(i, _)| i + 1)
    } else if is_ident_start(first) {
        rhs.find(|c: char| !is_ident_part(c)).unwrap_or(rhs.len())
    } else if first.is_ascii_digit() || first == '-' {
        1 + rhs[1..]
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')))
            .unwrap_or(rhs.len() - 1)
    } else {
        first.len_utf8()
    };
    format!("{} {}", op, &rhs[..len])
}

const EQUALITY: &[(&str, &str)] = &[("==", "eq"), ("!=", "ne")];
const COMPARISON: &[(&str, &str)] = &[("<=", "lte"), (">=", "gte"), ("<", "lt"), (">", "gt")];
const ADDITIVE: &[(&str, &str)] = &[("+", "add"), ("-", "subtract")];
const MULTIPLICATIVE: &[(&str, &str)] = &[("*", "multiply"), ("/", "divide"), ("%", "mod")];
const POWER: &[(&str, &str)] = &[("^", "pow")];

// --- Grammar ---

struct Grammar<'s> {
    source: &'s str,
}

impl<'s> Grammar<'s> {
    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    fn locate(&self, failure: Failure<'_>) -> ParseError {
        ParseError::new(failure.kind, failure.at.map(|rest| self.offset(rest)))
    }

    /// Consumes a keyword that is not glued to identifier characters on
    /// either side.
    fn keyword(&self, input: &'s str, word: &'static str) -> Option<&'s str> {
        let rest = symbol(input, word)?;
        if rest.starts_with(is_ident_part) {
            return None;
        }
        if self.source[..self.offset(input)].ends_with(is_ident_part) {
            return None;
        }
        Some(rest)
    }

    fn pipe(&self, input: &'s str) -> PResult<'s, Node> {
        let (mut input, mut node) = self.or(input)?;
        while let Some(rest) = symbol(space(input), "|") {
            let rest = space(rest);
            if rest.is_empty() {
                return fail(ParseErrorKind::ValueExpected, rest);
            }
            let (rest, stage) = self.or(rest)?;
            node = normalize::pipe(node, stage);
            input = rest;
        }
        Ok((input, node))
    }

    fn or(&self, input: &'s str) -> PResult<'s, Node> {
        let (mut input, mut node) = self.and(input)?;
        while let Some(rest) = self.keyword(space(input), "or") {
            let (rest, right) = self.and(space(rest))?;
            node = normalize::merge_variadic("or", node, right);
            input = rest;
        }
        Ok((input, node))
    }

    fn and(&self, input: &'s str) -> PResult<'s, Node> {
        let (mut input, mut node) = self.membership(input)?;
        while let Some(rest) = self.keyword(space(input), "and") {
            let (rest, right) = self.membership(space(rest))?;
            node = normalize::merge_variadic("and", node, right);
            input = rest;
        }
        Ok((input, node))
    }

    fn membership(&self, input: &'s str) -> PResult<'s, Node> {
        let (input, left) = self.equality(input)?;
        let rest = space(input);

        // `not` must be followed by whitespace and `in`; otherwise leave it
        // for the caller to report.
        if let Some(after_not) = self.keyword(rest, "not")
            && (after_not.is_empty() || after_not.starts_with(char::is_whitespace))
            && let Some(after_in) = self.keyword(space(after_not), "in")
        {
            let (input, right) = self.equality(space(after_in))?;
            return Ok((input, Node::call("not in", vec![left, right])));
        }

        if let Some(after_in) = self.keyword(rest, "in") {
            let (input, right) = self.equality(space(after_in))?;
            return Ok((input, Node::call("in", vec![left, right])));
        }
        Ok((input, left))
    }

    fn equality(&self, input: &'s str) -> PResult<'s, Node> {
        self.non_chainable(input, EQUALITY, Self::comparison)
    }

    fn comparison(&self, input: &'s str) -> PResult<'s, Node> {
        self.non_chainable(input, COMPARISON, Self::additive)
    }

    fn power(&self, input: &'s str) -> PResult<'s, Node> {
        self.non_chainable(input, POWER, Self::postfix)
    }

    fn additive(&self, input: &'s str) -> PResult<'s, Node> {
        self.left_associative(input, ADDITIVE, Self::multiplicative)
    }

    fn multiplicative(&self, input: &'s str) -> PResult<'s, Node> {
        self.left_associative(input, MULTIPLICATIVE, Self::power)
    }

    /// One optional application of a binary operator. A second operator of
    /// the same level is reported together with its right operand.
    fn non_chainable(
        &self,
        input: &'s str,
        table: &[(&'static str, &'static str)],
        operand: fn(&Self, &'s str) -> PResult<'s, Node>,
    ) -> PResult<'s, Node> {
        let (input, left) = operand(self, input)?;
        let Some((rest, name)) = operator(space(input), table) else {
            return Ok((input, left));
        };
        let (input, right) = operand(self, space(rest))?;
        let rest = space(input);
        if operator(rest, table).is_some() {
            return fail_unpositioned(slice_operator_rhs(rest));
        }
        Ok((input, Node::call(name, vec![left, right])))
    }

    fn left_associative(
        &self,
        input: &'s str,
        table: &[(&'static str, &'static str)],
        operand: fn(&Self, &'s str) -> PResult<'s, Node>,
    ) -> PResult<'s, Node> {
        let (mut input, mut node) = operand(self, input)?;
        while let Some((rest, name)) = operator(space(input), table) {
            let (rest, right) = operand(self, space(rest))?;
            node = Node::call(name, vec![node, right]);
            input = rest;
        }
        Ok((input, node))
    }

    fn postfix(&self, input: &'s str) -> PResult<'s, Node> {
        let (mut input, mut node) = self.primary(input)?;
        while let Some(rest) = symbol(space(input), ".") {
            let (rest, segment) = self.property(rest)?;
            node = normalize::property_access(node, segment);
            input = rest;
        }
        Ok((input, node))
    }

    // --- Primaries ---

    fn primary(&self, input: &'s str) -> PResult<'s, Node> {
        let input = space(input);
        let Some(first) = input.chars().next() else {
            return fail(ParseErrorKind::ValueExpected, input);
        };
        match first {
            '.' => self.get_chain(input),
            '(' => {
                let (rest, node) = self.pipe(&input[1..])?;
                let rest = space(rest);
                match symbol(rest, ")") {
                    Some(rest) => Ok((rest, node)),
                    None => fail(ParseErrorKind::CharacterExpected(')'), rest),
                }
            }
            '[' => self.array(input),
            '{' => self.object(input),
            '"' => match string_literal(input) {
                Some((rest, text)) => Ok((rest, Node::Literal(Value::String(text)))),
                None => fail(ParseErrorKind::ValueExpected, input),
            },
            '-' | '0'..='9' => self.number(input),
            c if is_ident_start(c) => {
                for (word, value) in [
                    ("true", Value::Bool(true)),
                    ("false", Value::Bool(false)),
                    ("null", Value::Null),
                ] {
                    if let Some(rest) = self.keyword(input, word) {
                        return Ok((rest, Node::Literal(value)));
                    }
                }
                let (rest, name) = identifier(input)?;
                let rest = space(rest);
                if rest.starts_with('(') {
                    self.function_call(name, rest)
                } else {
                    fail(ParseErrorKind::ValueExpected, input)
                }
            }
            _ => fail(ParseErrorKind::ValueExpected, input),
        }
    }

    /// A leading `.a.b` chain, parsed into a single multi-segment `get`.
    fn get_chain(&self, input: &'s str) -> PResult<'s, Node> {
        let (mut input, first) = self.property(&input[1..])?;
        let mut segments = vec![first];
        while let Some(rest) = symbol(space(input), ".") {
            let (rest, segment) = self.property(rest)?;
            segments.push(segment);
            input = rest;
        }
        Ok((input, Node::get(segments)))
    }

    /// The segment after a `.`: a quoted key, an array index or an identifier.
    fn property(&self, input: &'s str) -> PResult<'s, Value> {
        let Some(first) = input.chars().next() else {
            return fail(ParseErrorKind::PropertyExpected, input);
        };

        if first == '"' {
            return match string_literal(input) {
                Some((rest, key)) => Ok((rest, Value::String(key))),
                None => fail(ParseErrorKind::PropertyExpected, input),
            };
        }

        if first.is_ascii_digit() {
            if first == '0' {
                let rest = &input[1..];
                if rest.starts_with(|c: char| c.is_ascii_digit()) {
                    return fail(ParseErrorKind::UnexpectedPart(rest[..1].to_string()), rest);
                }
                return Ok((rest, Value::from(0)));
            }
            let (rest, digits) = digit1::<_, Failure<'s>>(input)?;
            if rest.starts_with(is_ident_start) {
                let (_, word) = identifier(rest)?;
                return fail(ParseErrorKind::UnexpectedPart(word.to_string()), rest);
            }
            return match digits.parse::<i64>() {
                Ok(index) => Ok((rest, Value::from(index))),
                Err(_) => fail(ParseErrorKind::UnexpectedPart(digits.to_string()), input),
            };
        }

        if is_ident_start(first) {
            let (rest, name) = identifier(input)?;
            if let Some(after_hash) = rest.strip_prefix('#') {
                let tail = after_hash
                    .find(|c: char| !is_ident_part(c))
                    .unwrap_or(after_hash.len());
                return fail_unpositioned(format!("#{}", &after_hash[..tail]));
            }
            return Ok((rest, Value::String(name.to_string())));
        }

        fail(ParseErrorKind::PropertyExpected, input)
    }

    fn number(&self, input: &'s str) -> PResult<'s, Node> {
        let parsed: PResult<'s, (&'s str, _)> = consumed((
            opt(char('-')),
            digit1,
            opt(preceded(char('.'), digit1)),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        ))
        .parse(input);
        let Ok((rest, (text, (_, _, fraction, exponent)))) = parsed else {
            return fail(ParseErrorKind::ValueExpected, input);
        };

        if fraction.is_none()
            && let Some(after_dot) = symbol(rest, ".")
        {
            return fail(ParseErrorKind::PropertyExpected, after_dot);
        }
        if exponent.is_none()
            && let Ok((_, part)) =
                recognize(pair(one_of::<_, _, Failure<'s>>("eE"), opt(one_of("+-")))).parse(rest)
        {
            return fail(ParseErrorKind::UnexpectedPart(part.to_string()), rest);
        }

        let integral = fraction.is_none() && exponent.is_none();

        let value = match text.parse::<i64>() {
            Ok(int) if integral => Some(Value::from(int)),
            _ => text.parse::<f64>().ok().and_then(normalize_number),
        };
        match value {
            Some(value) => Ok((rest, Node::Literal(value))),
            None => fail(ParseErrorKind::UnexpectedPart(text.to_string()), input),
        }
    }

    /// Arguments of `name(...)`; `input` starts at the opening parenthesis.
    fn function_call(&self, name: &str, input: &'s str) -> PResult<'s, Node> {
        let input = space(&input[1..]);
        if let Some(rest) = symbol(input, ")") {
            return Ok((rest, Node::call(name, vec![])));
        }

        let (mut input, first) = self.pipe(input)?;
        let mut args = vec![first];
        loop {
            let rest = space(input);
            if let Some(after_comma) = symbol(rest, ",") {
                let after_comma = space(after_comma);
                if after_comma.is_empty() {
                    return fail(ParseErrorKind::ValueExpected, after_comma);
                }
                let (after_arg, arg) = self.pipe(after_comma)?;
                args.push(arg);
                input = after_arg;
                continue;
            }
            if let Some(rest) = symbol(rest, ")") {
                return Ok((rest, Node::call(name, args)));
            }
            let expected = if rest.is_empty() { ')' } else { ',' };
            return fail(ParseErrorKind::CharacterExpected(expected), rest);
        }
    }

    fn array(&self, input: &'s str) -> PResult<'s, Node> {
        let mut input = space(&input[1..]);
        let mut items = Vec::new();
        if let Some(rest) = symbol(input, "]") {
            return Ok((rest, Node::call("array", items)));
        }

        loop {
            if input.starts_with(']') {
                return fail(ParseErrorKind::ValueExpected, input);
            }
            let (rest, item) = self.pipe(input)?;
            items.push(item);

            let rest = space(rest);
            if let Some(after_comma) = symbol(rest, ",") {
                input = space(after_comma);
                continue;
            }
            if let Some(rest) = symbol(rest, "]") {
                return Ok((rest, Node::call("array", items)));
            }
            let expected = if rest.is_empty() { ']' } else { ',' };
            return fail(ParseErrorKind::CharacterExpected(expected), rest);
        }
    }

    fn object(&self, input: &'s str) -> PResult<'s, Node> {
        let mut input = space(&input[1..]);
        let mut fields = IndexMap::new();
        if let Some(rest) = symbol(input, "}") {
            return Ok((rest, Node::object(fields)));
        }

        loop {
            if input.starts_with('}') {
                return fail(ParseErrorKind::KeyExpected, input);
            }
            let (rest, key) = self.object_key(input)?;

            let rest = space(rest);
            let Some(rest) = symbol(rest, ":") else {
                return fail(ParseErrorKind::CharacterExpected(':'), rest);
            };

            let rest = space(rest);
            if rest.starts_with(['}', ',']) {
                return fail(ParseErrorKind::ValueExpected, rest);
            }
            let (rest, value) = self.pipe(rest)?;
            fields.insert(key, value);

            let rest = space(rest);
            if let Some(after_comma) = symbol(rest, ",") {
                input = space(after_comma);
                continue;
            }
            if let Some(rest) = symbol(rest, "}") {
                return Ok((rest, Node::object(fields)));
            }
            let expected = if rest.is_empty() { '}' } else { ',' };
            return fail(ParseErrorKind::CharacterExpected(expected), rest);
        }
    }

    /// A quoted string, a digit run or an identifier (`null` included).
    fn object_key(&self, input: &'s str) -> PResult<'s, String> {
        match input.chars().next() {
            Some('"') => match string_literal(input) {
                Some((rest, key)) => Ok((rest, key)),
                None => fail(ParseErrorKind::ValueExpected, input),
            },
            Some(c) if c.is_ascii_digit() => {
                let (rest, digits) = digit1::<_, Failure<'s>>(input)?;
                Ok((rest, digits.to_string()))
            }
            Some(c) if is_ident_start(c) => {
                let (rest, name) = identifier(input)?;
                Ok((rest, name.to_string()))
            }
            _ => fail(ParseErrorKind::KeyExpected, input),
        }
    }
}
