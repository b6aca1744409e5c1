//! A `nom`-based parser for selector predicates.
use crate::ast::{CompareOp, Operand, Predicate};
use crate::error::SelectorError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{char, digit1, multispace0, none_of, satisfy},
    combinator::{all_consuming, map, not, opt, peek, recognize, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
};
use serde_json::Value;

// --- Main Public Parser ---

pub fn parse_predicate(input: &str) -> Result<Predicate, SelectorError> {
    if input.trim().is_empty() {
        return Err(SelectorError::Empty);
    }
    match all_consuming(ws(or_expr)).parse(input) {
        Ok((_, predicate)) => Ok(predicate),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(SelectorError::Syntax {
            position: input.len() - e.input.len(),
            found: e.input.chars().take(16).collect(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(SelectorError::Syntax {
            position: input.len(),
            found: String::new(),
        }),
    }
}

// --- Boolean Structure ---

fn or_expr(input: &str) -> IResult<&str, Predicate> {
    map(separated_list1(keyword("or"), and_expr), |mut terms| {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Predicate::Or(terms)
        }
    })
    .parse(input)
}

fn and_expr(input: &str) -> IResult<&str, Predicate> {
    map(separated_list1(keyword("and"), not_expr), |mut terms| {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Predicate::And(terms)
        }
    })
    .parse(input)
}

fn not_expr(input: &str) -> IResult<&str, Predicate> {
    alt((
        map(preceded(keyword("not"), not_expr), |inner| {
            Predicate::Not(Box::new(inner))
        }),
        delimited(ws(char('(')), or_expr, ws(char(')'))),
        predicate,
    ))
    .parse(input)
}

// --- Predicates ---

enum Tail {
    Compare(CompareOp, Operand),
    IsNull(bool),
    In(bool, Vec<Value>),
    Like(bool, String),
    Between(bool, Operand, Operand),
}

fn predicate(input: &str) -> IResult<&str, Predicate> {
    let (input, operand) = ws(operand).parse(input)?;
    let (input, tail) = opt(alt((
        map(pair(ws(compare_op), ws(self::operand)), |(op, right)| {
            Tail::Compare(op, right)
        }),
        map(
            delimited(keyword("is"), opt(keyword("not")), keyword("null")),
            |negated| Tail::IsNull(negated.is_some()),
        ),
        map(
            pair(
                terminated(opt(keyword("not")), keyword("in")),
                delimited(
                    ws(char('(')),
                    separated_list1(ws(char(',')), ws(literal)),
                    ws(char(')')),
                ),
            ),
            |(negated, values)| Tail::In(negated.is_some(), values),
        ),
        map(
            pair(
                terminated(opt(keyword("not")), keyword("like")),
                ws(string_literal),
            ),
            |(negated, pattern)| Tail::Like(negated.is_some(), pattern),
        ),
        map(
            (
                terminated(opt(keyword("not")), keyword("between")),
                ws(self::operand),
                preceded(keyword("and"), ws(self::operand)),
            ),
            |(negated, low, high)| Tail::Between(negated.is_some(), low, high),
        ),
    )))
    .parse(input)?;

    let predicate = match tail {
        None => Predicate::Operand(operand),
        Some(Tail::Compare(op, right)) => Predicate::Compare {
            op,
            left: operand,
            right,
        },
        Some(Tail::IsNull(negated)) => Predicate::IsNull { operand, negated },
        Some(Tail::In(negated, values)) => Predicate::In {
            operand,
            values,
            negated,
        },
        Some(Tail::Like(negated, pattern)) => Predicate::Like {
            operand,
            pattern,
            negated,
        },
        Some(Tail::Between(negated, low, high)) => Predicate::Between {
            operand,
            low,
            high,
            negated,
        },
    };
    Ok((input, predicate))
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Ne, tag("<>")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Lte, tag("<=")),
        value(CompareOp::Gte, tag(">=")),
        value(CompareOp::Eq, tag("=")),
        value(CompareOp::Lt, tag("<")),
        value(CompareOp::Gt, tag(">")),
    ))
    .parse(input)
}

// --- Operands ---

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((map(literal, Operand::Literal), map(field, Operand::Field))).parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        map(string_literal, Value::String),
        number,
        value(Value::Bool(true), word("true")),
        value(Value::Bool(false), word("false")),
        value(Value::Null, word("null")),
    ))
    .parse(input)
}

/// A single-quoted string; a doubled quote stands for one quote.
fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            many0(alt((value('\'', tag("''")), none_of("'")))),
            char('\''),
        ),
        |chars| chars.into_iter().collect(),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    ))
    .parse(input)?;
    let parsed = match text.parse::<i64>() {
        Ok(int) => Some(Value::from(int)),
        Err(_) => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
    };
    match parsed {
        Some(number) => Ok((rest, number)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn field(input: &str) -> IResult<&str, Vec<String>> {
    map(separated_list1(char('.'), identifier), |parts| {
        parts.into_iter().map(str::to_string).collect()
    })
    .parse(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_part))).parse(input)
}

// --- Combinators ---

/// A case-insensitive word that does not run into further identifier characters.
fn word<'a>(text: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag_no_case(text), not(peek(satisfy(is_ident_part))))
}

/// A keyword surrounded by optional whitespace.
fn keyword<'a>(
    text: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    ws(word(text))
}

/// A combinator that takes a parser `inner` and produces a parser that consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}
