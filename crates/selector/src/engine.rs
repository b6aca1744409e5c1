//! Evaluates selector predicates against JSON values.
use crate::ast::{CompareOp, Operand, Predicate};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluates `predicate` with `item` as the root of every field path.
///
/// A field that is missing or `null` makes comparisons and `LIKE`/`IN`/`BETWEEN`
/// tests false; only `IS NULL` observes it.
pub fn evaluate(predicate: &Predicate, item: &Value) -> bool {
    match predicate {
        Predicate::Or(terms) => terms.iter().any(|term| evaluate(term, item)),
        Predicate::And(terms) => terms.iter().all(|term| evaluate(term, item)),
        Predicate::Not(inner) => !evaluate(inner, item),
        Predicate::Compare { op, left, right } => {
            let (left, right) = (resolve(left, item), resolve(right, item));
            compare(&left, &right).is_some_and(|ordering| match op {
                CompareOp::Eq => ordering == Ordering::Equal,
                CompareOp::Ne => ordering != Ordering::Equal,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Lte => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Gte => ordering != Ordering::Less,
            })
        }
        Predicate::IsNull { operand, negated } => resolve(operand, item).is_null() != *negated,
        Predicate::In {
            operand,
            values,
            negated,
        } => {
            let value = resolve(operand, item);
            if value.is_null() {
                return false;
            }
            let found = values
                .iter()
                .any(|candidate| compare(&value, candidate) == Some(Ordering::Equal));
            found != *negated
        }
        Predicate::Like {
            operand,
            pattern,
            negated,
        } => match resolve(operand, item) {
            Value::String(text) => like(&text, pattern) != *negated,
            _ => false,
        },
        Predicate::Between {
            operand,
            low,
            high,
            negated,
        } => {
            let value = resolve(operand, item);
            let above = compare(&value, &resolve(low, item)).map(|o| o != Ordering::Less);
            let below = compare(&value, &resolve(high, item)).map(|o| o != Ordering::Greater);
            match (above, below) {
                (Some(above), Some(below)) => (above && below) != *negated,
                _ => false,
            }
        }
        Predicate::Operand(operand) => resolve(operand, item) == Value::Bool(true),
    }
}

fn resolve(operand: &Operand, item: &Value) -> Value {
    match operand {
        Operand::Literal(value) => value.clone(),
        Operand::Field(path) => path
            .iter()
            .try_fold(item, |current, key| current.get(key))
            .cloned()
            .unwrap_or(Value::Null),
    }
}

/// Orders two non-null scalars of the same kind.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// SQL `LIKE` matching: `%` matches any run of characters, `_` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    // reachable[i]: the pattern prefix consumed so far matches text[..i]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for symbol in pattern {
        let mut next = vec![false; text.len() + 1];
        match symbol {
            '%' => {
                let mut seen = false;
                for (i, slot) in next.iter_mut().enumerate() {
                    seen |= reachable[i];
                    *slot = seen;
                }
            }
            _ => {
                for i in 0..text.len() {
                    if reachable[i] && (symbol == '_' || text[i] == symbol) {
                        next[i + 1] = true;
                    }
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_predicate;
    use serde_json::json;

    fn matches(selector: &str, item: &Value) -> bool {
        evaluate(&parse_predicate(selector).unwrap(), item)
    }

    #[test]
    fn test_nested_field_comparison() {
        let alaska = json!({ "address": { "state": "Alaska" }, "age": 7 });
        let texas = json!({ "address": { "state": "Texas" }, "age": 40 });
        assert!(matches("address.state = 'Alaska'", &alaska));
        assert!(!matches("address.state = 'Alaska'", &texas));
        assert!(matches("age < 10", &alaska));
        assert!(!matches("age < 10", &texas));
        assert!(matches("age >= 7.0", &alaska));
    }

    #[test]
    fn test_missing_fields_and_null() {
        let item = json!({ "name": null });
        assert!(!matches("age < 10", &item));
        assert!(!matches("age <> 10", &item));
        assert!(matches("name IS NULL", &item));
        assert!(matches("age is null", &item));
        assert!(!matches("name IS NOT NULL", &item));
        assert!(!matches("age NOT IN (1, 2)", &item));
    }

    #[test]
    fn test_mismatched_kinds_never_match() {
        let item = json!({ "age": "10" });
        assert!(!matches("age = 10", &item));
        assert!(!matches("age <> 10", &item));
    }

    #[test]
    fn test_like_in_between() {
        let item = json!({ "name": "Joe", "age": 30, "active": true });
        assert!(matches("name LIKE 'J%'", &item));
        assert!(matches("name LIKE '_o_'", &item));
        assert!(!matches("name LIKE 'J_'", &item));
        assert!(matches("name NOT LIKE '%x%'", &item));
        assert!(matches("name IN ('Ann', 'Joe')", &item));
        assert!(matches("age BETWEEN 18 AND 65", &item));
        assert!(matches("age NOT BETWEEN 31 AND 65", &item));
        assert!(matches("active", &item));
        assert!(matches("active AND (age > 50 OR name = 'Joe')", &item));
        assert!(!matches("NOT active", &item));
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like("", "%"));
        assert!(like("abc", "%c"));
        assert!(like("abc", "a%c"));
        assert!(!like("abc", "a%b"));
        assert!(like("a%c", "a%%c"));
        assert!(!like("", "_"));
    }
}
