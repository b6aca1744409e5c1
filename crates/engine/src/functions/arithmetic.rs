//! Arithmetic: `add`, `subtract`, `multiply`, `divide`, `mod`, `pow`, `abs`
//! and `round`.
//!
//! Integer operands stay integers while the result fits an `i64`; anything
//! else is computed in `f64` and normalized back.
use super::{number_result, operand_or_input};
use crate::compiler::Compiler;
use crate::error::{CompileError, EvalError};
use crate::program::{CompiledProgram, EvalResult};
use crate::registry::{Arity, FunctionDescriptor, FunctionRegistry};
use jsonquery_syntax::Node;
use serde_json::{Number, Value};

type BinaryOp = fn(&Number, &Number) -> EvalResult;

pub(super) fn register(registry: &mut FunctionRegistry) {
    let operators: [(&str, BinaryOp); 6] = [
        ("add", add),
        ("subtract", subtract),
        ("multiply", multiply),
        ("divide", divide),
        ("mod", modulo),
        ("pow", pow),
    ];
    for (name, op) in operators {
        registry.register(
            name,
            FunctionDescriptor::new(Arity::Exact(2), move |args, compiler| {
                let (left, right) = (compiler.compile(&args[0])?, compiler.compile(&args[1])?);
                Ok(CompiledProgram::new(move |input| {
                    match (left.apply(input)?, right.apply(input)?) {
                        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
                        (Value::Number(a), Value::Number(b)) => op(&a, &b),
                        _ => Err(EvalError::number_expected()),
                    }
                }))
            }),
        );
    }
    registry.register("abs", FunctionDescriptor::new(Arity::Range(0, 1), compile_abs));
    registry.register("round", FunctionDescriptor::new(Arity::Range(1, 2), compile_round));
}

fn float(number: &Number) -> f64 {
    number.as_f64().unwrap_or(f64::NAN)
}

/// Runs `exact` when both operands are integers, falling back to `approx`
/// for floats and for integer overflow.
fn integer_or_float(
    function: &'static str,
    a: &Number,
    b: &Number,
    exact: fn(i64, i64) -> Option<i64>,
    approx: fn(f64, f64) -> f64,
) -> EvalResult {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64())
        && let Some(result) = exact(x, y)
    {
        return Ok(Value::from(result));
    }
    number_result(function, approx(float(a), float(b)))
}

fn add(a: &Number, b: &Number) -> EvalResult {
    integer_or_float("add", a, b, i64::checked_add, |x, y| x + y)
}

fn subtract(a: &Number, b: &Number) -> EvalResult {
    integer_or_float("subtract", a, b, i64::checked_sub, |x, y| x - y)
}

fn multiply(a: &Number, b: &Number) -> EvalResult {
    integer_or_float("multiply", a, b, i64::checked_mul, |x, y| x * y)
}

fn divide(a: &Number, b: &Number) -> EvalResult {
    if float(b) == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    number_result("divide", float(a) / float(b))
}

fn modulo(a: &Number, b: &Number) -> EvalResult {
    if float(b) == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    integer_or_float("mod", a, b, i64::checked_rem, |x, y| x % y)
}

fn pow(a: &Number, b: &Number) -> EvalResult {
    integer_or_float(
        "pow",
        a,
        b,
        |x, y| u32::try_from(y).ok().and_then(|y| x.checked_pow(y)),
        f64::powf,
    )
}

fn compile_abs(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let operand = operand_or_input(args, compiler)?;
    Ok(CompiledProgram::new(move |input| match operand.apply(input)? {
        Value::Number(number) => match number.as_i64().and_then(i64::checked_abs) {
            Some(exact) => Ok(Value::from(exact)),
            None => number_result("abs", float(&number).abs()),
        },
        _ => Ok(Value::Null),
    }))
}

fn compile_round(args: &[Node], compiler: &Compiler) -> Result<CompiledProgram, CompileError> {
    let value = compiler.compile(&args[0])?;
    let digits = match args.get(1) {
        Some(arg) => Some(compiler.compile(arg)?),
        None => None,
    };
    Ok(CompiledProgram::new(move |input| {
        let number = match value.apply(input)? {
            Value::Null => return Ok(Value::Null),
            Value::Number(number) => number,
            _ => return Err(EvalError::number_expected()),
        };
        let digits = match &digits {
            None => 0,
            Some(program) => match program.apply(input)? {
                Value::Null => 0,
                Value::Number(digits) => digits.as_i64().unwrap_or(float(&digits) as i64),
                _ => return Err(EvalError::number_expected()),
            },
        };
        if number.is_i64() && digits >= 0 {
            return Ok(Value::Number(number));
        }
        number_result("round", round_half_up(float(&number), digits))
    }))
}

/// Rounds to `digits` decimal places, ties away from zero.
///
/// The decimal shift goes through the shortest decimal representation of
/// `value`, so `2.675` rounds to `2.68` even though its binary value is
/// slightly below the tie.
///
/// Digit counts beyond the range of `f64` exponents are clamped, and a shift
/// that leaves the finite range returns `value` unchanged.
fn round_half_up(value: f64, digits: i64) -> f64 {
    const MAX_DIGITS: i64 = 400;
    // Beyond 2^52 every f64 is already an integer.
    const EXACT_LIMIT: f64 = 4_503_599_627_370_496.0;

    if !value.is_finite() {
        return value;
    }
    let digits = digits.clamp(-MAX_DIGITS, MAX_DIGITS);
    let shifted = format!("{}e{}", value, digits)
        .parse::<f64>()
        .unwrap_or(value);
    if !shifted.is_finite() || shifted.abs() >= EXACT_LIMIT {
        return value;
    }
    let rounded = shifted.round();
    match format!("{}e{}", rounded, -digits).parse::<f64>() {
        Ok(result) if result.is_finite() => result,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run;
    use super::round_half_up;
    use crate::error::EvalError;
    use serde_json::{Value, json};

    fn eval(query: Value) -> Result<Value, EvalError> {
        run(query, Value::Null)
    }

    #[test]
    fn test_integer_results_stay_integers() {
        assert_eq!(eval(json!(["add", 2, 3])), Ok(json!(5)));
        assert!(eval(json!(["add", 2.5, 0.5])).unwrap().is_i64());
        assert_eq!(eval(json!(["subtract", 2, 3.5])), Ok(json!(-1.5)));
        assert_eq!(eval(json!(["multiply", 4, 2.5])), Ok(json!(10)));
        assert_eq!(eval(json!(["divide", 7, 2])), Ok(json!(3.5)));
        assert_eq!(eval(json!(["divide", 6, 3])), Ok(json!(2)));
        assert_eq!(eval(json!(["mod", 7, 3])), Ok(json!(1)));
        assert_eq!(eval(json!(["mod", -7, 3])), Ok(json!(-1)));
        assert_eq!(eval(json!(["pow", 2, 10])), Ok(json!(1024)));
        assert_eq!(eval(json!(["pow", 4, 0.5])), Ok(json!(2)));
        assert_eq!(eval(json!(["pow", 2, -1])), Ok(json!(0.5)));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let result = eval(json!(["add", i64::MAX, 1])).unwrap();
        assert!(result.is_f64());
    }

    #[test]
    fn test_null_and_type_errors() {
        assert_eq!(eval(json!(["add", null, 1])), Ok(json!(null)));
        assert_eq!(
            run(json!(["multiply", ["get", "a"], 2]), json!({})),
            Ok(json!(null))
        );
        assert_eq!(eval(json!(["add", "1", 1])), Err(EvalError::number_expected()));
        assert_eq!(eval(json!(["divide", 1, 0])), Err(EvalError::DivisionByZero));
        assert_eq!(eval(json!(["mod", 1, 0.0])), Err(EvalError::DivisionByZero));
        assert_eq!(eval(json!(["pow", 10, 400])), Err(EvalError::NonFinite("pow")));
    }

    #[test]
    fn test_abs() {
        assert_eq!(eval(json!(["abs", -3])), Ok(json!(3)));
        assert_eq!(eval(json!(["abs", -2.5])), Ok(json!(2.5)));
        assert_eq!(run(json!(["abs"]), json!(-4)), Ok(json!(4)));
        assert_eq!(eval(json!(["abs", "x"])), Ok(json!(null)));
    }

    #[test]
    fn test_round() {
        assert_eq!(eval(json!(["round", 2.5])), Ok(json!(3)));
        assert_eq!(eval(json!(["round", -2.5])), Ok(json!(-3)));
        assert_eq!(eval(json!(["round", 2.675, 2])), Ok(json!(2.68)));
        assert_eq!(eval(json!(["round", 1234, -2])), Ok(json!(1200)));
        assert_eq!(eval(json!(["round", 7])), Ok(json!(7)));
        assert_eq!(eval(json!(["round", null])), Ok(json!(null)));
        assert_eq!(eval(json!(["round", "x"])), Err(EvalError::number_expected()));
        assert_eq!(round_half_up(1.005, 2), 1.01);
    }

    #[test]
    fn test_round_with_extreme_digit_counts() {
        assert_eq!(eval(json!(["round", 2.5, 400])), Ok(json!(2.5)));
        assert_eq!(eval(json!(["round", 1.25, 1000000])), Ok(json!(1.25)));
        assert_eq!(eval(json!(["round", 1234.5, -400])), Ok(json!(0)));
        assert_eq!(eval(json!(["round", 7, -400])), Ok(json!(0)));
        assert_eq!(eval(json!(["round", 1e300, 20])), Ok(json!(1e300)));
        assert_eq!(round_half_up(2.5, i64::MAX), 2.5);
        assert_eq!(round_half_up(2.5, i64::MIN), 0.0);
    }
}
