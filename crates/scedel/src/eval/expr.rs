//! The expression evaluator.
//!
//! Expressions reduce to plain JSON values. Failures carry one of the three
//! expression error codes so callers can report precisely what went wrong;
//! the tri-valued predicate evaluator treats any failure as `Undefined`.
use chrono::Local;
use serde_json::{Number, Value};

use super::{
    predicate,
    predicate::Truth,
    temporal::{self, Temporal},
};
use crate::{
    ast::{BinaryOp, Expr, Literal, PathRoot, UnaryOp},
    error::ErrorCode,
    scope::Scope,
};

/// A failed evaluation: the precise code plus a human-readable detail.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EvalError {
    pub(crate) code: ErrorCode,
    pub(crate) detail: String,
}

impl EvalError {
    pub(crate) fn invalid_expression(detail: impl Into<String>) -> Self {
        EvalError {
            code: ErrorCode::InvalidExpression,
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_arithmetic(detail: impl Into<String>) -> Self {
        EvalError {
            code: ErrorCode::InvalidArithmetic,
            detail: detail.into(),
        }
    }

    pub(crate) fn parent_undefined() -> Self {
        EvalError {
            code: ErrorCode::ParentUndefined,
            detail: "Parent scope is undefined.".to_string(),
        }
    }
}

pub(crate) type EvalResult = Result<Value, EvalError>;

pub(crate) fn evaluate(expr: &Expr, scope: &Scope<'_>) -> EvalResult {
    match expr {
        Expr::Literal { value } => literal(value),
        Expr::EmptyList => Ok(Value::Array(Vec::new())),
        Expr::Path { root, segments } => resolve_path(root, segments, scope),
        Expr::Unary { op, operand } => {
            let operand = evaluate(operand, scope)?;
            unary(*op, operand)
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, scope)?;
            let rhs = evaluate(rhs, scope)?;
            binary(*op, lhs, rhs)
        }
        Expr::Call { name, args } => call(name, args),
        Expr::Predicate { pred } => match predicate::evaluate(pred, scope) {
            Truth::True => Ok(Value::Bool(true)),
            Truth::False => Ok(Value::Bool(false)),
            Truth::Undefined => Err(EvalError::invalid_expression(
                "Predicate could not be resolved.",
            )),
        },
    }
}

fn literal(literal: &Literal) -> EvalResult {
    Ok(match literal {
        Literal::Duration { ms } => Value::from(*ms),
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::from(*i),
        Literal::Float(f) => float_value(*f)?,
        Literal::String(s) => Value::String(s.clone()),
    })
}

fn resolve_path(root: &PathRoot, segments: &[String], scope: &Scope<'_>) -> EvalResult {
    let base: &Value = match root {
        PathRoot::This => scope.current(),
        PathRoot::Root => scope.root(),
        PathRoot::Parent => scope.parent().ok_or_else(EvalError::parent_undefined)?,
        PathRoot::Ident(name) => match scope.current() {
            Value::Object(map) => map.get(name).ok_or_else(|| {
                EvalError::invalid_expression(format!(r#"Unresolved identifier "{name}"."#))
            })?,
            _ => {
                return Err(EvalError::invalid_expression(format!(
                    r#"Unresolved identifier "{name}"."#
                )))
            }
        },
        PathRoot::Var(name) => scope
            .variable(name)
            .or_else(|| name.strip_prefix('$').and_then(|bare| scope.variable(bare)))
            .ok_or_else(|| {
                EvalError::invalid_expression(format!(r#"Unresolved variable "{name}"."#))
            })?,
    };
    let mut value = base;
    for segment in segments {
        match value {
            Value::Object(map) => match map.get(segment) {
                Some(child) => value = child,
                // Absent fields read as null rather than failing
                None => return Ok(Value::Null),
            },
            _ => return Ok(Value::Null),
        }
    }
    Ok(value.clone())
}

fn unary(op: UnaryOp, operand: Value) -> EvalResult {
    if let Some(num) = as_num(&operand) {
        return match op {
            UnaryOp::Plus => Ok(operand),
            UnaryOp::Neg => match num {
                Num::Int(i) => i
                    .checked_neg()
                    .map(Value::from)
                    .ok_or_else(|| EvalError::invalid_arithmetic("Integer overflow.")),
                Num::Float(f) => float_value(-f),
            },
        };
    }
    if let Some(ms) = temporal::duration_ms(&operand) {
        return match op {
            UnaryOp::Plus => Ok(Value::from(ms)),
            UnaryOp::Neg => ms
                .checked_neg()
                .map(Value::from)
                .ok_or_else(|| EvalError::invalid_arithmetic("Integer overflow.")),
        };
    }
    Err(EvalError::invalid_arithmetic(
        "Unary arithmetic requires a number or a duration.",
    ))
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult {
    match op {
        BinaryOp::Add | BinaryOp::Sub => add_sub(op, lhs, rhs),
        BinaryOp::Mul => mul(lhs, rhs),
        BinaryOp::Div => div(lhs, rhs),
    }
}

/// `+` and `-` try temporal rules before falling back to plain numbers:
/// temporal ± duration shifts, temporal − temporal (same kind) diffs, and
/// duration ± duration stays a duration.
fn add_sub(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult {
    if let Some(t) = temporal::temporal(&lhs) {
        if let Some(ms) = temporal::duration_ms(&rhs) {
            let shifted = match op {
                BinaryOp::Add => t.timestamp_ms.checked_add(ms),
                _ => t.timestamp_ms.checked_sub(ms),
            }
            .ok_or_else(|| EvalError::invalid_arithmetic("Temporal shift out of range."))?;
            return Temporal::format(t.kind, shifted)
                .map(Value::String)
                .ok_or_else(|| EvalError::invalid_arithmetic("Temporal shift out of range."));
        }
        if op == BinaryOp::Sub {
            if let Some(other) = temporal::temporal(&rhs) {
                if t.kind == other.kind {
                    return Ok(Value::from(t.timestamp_ms - other.timestamp_ms));
                }
            }
        }
    } else if let (Some(a), Some(b)) = (temporal::duration_ms(&lhs), temporal::duration_ms(&rhs)) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            _ => a.checked_sub(b),
        }
        .ok_or_else(|| EvalError::invalid_arithmetic("Integer overflow."))?;
        return Ok(Value::from(result));
    }
    numeric(op, &lhs, &rhs)
}

fn mul(lhs: Value, rhs: Value) -> EvalResult {
    if as_num(&lhs).is_some() && as_num(&rhs).is_some() {
        return numeric(BinaryOp::Mul, &lhs, &rhs);
    }
    if let Some((ms, factor)) = duration_and_factor(&lhs, &rhs) {
        let scaled = ms as f64 * factor;
        if !scaled.is_finite() {
            return Err(EvalError::invalid_arithmetic("Non-finite arithmetic result."));
        }
        return Ok(Value::from(scaled.round() as i64));
    }
    Err(EvalError::invalid_arithmetic(
        "Multiplication requires numbers or a duration and a number.",
    ))
}

fn div(lhs: Value, rhs: Value) -> EvalResult {
    if let (Some(a), Some(b)) = (as_num(&lhs), as_num(&rhs)) {
        if b.is_zero() {
            return Err(EvalError::invalid_arithmetic("Division by zero."));
        }
        if let (Num::Int(a), Num::Int(b)) = (a, b) {
            if let (Some(0), Some(exact)) = (a.checked_rem(b), a.checked_div(b)) {
                return Ok(Value::from(exact));
            }
        }
        return float_value(a.as_f64() / b.as_f64());
    }
    if let (Value::String(_), Some(factor)) = (&lhs, as_num(&rhs).map(|n| n.as_f64())) {
        if let Some(ms) = temporal::duration_ms(&lhs) {
            if factor == 0.0 {
                return Err(EvalError::invalid_arithmetic("Division by zero."));
            }
            let scaled = ms as f64 / factor;
            if !scaled.is_finite() {
                return Err(EvalError::invalid_arithmetic("Non-finite arithmetic result."));
            }
            return Ok(Value::from(scaled.round() as i64));
        }
    }
    Err(EvalError::invalid_arithmetic(
        "Division requires numbers or a duration and a number.",
    ))
}

/// A duration string on one side, a number on the other.
fn duration_and_factor(lhs: &Value, rhs: &Value) -> Option<(i64, f64)> {
    match (lhs, rhs) {
        (Value::String(_), Value::Number(_)) => {
            Some((temporal::duration_ms(lhs)?, as_num(rhs)?.as_f64()))
        }
        (Value::Number(_), Value::String(_)) => {
            Some((temporal::duration_ms(rhs)?, as_num(lhs)?.as_f64()))
        }
        _ => None,
    }
}

fn numeric(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult {
    let (a, b) = match (as_num(lhs), as_num(rhs)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(EvalError::invalid_arithmetic(
                "Arithmetic requires numeric operands.",
            ))
        }
    };
    if let (Num::Int(a), Num::Int(b)) = (a, b) {
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => unreachable!("division is handled separately"),
        };
        if let Some(result) = exact {
            return Ok(Value::from(result));
        }
    }
    let (a, b) = (a.as_f64(), b.as_f64());
    float_value(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => unreachable!("division is handled separately"),
    })
}

fn call(name: &str, args: &[Expr]) -> EvalResult {
    match name {
        "now" if args.is_empty() => Ok(Value::String(
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        )),
        "midnight" if args.is_empty() => Ok(Value::String(format!(
            "{} 00:00:00",
            Local::now().format("%Y-%m-%d")
        ))),
        "pi" if args.is_empty() => float_value(std::f64::consts::PI),
        _ => Err(EvalError::invalid_expression(format!(
            r#"Unknown function call "{name}"."#
        ))),
    }
}

#[derive(Copy, Clone, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(i) => i == 0,
            Num::Float(f) => f == 0.0,
        }
    }
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Num::Int(i))
            } else {
                n.as_f64().map(Num::Float)
            }
        }
        _ => None,
    }
}

fn float_value(f: f64) -> EvalResult {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EvalError::invalid_arithmetic("Non-finite arithmetic result."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CmpOp, Predicate};
    use serde_json::json;
    use test_case::test_case;

    fn eval(expr: &Expr, root: &Value) -> EvalResult {
        let scope = Scope::new(root);
        evaluate(expr, &scope)
    }

    fn lit(value: Literal) -> Expr {
        Expr::Literal { value }
    }

    fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test_case(BinaryOp::Add, 2, 3, json!(5))]
    #[test_case(BinaryOp::Sub, 2, 3, json!(-1))]
    #[test_case(BinaryOp::Mul, 4, 3, json!(12))]
    fn integer_arithmetic(op: BinaryOp, a: i64, b: i64, expected: Value) {
        let expr = bin(op, lit(Literal::Int(a)), lit(Literal::Int(b)));
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), expected);
    }

    #[test]
    fn division_is_exact_for_divisible_integers() {
        let expr = bin(BinaryOp::Div, lit(Literal::Int(6)), lit(Literal::Int(2)));
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), json!(3));
        let expr = bin(BinaryOp::Div, lit(Literal::Int(7)), lit(Literal::Int(2)));
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), json!(3.5));
    }

    #[test]
    fn division_by_zero_is_an_arithmetic_error() {
        let expr = bin(BinaryOp::Div, lit(Literal::Int(1)), lit(Literal::Int(0)));
        let error = eval(&expr, &json!(null)).expect_err("division by zero");
        assert_eq!(error.code, ErrorCode::InvalidArithmetic);
    }

    #[test]
    fn temporal_plus_duration_shifts_and_reformats() {
        let expr = bin(
            BinaryOp::Add,
            lit(Literal::String("2026-01-01 10:00:00".to_string())),
            lit(Literal::Duration { ms: 3_600_000 }),
        );
        assert_eq!(
            eval(&expr, &json!(null)).expect("evaluates"),
            json!("2026-01-01 11:00:00")
        );
    }

    #[test]
    fn date_minus_duration_stays_a_date() {
        let expr = bin(
            BinaryOp::Sub,
            lit(Literal::String("2026-01-10".to_string())),
            lit(Literal::String("3d".to_string())),
        );
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), json!("2026-01-07"));
    }

    #[test]
    fn same_kind_temporals_subtract_to_milliseconds() {
        let expr = bin(
            BinaryOp::Sub,
            lit(Literal::String("2026-01-01 11:00:00".to_string())),
            lit(Literal::String("2026-01-01 10:00:00".to_string())),
        );
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), json!(3_600_000));
    }

    #[test]
    fn mixed_kind_temporal_subtraction_fails() {
        let expr = bin(
            BinaryOp::Sub,
            lit(Literal::String("2026-01-01 11:00:00".to_string())),
            lit(Literal::String("2026-01-01".to_string())),
        );
        let error = eval(&expr, &json!(null)).expect_err("mixed kinds");
        assert_eq!(error.code, ErrorCode::InvalidArithmetic);
    }

    #[test]
    fn duration_times_number_rounds_to_milliseconds() {
        let expr = bin(
            BinaryOp::Mul,
            lit(Literal::String("1h".to_string())),
            lit(Literal::Float(1.5)),
        );
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), json!(5_400_000));
    }

    #[test]
    fn paths_resolve_against_the_scope() {
        let root = json!({"a": {"b": 7}});
        let expr = Expr::Path {
            root: PathRoot::This,
            segments: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(eval(&expr, &root).expect("resolves"), json!(7));
    }

    #[test]
    fn missing_segments_read_as_null() {
        let root = json!({"a": {}});
        let expr = Expr::Path {
            root: PathRoot::This,
            segments: vec!["a".to_string(), "missing".to_string()],
        };
        assert_eq!(eval(&expr, &root).expect("resolves"), json!(null));
    }

    #[test]
    fn parent_is_undefined_at_the_root() {
        let root = json!({});
        let expr = Expr::Path {
            root: PathRoot::Parent,
            segments: Vec::new(),
        };
        let error = eval(&expr, &root).expect_err("no parent");
        assert_eq!(error.code, ErrorCode::ParentUndefined);
    }

    #[test]
    fn variables_resolve_with_or_without_the_sigil() {
        let root = json!(null);
        let outer = Scope::new(&root);
        let current = json!(5);
        let scope = outer.enter_validator(&current, [("i".to_string(), json!(3))]);
        let expr = Expr::Path {
            root: PathRoot::Var("$i".to_string()),
            segments: Vec::new(),
        };
        assert_eq!(evaluate(&expr, &scope).expect("resolves"), json!(3));
    }

    #[test]
    fn unknown_functions_fail() {
        let expr = Expr::Call {
            name: "tomorrow".to_string(),
            args: Vec::new(),
        };
        let error = eval(&expr, &json!(null)).expect_err("unknown function");
        assert_eq!(error.code, ErrorCode::InvalidExpression);
    }

    #[test]
    fn now_uses_the_engine_datetime_format() {
        let expr = Expr::Call {
            name: "now".to_string(),
            args: Vec::new(),
        };
        let value = eval(&expr, &json!(null)).expect("evaluates");
        let text = value.as_str().expect("a string");
        assert!(super::super::temporal::parse_datetime(text).is_some());
    }

    #[test]
    fn predicates_lift_into_booleans() {
        let expr = Expr::Predicate {
            pred: Box::new(Predicate::Compare {
                lhs: lit(Literal::Int(2)),
                op: CmpOp::Lt,
                rhs: lit(Literal::Int(3)),
            }),
        };
        assert_eq!(eval(&expr, &json!(null)).expect("evaluates"), json!(true));
    }
}
