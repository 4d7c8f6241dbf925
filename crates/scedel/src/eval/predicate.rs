//! The tri-valued predicate evaluator.
//!
//! Predicates yield [`Truth`]: they hold, fail, or are undecidable for the
//! value at hand. `Undefined` is not a boolean in disguise; conditional
//! types branch on it differently, so it must survive composition.
use std::cmp::Ordering;

use fancy_regex::Regex;
use num_cmp::NumCmp;
use serde_json::{Number, Value};

use super::{expr, temporal};
use crate::{
    ast::{CmpOp, Expr, Predicate},
    scope::Scope,
    value,
};

/// The result of a predicate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Truth {
    True,
    False,
    Undefined,
}

impl Truth {
    pub(crate) fn from_bool(b: bool) -> Truth {
        if b {
            Truth::True
        } else {
            Truth::False
        }
    }

    pub(crate) fn negate(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Undefined => Truth::Undefined,
        }
    }

    pub(crate) fn as_bool(self) -> Option<bool> {
        match self {
            Truth::True => Some(true),
            Truth::False => Some(false),
            Truth::Undefined => None,
        }
    }
}

pub(crate) fn evaluate(pred: &Predicate, scope: &Scope<'_>) -> Truth {
    match pred {
        Predicate::Not { inner } => evaluate(inner, scope).negate(),
        // Both sides are always evaluated: either side being undecidable
        // makes the conjunction undecidable.
        Predicate::And { lhs, rhs } => {
            let lhs = evaluate(lhs, scope);
            let rhs = evaluate(rhs, scope);
            match (lhs.as_bool(), rhs.as_bool()) {
                (Some(lhs), Some(rhs)) => Truth::from_bool(lhs && rhs),
                _ => Truth::Undefined,
            }
        }
        Predicate::Or { lhs, rhs } => {
            let lhs = evaluate(lhs, scope);
            let rhs = evaluate(rhs, scope);
            match (lhs.as_bool(), rhs.as_bool()) {
                (Some(lhs), Some(rhs)) => Truth::from_bool(lhs || rhs),
                _ => Truth::Undefined,
            }
        }
        Predicate::Compare { lhs, op, rhs } => compare(lhs, *op, rhs, scope),
        Predicate::Matches { expr, pattern } => matches(expr, pattern, scope),
        Predicate::Expr { expr } => match expr::evaluate(expr, scope) {
            Ok(value) => Truth::from_bool(value::truthy(&value)),
            Err(_) => Truth::Undefined,
        },
    }
}

fn compare(lhs: &Expr, op: CmpOp, rhs: &Expr, scope: &Scope<'_>) -> Truth {
    let lhs = match expr::evaluate(lhs, scope) {
        Ok(value) => value,
        Err(_) => return Truth::Undefined,
    };
    let rhs = match expr::evaluate(rhs, scope) {
        Ok(value) => value,
        Err(_) => return Truth::Undefined,
    };
    match op {
        CmpOp::Eq => Truth::from_bool(value::strict_eq(&lhs, &rhs)),
        CmpOp::Ne => Truth::from_bool(!value::strict_eq(&lhs, &rhs)),
        _ => match (&lhs, &rhs) {
            (Value::Number(a), Value::Number(b)) => match number_cmp(a, b) {
                Some(ordering) => Truth::from_bool(ordering_satisfies(op, ordering)),
                None => Truth::Undefined,
            },
            (Value::String(a), Value::String(b)) => {
                // Two date-like strings compare as instants, anything else
                // falls back to lexical order.
                let ordering = match (temporal::timestamp(a), temporal::timestamp(b)) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => a.cmp(b),
                };
                Truth::from_bool(ordering_satisfies(op, ordering))
            }
            _ => Truth::Undefined,
        },
    }
}

fn ordering_satisfies(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Eq | CmpOp::Ne => unreachable!("equality is handled separately"),
    }
}

macro_rules! cmp_rhs {
    ($a:expr, $b:expr) => {
        if let Some(b) = $b.as_u64() {
            NumCmp::num_cmp($a, b)
        } else if let Some(b) = $b.as_i64() {
            NumCmp::num_cmp($a, b)
        } else {
            NumCmp::num_cmp($a, $b.as_f64().expect("Always valid"))
        }
    };
}

/// Ordering across integer and float JSON numbers without precision loss.
pub(crate) fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    if let Some(a) = a.as_u64() {
        cmp_rhs!(a, b)
    } else if let Some(a) = a.as_i64() {
        cmp_rhs!(a, b)
    } else {
        let a = a.as_f64().expect("Always valid");
        cmp_rhs!(a, b)
    }
}

fn matches(expr: &Expr, pattern: &str, scope: &Scope<'_>) -> Truth {
    let value = match expr::evaluate(expr, scope) {
        Ok(value) => value,
        Err(_) => return Truth::Undefined,
    };
    let subject = match value.as_str() {
        Some(subject) => subject,
        None => return Truth::Undefined,
    };
    let pattern = inject_variables(pattern, scope);
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        // Incompatible pattern dialects are non-fatal
        Err(_) => return Truth::Undefined,
    };
    match regex.is_match(subject) {
        Ok(matched) => Truth::from_bool(matched),
        Err(_) => Truth::Undefined,
    }
}

/// Splice scope variables into a regex pattern: every variable name, in its
/// `$`-form, is replaced by the value's plain string rendering. Longer names
/// go first so `$ab` is never clobbered by `$a`.
pub(crate) fn inject_variables(pattern: &str, scope: &Scope<'_>) -> String {
    let mut entries: Vec<(&String, &Value)> = scope.variables().iter().collect();
    entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let mut result = pattern.to_string();
    for (name, value) in entries {
        let needle = if name.starts_with('$') {
            name.clone()
        } else {
            format!("${name}")
        };
        if result.contains(&needle) {
            result = result.replace(&needle, &value::plain_string(value));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use serde_json::json;
    use test_case::test_case;

    fn lit(value: Literal) -> Expr {
        Expr::Literal { value }
    }

    fn eval(pred: &Predicate, root: &Value) -> Truth {
        let scope = Scope::new(root);
        evaluate(pred, &scope)
    }

    fn cmp(lhs: Literal, op: CmpOp, rhs: Literal) -> Predicate {
        Predicate::Compare {
            lhs: lit(lhs),
            op,
            rhs: lit(rhs),
        }
    }

    #[test]
    fn equality_is_strict() {
        let pred = cmp(Literal::Int(1), CmpOp::Eq, Literal::Float(1.0));
        assert_eq!(eval(&pred, &json!(null)), Truth::False);
    }

    #[test]
    fn numbers_order_across_widths() {
        let pred = cmp(Literal::Int(1), CmpOp::Lt, Literal::Float(1.5));
        assert_eq!(eval(&pred, &json!(null)), Truth::True);
    }

    #[test]
    fn date_like_strings_compare_as_instants() {
        let pred = cmp(
            Literal::String("2026-01-02 00:00:00".to_string()),
            CmpOp::Gt,
            Literal::String("2026-01-01".to_string()),
        );
        assert_eq!(eval(&pred, &json!(null)), Truth::True);
    }

    #[test]
    fn plain_strings_compare_lexically() {
        let pred = cmp(
            Literal::String("abc".to_string()),
            CmpOp::Lt,
            Literal::String("abd".to_string()),
        );
        assert_eq!(eval(&pred, &json!(null)), Truth::True);
    }

    #[test]
    fn mixed_type_ordering_is_undefined() {
        let pred = cmp(Literal::Int(1), CmpOp::Lt, Literal::String("2".to_string()));
        assert_eq!(eval(&pred, &json!(null)), Truth::Undefined);
    }

    #[test_case(Truth::True, Truth::True, Truth::True)]
    #[test_case(Truth::True, Truth::False, Truth::False)]
    #[test_case(Truth::False, Truth::Undefined, Truth::Undefined; "undefined poisons even a false side")]
    #[test_case(Truth::Undefined, Truth::True, Truth::Undefined)]
    fn conjunction_three_valued(lhs: Truth, rhs: Truth, expected: Truth) {
        fn as_pred(truth: Truth) -> Predicate {
            match truth {
                Truth::True => Predicate::Expr {
                    expr: Box::new(Expr::Literal {
                        value: Literal::Bool(true),
                    }),
                },
                Truth::False => Predicate::Expr {
                    expr: Box::new(Expr::Literal {
                        value: Literal::Bool(false),
                    }),
                },
                Truth::Undefined => Predicate::Expr {
                    expr: Box::new(Expr::Path {
                        root: crate::ast::PathRoot::Parent,
                        segments: Vec::new(),
                    }),
                },
            }
        }
        let pred = Predicate::And {
            lhs: Box::new(as_pred(lhs)),
            rhs: Box::new(as_pred(rhs)),
        };
        assert_eq!(eval(&pred, &json!(null)), expected);
    }

    #[test]
    fn matches_requires_a_string_subject() {
        let pred = Predicate::Matches {
            expr: lit(Literal::Int(5)),
            pattern: r"\d+".to_string(),
        };
        assert_eq!(eval(&pred, &json!(null)), Truth::Undefined);
    }

    #[test]
    fn broken_patterns_are_undefined_not_fatal() {
        let pred = Predicate::Matches {
            expr: lit(Literal::String("abc".to_string())),
            pattern: "(".to_string(),
        };
        assert_eq!(eval(&pred, &json!(null)), Truth::Undefined);
    }

    #[test]
    fn lookaround_patterns_are_supported() {
        let pred = Predicate::Matches {
            expr: lit(Literal::String("proj:epsg".to_string())),
            pattern: "^(?!eo:)".to_string(),
        };
        assert_eq!(eval(&pred, &json!(null)), Truth::True);
    }

    #[test]
    fn variables_are_spliced_into_patterns() {
        let root = json!(null);
        let outer = Scope::new(&root);
        let current = json!("ab-12");
        let scope = outer.enter_validator(
            &current,
            [
                ("prefix".to_string(), json!("ab")),
                ("prefixLen".to_string(), json!(2)),
            ],
        );
        let injected = inject_variables(r"^$prefix-\d{$prefixLen}$", &scope);
        assert_eq!(injected, r"^ab-\d{2}$");
    }
}
