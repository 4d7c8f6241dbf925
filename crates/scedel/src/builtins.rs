//! The built-in type and validator set.
//!
//! Built-ins are opaque predicates as far as the engine is concerned: a type
//! is `matches(value) -> bool`, a validator is
//! `evaluate(value, argument?) -> Option<bool>` where `None` means the
//! validator does not apply to the value's shape.
use std::cmp::Ordering;

use chrono::NaiveTime;
use fancy_regex::Regex;
use serde_json::{Number, Value};

use crate::eval::{predicate::number_cmp, temporal};

/// A built-in type definition.
#[derive(Debug)]
pub struct BuiltinType {
    pub name: &'static str,
    matches: fn(&Value) -> bool,
}

impl BuiltinType {
    #[inline]
    pub fn matches(&self, value: &Value) -> bool {
        (self.matches)(value)
    }
}

/// A built-in validator definition.
#[derive(Debug)]
pub struct BuiltinValidator {
    pub name: &'static str,
    pub requires_argument: bool,
    evaluate: fn(&Value, Option<&Value>) -> Option<bool>,
}

impl BuiltinValidator {
    #[inline]
    pub fn evaluate(&self, value: &Value, argument: Option<&Value>) -> Option<bool> {
        (self.evaluate)(value, argument)
    }
}

static TYPES: &[BuiltinType] = &[
    BuiltinType {
        name: "Any",
        matches: is_any,
    },
    BuiltinType {
        name: "String",
        matches: is_string,
    },
    BuiltinType {
        name: "Int",
        matches: is_int,
    },
    BuiltinType {
        name: "Float",
        matches: is_number,
    },
    BuiltinType {
        name: "Number",
        matches: is_number,
    },
    BuiltinType {
        name: "Bool",
        matches: is_bool,
    },
    BuiltinType {
        name: "Date",
        matches: is_date,
    },
    BuiltinType {
        name: "Time",
        matches: is_time,
    },
    BuiltinType {
        name: "DateTime",
        matches: is_datetime,
    },
];

static VALIDATORS: &[BuiltinValidator] = &[
    BuiltinValidator {
        name: "min",
        requires_argument: true,
        evaluate: evaluate_min,
    },
    BuiltinValidator {
        name: "max",
        requires_argument: true,
        evaluate: evaluate_max,
    },
    BuiltinValidator {
        name: "length",
        requires_argument: true,
        evaluate: evaluate_length,
    },
    BuiltinValidator {
        name: "in",
        requires_argument: true,
        evaluate: evaluate_in,
    },
    BuiltinValidator {
        name: "regex",
        requires_argument: true,
        evaluate: evaluate_regex,
    },
    BuiltinValidator {
        name: "unique",
        requires_argument: false,
        evaluate: evaluate_unique,
    },
];

pub(crate) fn find_type(name: &str) -> Option<&'static BuiltinType> {
    TYPES.iter().find(|t| t.name == name)
}

pub(crate) fn find_validator(name: &str) -> Option<&'static BuiltinValidator> {
    VALIDATORS.iter().find(|v| v.name == name)
}

fn is_any(_: &Value) -> bool {
    true
}

fn is_string(value: &Value) -> bool {
    value.is_string()
}

fn is_int(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

fn is_number(value: &Value) -> bool {
    value.is_number()
}

fn is_bool(value: &Value) -> bool {
    value.is_boolean()
}

fn is_date(value: &Value) -> bool {
    value
        .as_str()
        .map_or(false, |s| temporal::parse_date(s).is_some())
}

fn is_time(value: &Value) -> bool {
    value
        .as_str()
        .map_or(false, |s| NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok())
}

fn is_datetime(value: &Value) -> bool {
    value
        .as_str()
        .map_or(false, |s| temporal::parse_datetime(s).is_some())
}

fn evaluate_min(value: &Value, argument: Option<&Value>) -> Option<bool> {
    compare_bound(value, argument?).map(|ordering| ordering != Ordering::Less)
}

fn evaluate_max(value: &Value, argument: Option<&Value>) -> Option<bool> {
    compare_bound(value, argument?).map(|ordering| ordering != Ordering::Greater)
}

/// How `min`/`max` order a value against their bound: numbers numerically,
/// date-like strings as instants, other strings and arrays by size.
fn compare_bound(value: &Value, argument: &Value) -> Option<Ordering> {
    match value {
        Value::Number(n) => match argument {
            Value::Number(limit) => number_cmp(n, limit),
            _ => None,
        },
        Value::String(s) => {
            let as_instants = temporal::timestamp(s)
                .zip(argument.as_str().and_then(temporal::timestamp))
                .map(|(value, limit)| value.cmp(&limit));
            match as_instants {
                Some(ordering) => Some(ordering),
                None => match argument {
                    Value::Number(limit) => size_cmp(s.chars().count(), limit),
                    _ => None,
                },
            }
        }
        Value::Array(items) => match argument {
            Value::Number(limit) => size_cmp(items.len(), limit),
            _ => None,
        },
        _ => None,
    }
}

fn size_cmp(size: usize, limit: &Number) -> Option<Ordering> {
    number_cmp(&Number::from(size as u64), limit)
}

fn evaluate_length(value: &Value, argument: Option<&Value>) -> Option<bool> {
    let limit = match argument? {
        Value::Number(limit) => limit,
        _ => return None,
    };
    let size = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        _ => return None,
    };
    size_cmp(size, limit).map(|ordering| ordering == Ordering::Equal)
}

fn evaluate_in(value: &Value, argument: Option<&Value>) -> Option<bool> {
    match argument? {
        Value::Array(options) => Some(options.iter().any(|option| option == value)),
        _ => None,
    }
}

fn evaluate_regex(value: &Value, argument: Option<&Value>) -> Option<bool> {
    let subject = value.as_str()?;
    let pattern = argument?.as_str()?;
    let regex = Regex::new(pattern).ok()?;
    regex.is_match(subject).ok()
}

fn evaluate_unique(value: &Value, _argument: Option<&Value>) -> Option<bool> {
    let items = value.as_array()?;
    for (i, item) in items.iter().enumerate() {
        if items[i + 1..].contains(item) {
            return Some(false);
        }
    }
    Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("Int", json!(5), true)]
    #[test_case("Int", json!(5.0), false)]
    #[test_case("Int", json!("5"), false)]
    #[test_case("Float", json!(5), true)]
    #[test_case("Float", json!(5.5), true)]
    #[test_case("String", json!("x"), true)]
    #[test_case("String", json!(1), false)]
    #[test_case("Bool", json!(true), true)]
    #[test_case("Date", json!("2026-01-01"), true)]
    #[test_case("Date", json!("2026-1-1"), false)]
    #[test_case("Time", json!("10:30:00"), true)]
    #[test_case("DateTime", json!("2026-01-01 10:30:00"), true)]
    #[test_case("DateTime", json!("2026-01-01"), false)]
    #[test_case("Any", json!({}), true)]
    fn type_matching(name: &str, value: Value, expected: bool) {
        let ty = find_type(name).expect("a built-in type");
        assert_eq!(ty.matches(&value), expected);
    }

    #[test]
    fn unknown_builtin_types_are_absent() {
        assert!(find_type("Root").is_none());
    }

    #[test_case(json!(5), json!(3), Some(true))]
    #[test_case(json!(2), json!(3), Some(false))]
    #[test_case(json!(2), json!(1.5), Some(true))]
    #[test_case(json!("abcd"), json!(3), Some(true))]
    #[test_case(json!("ab"), json!(3), Some(false))]
    #[test_case(json!(["a"]), json!(1), Some(true))]
    #[test_case(json!([]), json!(1), Some(false))]
    #[test_case(json!("2026-01-01 11:00:00"), json!("2026-01-01 10:00:00"), Some(true))]
    #[test_case(json!("2026-01-01 09:00:00"), json!("2026-01-01 10:00:00"), Some(false))]
    #[test_case(json!(true), json!(3), None)]
    #[test_case(json!(5), json!("3"), None)]
    fn min_bound(value: Value, argument: Value, expected: Option<bool>) {
        let min = find_validator("min").expect("a built-in validator");
        assert_eq!(min.evaluate(&value, Some(&argument)), expected);
    }

    #[test]
    fn max_mirrors_min() {
        let max = find_validator("max").expect("a built-in validator");
        assert_eq!(max.evaluate(&json!(5), Some(&json!(3))), Some(false));
        assert_eq!(max.evaluate(&json!("ab"), Some(&json!(3))), Some(true));
    }

    #[test]
    fn membership_uses_strict_equality() {
        let contains = find_validator("in").expect("a built-in validator");
        assert_eq!(contains.evaluate(&json!(1), Some(&json!([1, 2]))), Some(true));
        assert_eq!(contains.evaluate(&json!(1.0), Some(&json!([1, 2]))), Some(false));
        assert_eq!(contains.evaluate(&json!(1), Some(&json!("1"))), None);
    }

    #[test]
    fn regex_applies_to_strings_only() {
        let regex = find_validator("regex").expect("a built-in validator");
        assert_eq!(
            regex.evaluate(&json!("abc"), Some(&json!("^a"))),
            Some(true)
        );
        assert_eq!(regex.evaluate(&json!(5), Some(&json!("^a"))), None);
        assert_eq!(regex.evaluate(&json!("abc"), Some(&json!("("))), None);
    }

    #[test]
    fn unique_rejects_duplicates() {
        let unique = find_validator("unique").expect("a built-in validator");
        assert_eq!(unique.evaluate(&json!([1, 2, 3]), None), Some(true));
        assert_eq!(unique.evaluate(&json!([1, 2, 1]), None), Some(false));
        assert_eq!(unique.evaluate(&json!("abc"), None), None);
    }
}
