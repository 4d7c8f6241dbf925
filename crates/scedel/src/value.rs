//! Uniform access to JSON-object-like and array-like values, and the couple
//! of value conventions the engine relies on everywhere.
use serde_json::Value;

/// Strict scalar equality: same JSON type, same value. `1` and `1.0` are
/// different numbers, `serde_json` already refuses to unify them.
#[inline]
pub(crate) fn strict_eq(lhs: &Value, rhs: &Value) -> bool {
    lhs == rhs
}

/// The truthiness coercion applied when a plain expression is used in
/// predicate position.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64().map_or(false, |f| f != 0.0)
            }
        }
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// The plain string form used when splicing a value into a regex pattern.
/// Strings are spliced verbatim, everything else uses its JSON rendering.
pub(crate) fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn numbers_do_not_unify_across_types() {
        assert!(!strict_eq(&json!(1), &json!(1.0)));
        assert!(strict_eq(&json!(1), &json!(1)));
    }

    #[test_case(json!(null), false; "null_is_falsy")]
    #[test_case(json!(false), false; "bool_false_is_falsy")]
    #[test_case(json!(0), false; "int_zero_is_falsy")]
    #[test_case(json!(0.0), false; "float_zero_is_falsy")]
    #[test_case(json!(""), false; "empty_string_is_falsy")]
    #[test_case(json!([]), false; "empty_array_is_falsy")]
    #[test_case(json!({}), false; "empty_object_is_falsy")]
    #[test_case(json!(true), true; "bool_true_is_truthy")]
    #[test_case(json!(3), true; "nonzero_int_is_truthy")]
    #[test_case(json!("x"), true; "nonempty_string_is_truthy")]
    #[test_case(json!([1]), true; "nonempty_array_is_truthy")]
    fn truthiness(value: Value, expected: bool) {
        assert_eq!(truthy(&value), expected);
    }

    #[test]
    fn plain_strings_are_not_quoted() {
        assert_eq!(plain_string(&json!("abc")), "abc");
        assert_eq!(plain_string(&json!(42)), "42");
        assert_eq!(plain_string(&json!(true)), "true");
    }
}
