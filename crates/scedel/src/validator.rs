//! Validation entry points: input normalization, root-type resolution and
//! error collection.
use serde_json::Value;

use crate::{
    ast::TypeExpr, error::ValidationError, location::LazyLocation, matcher::Matcher,
    repository::SchemaRepository, scope::Scope,
};

/// The JSON input of a validation call: raw text, decoded exactly once, or
/// an already-decoded value.
#[derive(Copy, Clone, Debug)]
pub enum JsonInput<'a> {
    Text(&'a str),
    Value(&'a Value),
}

impl<'a> From<&'a str> for JsonInput<'a> {
    fn from(text: &'a str) -> Self {
        JsonInput::Text(text)
    }
}

impl<'a> From<&'a String> for JsonInput<'a> {
    fn from(text: &'a String) -> Self {
        JsonInput::Text(text)
    }
}

impl<'a> From<&'a Value> for JsonInput<'a> {
    fn from(value: &'a Value) -> Self {
        JsonInput::Value(value)
    }
}

/// Validate a JSON input against a schema repository.
///
/// The root type is `root_type` when given, the type named `Root` when the
/// repository defines one, or the repository's single user-defined type.
/// The returned list is empty exactly when the input is valid; its order
/// follows the depth-first walk of the schema against the value.
pub fn validate<'a>(
    input: impl Into<JsonInput<'a>>,
    repository: &SchemaRepository,
    root_type: Option<&str>,
) -> Vec<ValidationError> {
    let decoded;
    let value: &Value = match input.into() {
        JsonInput::Text(text) => match serde_json::from_str(text) {
            Ok(value) => {
                decoded = value;
                &decoded
            }
            Err(error) => return vec![ValidationError::json_parse(error.to_string())],
        },
        JsonInput::Value(value) => value,
    };

    let root_name: &str = match root_type {
        Some(name) if repository.is_defined(name) => name,
        Some(name) => return vec![ValidationError::unknown_root_type(name)],
        None => {
            if repository.custom_type("Root").is_some() {
                "Root"
            } else if let Some(single) = repository.single_custom_type() {
                single.name.as_str()
            } else {
                return vec![ValidationError::ambiguous_root_type(
                    repository.custom_type_names(),
                )];
            }
        }
    };

    let scope = Scope::new(value);
    let location = LazyLocation::new();
    let root_expr = TypeExpr::Named {
        name: root_name.to_string(),
        constraints: Vec::new(),
    };
    let mut matcher = Matcher::new(repository);
    matcher.match_type(&root_expr, value, &scope, &location);
    matcher.into_errors()
}

/// Shortcut: whether the input validates cleanly.
pub fn is_valid<'a>(
    input: impl Into<JsonInput<'a>>,
    repository: &SchemaRepository,
    root_type: Option<&str>,
) -> bool {
    validate(input, repository, root_type).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, ErrorCode};
    use serde_json::json;

    #[test]
    fn invalid_json_text_reports_a_parse_error() {
        let repository = SchemaRepository::new();
        let errors = validate("{not json", &repository, Some("Any"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "$");
        assert_eq!(errors[0].code(), ErrorCode::InvalidExpression);
        assert_eq!(errors[0].category(), ErrorCategory::ParseError);
        assert!(errors[0].message().starts_with("Invalid JSON:"));
    }

    #[test]
    fn requested_root_type_must_exist() {
        let repository = SchemaRepository::new();
        let errors = validate(&json!(1), &repository, Some("Missing"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), ErrorCode::UnknownType);
        assert_eq!(errors[0].category(), ErrorCategory::TypeError);
    }

    #[test]
    fn requested_root_type_may_be_a_builtin() {
        let repository = SchemaRepository::new();
        assert!(is_valid(&json!(5), &repository, Some("Int")));
        assert!(!is_valid(&json!("5"), &repository, Some("Int")));
    }

    #[test]
    fn a_type_named_root_is_preferred() {
        let mut repository = SchemaRepository::new();
        repository.define_type(
            "Root",
            TypeExpr::Named {
                name: "Int".to_string(),
                constraints: Vec::new(),
            },
        );
        repository.define_type(
            "Other",
            TypeExpr::Named {
                name: "String".to_string(),
                constraints: Vec::new(),
            },
        );
        assert!(is_valid(&json!(1), &repository, None));
        assert!(!is_valid(&json!("x"), &repository, None));
    }

    #[test]
    fn a_single_custom_type_is_inferred() {
        let mut repository = SchemaRepository::new();
        repository.define_type(
            "Only",
            TypeExpr::Named {
                name: "String".to_string(),
                constraints: Vec::new(),
            },
        );
        assert!(is_valid(&json!("x"), &repository, None));
    }

    #[test]
    fn ambiguous_roots_list_the_candidates() {
        let mut repository = SchemaRepository::new();
        repository.define_type(
            "B",
            TypeExpr::Named {
                name: "Int".to_string(),
                constraints: Vec::new(),
            },
        );
        repository.define_type(
            "A",
            TypeExpr::Named {
                name: "String".to_string(),
                constraints: Vec::new(),
            },
        );
        let errors = validate(&json!("ok"), &repository, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "$");
        assert_eq!(errors[0].code(), ErrorCode::UnknownType);
        let message = errors[0].message();
        assert!(message.contains("Unable to infer root type"));
        assert!(message.contains("A, B"));
    }

    #[test]
    fn raw_text_and_decoded_values_agree() {
        let repository = SchemaRepository::new();
        let decoded = json!({"a": 1});
        assert_eq!(
            validate(r#"{"a": 1}"#, &repository, Some("Any")),
            validate(&decoded, &repository, Some("Any")),
        );
    }
}
