//! Error types
use crate::location::LazyLocation;
use serde::ser::SerializeStruct;
use serde_json::Value;
use std::fmt::{self, Formatter};

/// Machine-readable error codes. A closed set shared between the engine and
/// schema tooling built on top of it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize)]
pub enum ErrorCode {
    InvalidExpression,
    InvalidArithmetic,
    ParentUndefined,
    UnknownType,
    UnknownConstraint,
    UnknownField,
    UnknownArgumentName,
    MissingArgument,
    TooManyArguments,
    DuplicateArgument,
    ConstraintViolation,
    ValidatorFailed,
    FieldMissing,
    FieldMustBeAbsent,
    TypeMismatch,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidExpression => "InvalidExpression",
            Self::InvalidArithmetic => "InvalidArithmetic",
            Self::ParentUndefined => "ParentUndefined",
            Self::UnknownType => "UnknownType",
            Self::UnknownConstraint => "UnknownConstraint",
            Self::UnknownField => "UnknownField",
            Self::UnknownArgumentName => "UnknownArgumentName",
            Self::MissingArgument => "MissingArgument",
            Self::TooManyArguments => "TooManyArguments",
            Self::DuplicateArgument => "DuplicateArgument",
            Self::ConstraintViolation => "ConstraintViolation",
            Self::ValidatorFailed => "ValidatorFailed",
            Self::FieldMissing => "FieldMissing",
            Self::FieldMustBeAbsent => "FieldMustBeAbsent",
            Self::TypeMismatch => "TypeMismatch",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse-grained error categories.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, serde::Serialize)]
pub enum ErrorCategory {
    ParseError,
    TypeError,
    SemanticError,
    ValidationError,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::TypeError => "TypeError",
            Self::SemanticError => "SemanticError",
            Self::ValidationError => "ValidationError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported while validating a JSON value against a schema.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationError {
    /// Location of the offending value, in `$.a[0]` form.
    pub path: String,
    /// What went wrong.
    pub kind: ErrorKind,
}

/// Kinds of errors that may happen during validation
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum ErrorKind {
    /// The input document is not valid JSON.
    JsonParse { detail: String },
    /// The requested root type is not defined in the repository.
    UnknownRootType { name: String },
    /// No root type was requested and none could be inferred.
    AmbiguousRootType { available: Vec<String> },
    /// A named type reference could not be resolved.
    UnknownType { name: String },
    /// The same user-defined type was unfolded too deep.
    RecursionLimit { name: String },
    /// The value does not match a named type definition.
    TypeMismatch { expected: String },
    /// The value does not equal the expected scalar literal.
    LiteralMismatch { expected: Value },
    /// A JSON array was required.
    ExpectedArray,
    /// A JSON object was required.
    ExpectedObject,
    /// A required record field is absent.
    FieldMissing { name: String },
    /// A value is present at a position declared absent.
    FieldMustBeAbsent,
    /// A record key that no declared field covers.
    UnknownField { name: String },
    /// The value matched none of the union branches.
    NoUnionBranch,
    /// The value matched neither branch of an undecided conditional.
    ConditionalMismatch,
    /// No validator is registered for `(target, name)`.
    UnknownConstraint { target: String, name: String },
    /// A built-in validator does not apply to the value's shape.
    ConstraintUnsupported { name: String },
    /// A built-in validator rejected the value.
    ConstraintFailed {
        name: String,
        value: Value,
        argument: Option<Value>,
    },
    /// A user-defined validator body could not be evaluated.
    ValidatorUnsupported { target: String, name: String },
    /// A user-defined validator rejected the value.
    ValidatorFailed {
        target: String,
        name: String,
        message: Option<String>,
    },
    /// A positional argument appeared after a named one.
    PositionalAfterNamed { validator: String },
    /// A named argument refers to no parameter.
    UnknownArgument { name: String },
    /// The same parameter was bound twice.
    DuplicateArgument { name: String },
    /// More arguments than parameters.
    TooManyArguments { expected: usize, given: usize },
    /// A parameter without a caller binding or a default.
    MissingArgument { name: String },
    /// A bound argument does not satisfy its parameter's type hint.
    ArgumentTypeMismatch { name: String, type_hint: String },
    /// An expression inside a constraint argument or default failed.
    Expression { code: ErrorCode, detail: String },
}

/// Shortcuts for creation of specific error kinds.
impl ValidationError {
    pub(crate) fn new(location: &LazyLocation, kind: ErrorKind) -> ValidationError {
        ValidationError {
            path: location.into(),
            kind,
        }
    }

    pub(crate) fn json_parse(detail: String) -> ValidationError {
        ValidationError {
            path: "$".to_string(),
            kind: ErrorKind::JsonParse { detail },
        }
    }

    pub(crate) fn unknown_root_type(name: &str) -> ValidationError {
        ValidationError {
            path: "$".to_string(),
            kind: ErrorKind::UnknownRootType {
                name: name.to_string(),
            },
        }
    }

    pub(crate) fn ambiguous_root_type(available: Vec<String>) -> ValidationError {
        ValidationError {
            path: "$".to_string(),
            kind: ErrorKind::AmbiguousRootType { available },
        }
    }

    pub(crate) fn unknown_type(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::UnknownType {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn recursion_limit(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::RecursionLimit {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn type_mismatch(location: &LazyLocation, expected: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::TypeMismatch {
                expected: expected.to_string(),
            },
        )
    }

    pub(crate) fn literal_mismatch(location: &LazyLocation, expected: &Value) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::LiteralMismatch {
                expected: expected.clone(),
            },
        )
    }

    pub(crate) fn expected_array(location: &LazyLocation) -> ValidationError {
        ValidationError::new(location, ErrorKind::ExpectedArray)
    }

    pub(crate) fn expected_object(location: &LazyLocation) -> ValidationError {
        ValidationError::new(location, ErrorKind::ExpectedObject)
    }

    pub(crate) fn field_missing(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::FieldMissing {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn field_must_be_absent(location: &LazyLocation) -> ValidationError {
        ValidationError::new(location, ErrorKind::FieldMustBeAbsent)
    }

    pub(crate) fn unknown_field(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::UnknownField {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn no_union_branch(location: &LazyLocation) -> ValidationError {
        ValidationError::new(location, ErrorKind::NoUnionBranch)
    }

    pub(crate) fn conditional_mismatch(location: &LazyLocation) -> ValidationError {
        ValidationError::new(location, ErrorKind::ConditionalMismatch)
    }

    pub(crate) fn unknown_constraint(
        location: &LazyLocation,
        target: &str,
        name: &str,
    ) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::UnknownConstraint {
                target: target.to_string(),
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn constraint_unsupported(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::ConstraintUnsupported {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn constraint_failed(
        location: &LazyLocation,
        name: &str,
        value: &Value,
        argument: Option<Value>,
    ) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::ConstraintFailed {
                name: name.to_string(),
                value: value.clone(),
                argument,
            },
        )
    }

    pub(crate) fn validator_unsupported(
        location: &LazyLocation,
        target: &str,
        name: &str,
    ) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::ValidatorUnsupported {
                target: target.to_string(),
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn validator_failed(
        location: &LazyLocation,
        target: &str,
        name: &str,
        message: Option<String>,
    ) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::ValidatorFailed {
                target: target.to_string(),
                name: name.to_string(),
                message,
            },
        )
    }

    pub(crate) fn positional_after_named(
        location: &LazyLocation,
        validator: &str,
    ) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::PositionalAfterNamed {
                validator: validator.to_string(),
            },
        )
    }

    pub(crate) fn unknown_argument(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::UnknownArgument {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn duplicate_argument(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::DuplicateArgument {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn too_many_arguments(
        location: &LazyLocation,
        expected: usize,
        given: usize,
    ) -> ValidationError {
        ValidationError::new(location, ErrorKind::TooManyArguments { expected, given })
    }

    pub(crate) fn missing_argument(location: &LazyLocation, name: &str) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::MissingArgument {
                name: name.to_string(),
            },
        )
    }

    pub(crate) fn argument_type_mismatch(
        location: &LazyLocation,
        name: &str,
        type_hint: &str,
    ) -> ValidationError {
        ValidationError::new(
            location,
            ErrorKind::ArgumentTypeMismatch {
                name: name.to_string(),
                type_hint: type_hint.to_string(),
            },
        )
    }

    pub(crate) fn expression(
        location: &LazyLocation,
        code: ErrorCode,
        detail: String,
    ) -> ValidationError {
        ValidationError::new(location, ErrorKind::Expression { code, detail })
    }

    /// The machine-readable code of this error.
    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            ErrorKind::JsonParse { .. } => ErrorCode::InvalidExpression,
            ErrorKind::UnknownRootType { .. }
            | ErrorKind::AmbiguousRootType { .. }
            | ErrorKind::UnknownType { .. } => ErrorCode::UnknownType,
            ErrorKind::RecursionLimit { .. } => ErrorCode::InvalidExpression,
            ErrorKind::TypeMismatch { .. }
            | ErrorKind::LiteralMismatch { .. }
            | ErrorKind::ExpectedArray
            | ErrorKind::ExpectedObject
            | ErrorKind::NoUnionBranch
            | ErrorKind::ConditionalMismatch
            | ErrorKind::ArgumentTypeMismatch { .. } => ErrorCode::TypeMismatch,
            ErrorKind::FieldMissing { .. } => ErrorCode::FieldMissing,
            ErrorKind::FieldMustBeAbsent => ErrorCode::FieldMustBeAbsent,
            ErrorKind::UnknownField { .. } => ErrorCode::UnknownField,
            ErrorKind::UnknownConstraint { .. } => ErrorCode::UnknownConstraint,
            ErrorKind::ConstraintUnsupported { .. } | ErrorKind::ConstraintFailed { .. } => {
                ErrorCode::ConstraintViolation
            }
            ErrorKind::ValidatorUnsupported { .. } | ErrorKind::ValidatorFailed { .. } => {
                ErrorCode::ValidatorFailed
            }
            ErrorKind::PositionalAfterNamed { .. } | ErrorKind::UnknownArgument { .. } => {
                ErrorCode::UnknownArgumentName
            }
            ErrorKind::DuplicateArgument { .. } => ErrorCode::DuplicateArgument,
            ErrorKind::TooManyArguments { .. } => ErrorCode::TooManyArguments,
            ErrorKind::MissingArgument { .. } => ErrorCode::MissingArgument,
            ErrorKind::Expression { code, .. } => *code,
        }
    }

    /// The category of this error.
    pub fn category(&self) -> ErrorCategory {
        match &self.kind {
            ErrorKind::JsonParse { .. } => ErrorCategory::ParseError,
            ErrorKind::UnknownRootType { .. }
            | ErrorKind::AmbiguousRootType { .. }
            | ErrorKind::UnknownType { .. }
            | ErrorKind::ArgumentTypeMismatch { .. }
            | ErrorKind::Expression { .. } => ErrorCategory::TypeError,
            ErrorKind::UnknownConstraint { .. } | ErrorKind::UnknownField { .. } => {
                ErrorCategory::SemanticError
            }
            _ => ErrorCategory::ValidationError,
        }
    }

    /// The human-readable message, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl std::error::Error for ValidationError {}

/// Textual representation of various validation errors.
impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::JsonParse { detail } => write!(f, "Invalid JSON: {detail}"),
            ErrorKind::UnknownRootType { name } => {
                write!(f, r#"Requested root type "{name}" is not defined."#)
            }
            ErrorKind::AmbiguousRootType { available } => write!(
                f,
                r#"Unable to infer root type: define a type named "Root" or request one explicitly. Available types: {}."#,
                available.join(", ")
            ),
            ErrorKind::UnknownType { name } => write!(f, r#"Type "{name}" is not defined."#),
            ErrorKind::RecursionLimit { name } => write!(
                f,
                r#"Type recursion depth limit exceeded while resolving "{name}"."#
            ),
            ErrorKind::TypeMismatch { expected } => {
                write!(f, r#"Value does not match type "{expected}"."#)
            }
            ErrorKind::LiteralMismatch { expected } => {
                write!(f, "Expected literal value {expected}.")
            }
            ErrorKind::ExpectedArray => f.write_str("Expected a JSON array."),
            ErrorKind::ExpectedObject => f.write_str("Expected a JSON object."),
            ErrorKind::FieldMissing { name } => {
                write!(f, r#"Required field "{name}" is missing."#)
            }
            ErrorKind::FieldMustBeAbsent => f.write_str("Field must be absent."),
            ErrorKind::UnknownField { name } => write!(f, r#"Unknown field "{name}"."#),
            ErrorKind::NoUnionBranch => f.write_str("Value does not match any union branch."),
            ErrorKind::ConditionalMismatch => {
                f.write_str("Value does not satisfy conditional type.")
            }
            ErrorKind::UnknownConstraint { target, name } => {
                write!(f, r#"Constraint "{name}" is not defined for type "{target}"."#)
            }
            ErrorKind::ConstraintUnsupported { name } => {
                write!(f, r#"Constraint "{name}" is not supported for current value."#)
            }
            ErrorKind::ConstraintFailed {
                name,
                value,
                argument,
            } => match argument {
                Some(argument) => write!(
                    f,
                    r#"Constraint "{name}" failed: expected {value} against {argument}."#
                ),
                None => write!(f, r#"Constraint "{name}" failed for value {value}."#),
            },
            ErrorKind::ValidatorUnsupported { target, name } => write!(
                f,
                r#"Validator "{target}({name})" cannot be evaluated by current runtime."#
            ),
            ErrorKind::ValidatorFailed {
                target,
                name,
                message,
            } => match message {
                Some(message) => f.write_str(message),
                None => write!(f, r#"Validator "{target}({name})" failed."#),
            },
            ErrorKind::PositionalAfterNamed { validator } => write!(
                f,
                r#"Positional arguments must precede named arguments in call to "{validator}"."#
            ),
            ErrorKind::UnknownArgument { name } => {
                write!(f, r#"Unknown argument name "{name}"."#)
            }
            ErrorKind::DuplicateArgument { name } => {
                write!(f, r#"Argument "{name}" is bound more than once."#)
            }
            ErrorKind::TooManyArguments { expected, given } => write!(
                f,
                "Too many arguments: expected at most {expected}, got {given}."
            ),
            ErrorKind::MissingArgument { name } => {
                write!(f, r#"Missing required argument "{name}"."#)
            }
            ErrorKind::ArgumentTypeMismatch { name, type_hint } => write!(
                f,
                r#"Argument "{name}" does not satisfy type "{type_hint}"."#
            ),
            ErrorKind::Expression { detail, .. } => f.write_str(detail),
        }
    }
}

impl serde::Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ValidationError", 4)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("category", &self.category())?;
        state.end()
    }
}
