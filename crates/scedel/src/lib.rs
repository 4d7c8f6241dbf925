//! A validation engine for the Scedel schema language.
//!
//! Given a parsed schema repository and a JSON value, the engine walks the
//! value in lockstep with the schema's type expressions, evaluates inline
//! constraints and user-defined validators, and returns a structured list
//! of validation errors with machine-readable codes and categories.
//!
//! # Validation
//!
//! Load a repository from its JSON document form (the shape an external
//! Scedel parser produces) and validate values against it:
//!
//! ```rust
//! use serde_json::json;
//!
//! let repository = scedel::SchemaRepository::from_json(&json!({
//!     "types": {
//!         "Root": {"kind": "record", "fields": [
//!             {"name": "id", "type": {"kind": "named", "name": "Int"}},
//!             {"name": "note", "type": {"kind": "named", "name": "String"}, "optional": true}
//!         ]}
//!     }
//! })).expect("a well-formed schema document");
//!
//! assert!(scedel::is_valid(&json!({"id": 1}), &repository, None));
//!
//! let errors = scedel::validate(&json!({"id": "one"}), &repository, None);
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].path, "$.id");
//! assert_eq!(errors[0].code(), scedel::ErrorCode::TypeMismatch);
//! ```
//!
//! Raw JSON text works as input too; it is decoded exactly once:
//!
//! ```rust
//! # use serde_json::json;
//! let repository = scedel::SchemaRepository::new();
//! assert!(scedel::is_valid(r#"{"anything": true}"#, &repository, Some("Any")));
//! ```
//!
//! # Repositories
//!
//! A repository holds user-defined types and validators on top of the
//! always-available built-in set (`Any`, `String`, `Int`, `Float`,
//! `Number`, `Bool`, `Date`, `Time`, `DateTime`; `min`, `max`, `length`,
//! `in`, `regex`, `unique`). Repositories can also be assembled
//! programmatically:
//!
//! ```rust
//! use scedel::ast::TypeExpr;
//! use serde_json::json;
//!
//! let mut repository = scedel::SchemaRepository::new();
//! repository.define_type("Tag", TypeExpr::Named {
//!     name: "String".to_string(),
//!     constraints: Vec::new(),
//! });
//! assert!(scedel::is_valid(&json!("core"), &repository, Some("Tag")));
//! ```
//!
//! # Errors
//!
//! Every error carries the path of the offending value (`$`, `.field`,
//! `[index]`, `.{key:k}`), a message, and a code/category pair from the
//! closed sets in [`ErrorCode`] and [`ErrorCategory`]. A valid input yields
//! an empty list; the engine itself never fails.
//!
//! # Regex dialect
//!
//! Schema patterns are compiled with [`fancy-regex`], which layers
//! PCRE-style lookaround and backreferences over Rust's regex syntax, in
//! Unicode mode. A pattern the dialect cannot compile is undecidable
//! rather than fatal: it surfaces as the enclosing validator's or
//! constraint's failure, never as a crash.
//!
//! [`fancy-regex`]: https://docs.rs/fancy-regex
pub mod ast;
mod builtins;
mod constraints;
mod error;
mod eval;
mod location;
mod matcher;
mod repository;
mod scope;
mod validator;
mod value;

pub use builtins::{BuiltinType, BuiltinValidator};
pub use error::{ErrorCategory, ErrorCode, ErrorKind, ValidationError};
pub use location::{LazyLocation, LocationSegment};
pub use repository::{
    CustomType, CustomValidator, SchemaRepository, TypeDefinition, ValidatorDefinition,
};
pub use validator::{is_valid, validate, JsonInput};

/// The Scedel RFC versions this engine implements.
pub const SUPPORTED_RFC_VERSIONS: &[&str] = &["0.14.2"];
