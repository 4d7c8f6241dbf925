//! The schema repository: the parsed, read-only schema a validation call
//! runs against.
use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ast::{Param, TypeExpr, ValidatorBody},
    builtins::{self, BuiltinType, BuiltinValidator},
};

/// A user-defined type: a name bound to a type expression.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomType {
    pub name: String,
    pub expr: TypeExpr,
}

/// A user-defined validator, attached to a target type under a constraint
/// name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomValidator {
    pub target_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    pub body: ValidatorBody,
}

/// A resolved type definition.
#[derive(Copy, Clone, Debug)]
pub enum TypeDefinition<'a> {
    Builtin(&'static BuiltinType),
    Custom(&'a CustomType),
}

/// A resolved validator definition.
#[derive(Copy, Clone, Debug)]
pub enum ValidatorDefinition<'a> {
    Builtin(&'static BuiltinValidator),
    Custom(&'a CustomValidator),
}

/// Lookup of type and validator definitions by name. Immutable for the
/// duration of any validation call; shared freely between calls.
///
/// The built-in set is always in view. User definitions shadow built-ins of
/// the same name; a user validator is only consulted for its exact
/// `(target type, name)` pair.
#[derive(Clone, Debug, Default)]
pub struct SchemaRepository {
    types: AHashMap<String, CustomType>,
    validators: AHashMap<String, AHashMap<String, CustomValidator>>,
}

impl SchemaRepository {
    pub fn new() -> Self {
        SchemaRepository::default()
    }

    /// Load a repository from its JSON document form:
    /// `{"types": {...}, "validators": [...]}`.
    ///
    /// This is the seam an external Scedel parser feeds; see the crate docs
    /// for the node encodings.
    pub fn from_json(document: &Value) -> Result<Self, serde_json::Error> {
        let document: SchemaDocument = serde_json::from_value(document.clone())?;
        Ok(document.into())
    }

    /// Like [`SchemaRepository::from_json`], from raw JSON text.
    pub fn from_json_str(document: &str) -> Result<Self, serde_json::Error> {
        let document: SchemaDocument = serde_json::from_str(document)?;
        Ok(document.into())
    }

    /// Bind `name` to a type expression.
    pub fn define_type(&mut self, name: impl Into<String>, expr: TypeExpr) {
        let name = name.into();
        self.types.insert(name.clone(), CustomType { name, expr });
    }

    /// Register a user-defined validator under its `(target type, name)`.
    pub fn define_validator(&mut self, validator: CustomValidator) {
        self.validators
            .entry(validator.target_type.clone())
            .or_default()
            .insert(validator.name.clone(), validator);
    }

    /// Whether `name` resolves to any definition, built-in included.
    pub fn is_defined(&self, name: &str) -> bool {
        self.types.contains_key(name) || builtins::find_type(name).is_some()
    }

    /// Resolve a type name, user definitions first.
    pub fn type_definition(&self, name: &str) -> Option<TypeDefinition<'_>> {
        if let Some(custom) = self.types.get(name) {
            return Some(TypeDefinition::Custom(custom));
        }
        builtins::find_type(name).map(TypeDefinition::Builtin)
    }

    pub(crate) fn custom_type(&self, name: &str) -> Option<&CustomType> {
        self.types.get(name)
    }

    /// The single user-defined type, if there is exactly one.
    pub(crate) fn single_custom_type(&self) -> Option<&CustomType> {
        if self.types.len() == 1 {
            self.types.values().next()
        } else {
            None
        }
    }

    /// All user-defined type names, sorted for stable reporting.
    pub(crate) fn custom_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Resolve the validator a constraint on `target` refers to.
    pub fn validator(&self, target: &str, name: &str) -> Option<ValidatorDefinition<'_>> {
        if let Some(custom) = self
            .validators
            .get(target)
            .and_then(|for_target| for_target.get(name))
        {
            return Some(ValidatorDefinition::Custom(custom));
        }
        builtins::find_validator(name).map(ValidatorDefinition::Builtin)
    }
}

/// The JSON document form of a repository.
#[derive(Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    types: BTreeMap<String, TypeExpr>,
    #[serde(default)]
    validators: Vec<CustomValidator>,
}

impl From<SchemaDocument> for SchemaRepository {
    fn from(document: SchemaDocument) -> Self {
        let mut repository = SchemaRepository::new();
        for (name, expr) in document.types {
            repository.define_type(name, expr);
        }
        for validator in document.validators {
            repository.define_validator(validator);
        }
        repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtins_are_always_in_view() {
        let repository = SchemaRepository::new();
        assert!(repository.is_defined("Int"));
        assert!(matches!(
            repository.type_definition("String"),
            Some(TypeDefinition::Builtin(_))
        ));
        assert!(matches!(
            repository.validator("Int", "min"),
            Some(ValidatorDefinition::Builtin(_))
        ));
    }

    #[test]
    fn user_validators_take_precedence_for_their_target() {
        let mut repository = SchemaRepository::new();
        repository.define_validator(CustomValidator {
            target_type: "Int".to_string(),
            name: "min".to_string(),
            params: Vec::new(),
            body: crate::ast::ValidatorBody::Regex {
                pattern: ".*".to_string(),
                negated: false,
            },
        });
        assert!(matches!(
            repository.validator("Int", "min"),
            Some(ValidatorDefinition::Custom(_))
        ));
        // Other targets still resolve to the built-in
        assert!(matches!(
            repository.validator("String", "min"),
            Some(ValidatorDefinition::Builtin(_))
        ));
    }

    #[test]
    fn loads_from_a_json_document() {
        let repository = SchemaRepository::from_json(&json!({
            "types": {
                "Root": {"kind": "named", "name": "String"}
            },
            "validators": [{
                "targetType": "String",
                "name": "shouty",
                "body": {"kind": "regex", "pattern": "^[A-Z]+$"}
            }]
        }))
        .expect("a valid document");
        assert!(repository.custom_type("Root").is_some());
        assert!(matches!(
            repository.validator("String", "shouty"),
            Some(ValidatorDefinition::Custom(_))
        ));
    }

    #[test]
    fn type_names_report_sorted() {
        let mut repository = SchemaRepository::new();
        repository.define_type("B", TypeExpr::Absent);
        repository.define_type("A", TypeExpr::Absent);
        assert_eq!(repository.custom_type_names(), vec!["A", "B"]);
    }
}
