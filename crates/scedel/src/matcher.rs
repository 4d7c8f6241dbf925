//! The type matcher: unifies a JSON value with a type expression tree,
//! accumulating violations.
//!
//! The matcher's contract per variant: record any violations, return whether
//! the value matched locally. A local failure never stops sibling
//! validation; traversal only stops where descending has no meaning (a
//! non-object where an object is required, an unresolvable type name).
use ahash::AHashMap;
use serde_json::Value;

use crate::{
    ast::{Constraint, Field, TypeExpr},
    constraints,
    error::ValidationError,
    eval::predicate::{self, Truth},
    location::{LazyLocation, LocationSegment},
    repository::{SchemaRepository, TypeDefinition},
    scope::Scope,
    value,
};

/// Nested resolutions allowed per user-defined type name.
const MAX_TYPE_DEPTH: usize = 64;

pub(crate) struct Matcher<'a> {
    repository: &'a SchemaRepository,
    type_stack: AHashMap<String, usize>,
    errors: Vec<ValidationError>,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(repository: &'a SchemaRepository) -> Self {
        Matcher {
            repository,
            type_stack: AHashMap::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn repository(&self) -> &'a SchemaRepository {
        self.repository
    }

    pub(crate) fn report(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    pub(crate) fn match_type(
        &mut self,
        expr: &TypeExpr,
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        match expr {
            TypeExpr::Absent => {
                self.report(ValidationError::field_must_be_absent(location));
                false
            }
            TypeExpr::Literal { value: expected } => {
                if value::strict_eq(value, expected) {
                    true
                } else {
                    self.report(ValidationError::literal_mismatch(location, expected));
                    false
                }
            }
            TypeExpr::Named { name, constraints } => {
                self.match_named(name, constraints, value, scope, location)
            }
            TypeExpr::NullableNamed { name } => {
                value.is_null() || self.match_named(name, &[], value, scope, location)
            }
            TypeExpr::Nullable { inner } => {
                value.is_null() || self.match_type(inner, value, scope, location)
            }
            TypeExpr::Array { item, constraints } => {
                self.match_array(item, constraints, value, scope, location)
            }
            TypeExpr::Record { fields } => self.match_record(fields, value, scope, location),
            TypeExpr::Dict {
                key,
                value: value_type,
            } => self.match_dict(key, value_type, value, scope, location),
            TypeExpr::Union { items } => self.match_union(items, value, scope, location),
            TypeExpr::Intersection { items } => {
                let mut matched = true;
                for item in items {
                    matched &= self.match_type(item, value, scope, location);
                }
                matched
            }
            TypeExpr::Conditional {
                condition,
                then,
                otherwise,
            } => self.match_conditional(condition, then, otherwise, value, scope, location),
        }
    }

    /// Run a match against a scratch error buffer, keeping only the verdict.
    pub(crate) fn probe(
        &mut self,
        expr: &TypeExpr,
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        let saved = std::mem::take(&mut self.errors);
        let matched = self.match_type(expr, value, scope, location);
        self.errors = saved;
        matched
    }

    fn match_named(
        &mut self,
        name: &str,
        constraints: &[Constraint],
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        let repository = self.repository;
        let definition = match repository.type_definition(name) {
            Some(definition) => definition,
            None => {
                self.report(ValidationError::unknown_type(location, name));
                return false;
            }
        };
        let matched = match definition {
            TypeDefinition::Builtin(ty) => {
                if ty.matches(value) {
                    true
                } else {
                    self.report(ValidationError::type_mismatch(location, name));
                    false
                }
            }
            TypeDefinition::Custom(custom) => {
                if !self.enter_type(name) {
                    self.report(ValidationError::recursion_limit(location, name));
                    return false;
                }
                let matched = self.match_type(&custom.expr, value, scope, location);
                self.exit_type(name);
                matched
            }
        };
        if !matched {
            // Constraints against a value of the wrong shape only add noise
            return false;
        }
        constraints::apply(self, constraints, name, value, scope, location)
    }

    fn match_array(
        &mut self,
        item_type: &TypeExpr,
        constraints: &[Constraint],
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        let items = match value {
            Value::Array(items) => items,
            _ => {
                self.report(ValidationError::expected_array(location));
                return false;
            }
        };
        let mut matched = true;
        for (index, item) in items.iter().enumerate() {
            let item_location = location.push(index);
            let item_scope = scope.child(item);
            matched &= self.match_type(item_type, item, &item_scope, &item_location);
        }
        // List constraints see the whole array in the enclosing scope
        matched & constraints::apply(self, constraints, "Array", value, scope, location)
    }

    fn match_record(
        &mut self,
        fields: &[Field],
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        let map = match value {
            Value::Object(map) => map,
            _ => {
                self.report(ValidationError::expected_object(location));
                return false;
            }
        };
        // All of a record's fields evaluate in one frame anchored at the
        // record, so `this.<sibling>` and bare identifiers see the record.
        let record_scope = scope.child(value);
        let mut matched = true;
        for field in fields {
            let field_location = location.push(field.name.as_str());
            matched &= match map.get(&field.name) {
                Some(field_value) => {
                    self.match_type(&field.ty, field_value, &record_scope, &field_location)
                }
                None => {
                    if field.optional
                        || field.default.is_some()
                        || self.admits_absence(&field.ty, &record_scope)
                    {
                        true
                    } else {
                        self.report(ValidationError::field_missing(&field_location, &field.name));
                        false
                    }
                }
            };
        }
        for key in map.keys() {
            if !fields.iter().any(|field| field.name == *key) {
                let key_location = location.push(key.as_str());
                self.report(ValidationError::unknown_field(&key_location, key));
                matched = false;
            }
        }
        matched
    }

    fn match_dict(
        &mut self,
        key_type: &TypeExpr,
        value_type: &TypeExpr,
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        let map = match value {
            Value::Object(map) => map,
            _ => {
                self.report(ValidationError::expected_object(location));
                return false;
            }
        };
        let mut matched = true;
        for (key, entry) in map {
            let key_value = Value::String(key.clone());
            let key_location = location.push(LocationSegment::Key(key));
            let key_scope = scope.child(&key_value);
            matched &= self.match_type(key_type, &key_value, &key_scope, &key_location);

            let entry_location = location.push(key.as_str());
            let entry_scope = scope.child(entry);
            matched &= self.match_type(value_type, entry, &entry_scope, &entry_location);
        }
        matched
    }

    fn match_union(
        &mut self,
        items: &[TypeExpr],
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        for item in items {
            if self.probe(item, value, scope, location) {
                return true;
            }
        }
        // Per-branch diagnostics are deliberately discarded
        self.report(ValidationError::no_union_branch(location));
        false
    }

    fn match_conditional(
        &mut self,
        condition: &crate::ast::Predicate,
        then: &TypeExpr,
        otherwise: &TypeExpr,
        value: &Value,
        scope: &Scope<'_>,
        location: &LazyLocation<'_, '_>,
    ) -> bool {
        match predicate::evaluate(condition, scope) {
            Truth::True => self.match_type(then, value, scope, location),
            Truth::False => self.match_type(otherwise, value, scope, location),
            Truth::Undefined => {
                if self.probe(then, value, scope, location)
                    || self.probe(otherwise, value, scope, location)
                {
                    true
                } else {
                    self.report(ValidationError::conditional_mismatch(location));
                    false
                }
            }
        }
    }

    /// Whether a missing field is acceptable under this type, computed
    /// structurally. Shares the matcher's per-type-name depth bound.
    fn admits_absence(&mut self, expr: &TypeExpr, scope: &Scope<'_>) -> bool {
        match expr {
            TypeExpr::Absent => true,
            TypeExpr::Union { items } => {
                for item in items {
                    if self.admits_absence(item, scope) {
                        return true;
                    }
                }
                false
            }
            TypeExpr::Intersection { items } => {
                for item in items {
                    if !self.admits_absence(item, scope) {
                        return false;
                    }
                }
                true
            }
            TypeExpr::Conditional {
                condition,
                then,
                otherwise,
            } => match predicate::evaluate(condition, scope) {
                Truth::True => self.admits_absence(then, scope),
                Truth::False => self.admits_absence(otherwise, scope),
                Truth::Undefined => {
                    self.admits_absence(then, scope) || self.admits_absence(otherwise, scope)
                }
            },
            TypeExpr::Named { name, .. } | TypeExpr::NullableNamed { name } => {
                let repository = self.repository;
                match repository.custom_type(name) {
                    Some(custom) => {
                        if !self.enter_type(name) {
                            return false;
                        }
                        let admits = self.admits_absence(&custom.expr, scope);
                        self.exit_type(name);
                        admits
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn enter_type(&mut self, name: &str) -> bool {
        let depth = self.type_stack.entry(name.to_string()).or_insert(0);
        *depth += 1;
        if *depth > MAX_TYPE_DEPTH {
            *depth -= 1;
            false
        } else {
            true
        }
    }

    fn exit_type(&mut self, name: &str) {
        if let Some(depth) = self.type_stack.get_mut(name) {
            *depth = depth.saturating_sub(1);
        }
    }
}
