//! Constraint application: resolving validators, binding their arguments and
//! evaluating their bodies.
use serde_json::Value;

use crate::{
    ast::{Constraint, ConstraintArgs, Expr, TypeExpr, ValidatorBody, ValidatorRule},
    builtins::BuiltinValidator,
    error::ValidationError,
    eval::{
        expr as expr_eval,
        predicate::{self, inject_variables},
    },
    location::LazyLocation,
    matcher::Matcher,
    repository::{CustomValidator, TypeDefinition, ValidatorDefinition},
    scope::Scope,
};

/// Apply every constraint in source order. Earlier failures never suppress
/// later constraints.
pub(crate) fn apply(
    matcher: &mut Matcher<'_>,
    constraints: &[Constraint],
    target: &str,
    value: &Value,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> bool {
    let mut satisfied = true;
    for constraint in constraints {
        satisfied &= apply_one(matcher, constraint, target, value, scope, location);
    }
    satisfied
}

fn apply_one(
    matcher: &mut Matcher<'_>,
    constraint: &Constraint,
    target: &str,
    value: &Value,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> bool {
    let repository = matcher.repository();
    match repository.validator(target, &constraint.name) {
        None => {
            matcher.report(ValidationError::unknown_constraint(
                location,
                target,
                &constraint.name,
            ));
            false
        }
        Some(ValidatorDefinition::Builtin(builtin)) => {
            apply_builtin(matcher, constraint, builtin, value, scope, location)
        }
        Some(ValidatorDefinition::Custom(custom)) => {
            apply_custom(matcher, constraint, custom, value, scope, location)
        }
    }
}

fn apply_builtin(
    matcher: &mut Matcher<'_>,
    constraint: &Constraint,
    builtin: &BuiltinValidator,
    value: &Value,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> bool {
    let argument = match builtin_argument(matcher, constraint, scope, location) {
        Ok(argument) => argument,
        Err(()) => return false,
    };
    if builtin.requires_argument && argument.is_none() {
        matcher.report(ValidationError::missing_argument(location, &constraint.name));
        return false;
    }
    match builtin.evaluate(value, argument.as_ref()) {
        None => {
            matcher.report(ValidationError::constraint_unsupported(
                location,
                &constraint.name,
            ));
            false
        }
        Some(result) => {
            if result != constraint.negated {
                true
            } else {
                matcher.report(ValidationError::constraint_failed(
                    location,
                    &constraint.name,
                    value,
                    argument,
                ));
                false
            }
        }
    }
}

/// Built-ins take at most one argument: a single unnamed call argument, or
/// one of the legacy forms.
fn builtin_argument(
    matcher: &mut Matcher<'_>,
    constraint: &Constraint,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> Result<Option<Value>, ()> {
    match &constraint.args {
        ConstraintArgs::None => Ok(None),
        ConstraintArgs::Call(args) => {
            if let Some(name) = args.iter().find_map(|arg| arg.name.as_deref()) {
                matcher.report(ValidationError::unknown_argument(location, name));
                return Err(());
            }
            if args.len() > 1 {
                matcher.report(ValidationError::too_many_arguments(location, 1, args.len()));
                return Err(());
            }
            match args.first() {
                Some(arg) => eval_argument(matcher, &arg.value, scope, location).map(Some),
                None => Ok(None),
            }
        }
        ConstraintArgs::Single(expr) => eval_argument(matcher, expr, scope, location).map(Some),
        ConstraintArgs::List(exprs) => {
            let mut items = Vec::with_capacity(exprs.len());
            for expr in exprs {
                items.push(eval_argument(matcher, expr, scope, location)?);
            }
            Ok(Some(Value::Array(items)))
        }
    }
}

fn eval_argument(
    matcher: &mut Matcher<'_>,
    expr: &Expr,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> Result<Value, ()> {
    expr_eval::evaluate(expr, scope).map_err(|error| {
        matcher.report(ValidationError::expression(location, error.code, error.detail));
    })
}

fn apply_custom(
    matcher: &mut Matcher<'_>,
    constraint: &Constraint,
    validator: &CustomValidator,
    value: &Value,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> bool {
    let bindings = match bind_arguments(matcher, validator, constraint, scope, location) {
        Some(bindings) => bindings,
        // The binder already reported why
        None => return false,
    };
    let body_scope = scope.enter_validator(value, bindings);
    let (result, message) = evaluate_body(&validator.body, value, &body_scope);
    match result {
        None => {
            matcher.report(ValidationError::validator_unsupported(
                location,
                &validator.target_type,
                &validator.name,
            ));
            false
        }
        Some(result) => {
            if result != constraint.negated {
                true
            } else {
                matcher.report(ValidationError::validator_failed(
                    location,
                    &validator.target_type,
                    &validator.name,
                    message,
                ));
                false
            }
        }
    }
}

fn evaluate_body(
    body: &ValidatorBody,
    value: &Value,
    scope: &Scope<'_>,
) -> (Option<bool>, Option<String>) {
    match body {
        ValidatorBody::Regex { pattern, negated } => {
            (regex_rule(value, pattern, *negated, scope), None)
        }
        ValidatorBody::Predicate { pred } => (predicate::evaluate(pred, scope).as_bool(), None),
        ValidatorBody::Detailed { rule, message } => {
            let result = match rule {
                ValidatorRule::Regex { pattern, negated } => {
                    regex_rule(value, pattern, *negated, scope)
                }
                ValidatorRule::Predicate { pred } => predicate::evaluate(pred, scope).as_bool(),
            };
            (result, Some(message.clone()))
        }
    }
}

/// A regex body requires a string value; anything else simply fails the
/// rule. A pattern that does not compile is undecidable instead.
fn regex_rule(value: &Value, pattern: &str, negated: bool, scope: &Scope<'_>) -> Option<bool> {
    let subject = match value.as_str() {
        Some(subject) => subject,
        None => return Some(false),
    };
    let pattern = inject_variables(pattern, scope);
    let regex = fancy_regex::Regex::new(&pattern).ok()?;
    let matched = regex.is_match(subject).ok()?;
    Some(matched != negated)
}

/// Bind the constraint's arguments to the validator's parameters, or report
/// the first violation of the calling convention and bail.
fn bind_arguments(
    matcher: &mut Matcher<'_>,
    validator: &CustomValidator,
    constraint: &Constraint,
    scope: &Scope<'_>,
    location: &LazyLocation<'_, '_>,
) -> Option<Vec<(String, Value)>> {
    let params = &validator.params;
    let mut bound: Vec<(String, Value)> = Vec::with_capacity(params.len());

    match &constraint.args {
        ConstraintArgs::None => {}
        ConstraintArgs::Call(args) => {
            let mut seen_named = false;
            let mut positional = 0usize;
            for arg in args {
                match &arg.name {
                    Some(name) => {
                        seen_named = true;
                        if !params.iter().any(|param| &param.name == name) {
                            matcher.report(ValidationError::unknown_argument(location, name));
                            return None;
                        }
                        if is_bound(&bound, name) {
                            matcher.report(ValidationError::duplicate_argument(location, name));
                            return None;
                        }
                        let value = eval_argument(matcher, &arg.value, scope, location).ok()?;
                        bound.push((name.clone(), value));
                    }
                    None => {
                        if seen_named {
                            matcher.report(ValidationError::positional_after_named(
                                location,
                                &validator.name,
                            ));
                            return None;
                        }
                        if positional >= params.len() {
                            matcher.report(ValidationError::too_many_arguments(
                                location,
                                params.len(),
                                args.len(),
                            ));
                            return None;
                        }
                        let value = eval_argument(matcher, &arg.value, scope, location).ok()?;
                        bound.push((params[positional].name.clone(), value));
                        positional += 1;
                    }
                }
            }
        }
        ConstraintArgs::Single(expr) => {
            if params.is_empty() {
                matcher.report(ValidationError::too_many_arguments(location, 0, 1));
                return None;
            }
            let value = eval_argument(matcher, expr, scope, location).ok()?;
            bound.push((params[0].name.clone(), value));
        }
        ConstraintArgs::List(exprs) => {
            if exprs.len() > params.len() {
                matcher.report(ValidationError::too_many_arguments(
                    location,
                    params.len(),
                    exprs.len(),
                ));
                return None;
            }
            for (param, expr) in params.iter().zip(exprs) {
                let value = eval_argument(matcher, expr, scope, location).ok()?;
                bound.push((param.name.clone(), value));
            }
        }
    }

    // Defaults run against the outer scope plus whatever is bound so far,
    // in parameter order, so later defaults see earlier ones.
    for index in 0..params.len() {
        let param = &params[index];
        if is_bound(&bound, &param.name) {
            continue;
        }
        if let Some(default) = &param.default {
            let augmented = scope.augmented(bound.iter().cloned());
            match expr_eval::evaluate(default, &augmented) {
                Ok(value) => bound.push((param.name.clone(), value)),
                Err(error) => {
                    matcher.report(ValidationError::expression(
                        location,
                        error.code,
                        error.detail,
                    ));
                    return None;
                }
            }
        }
    }

    for param in params {
        if !is_bound(&bound, &param.name) {
            matcher.report(ValidationError::missing_argument(location, &param.name));
            return None;
        }
    }

    // Type hints that resolve to a repository type must hold; unknown hints
    // are tolerated.
    for param in params {
        let hint = match &param.type_hint {
            Some(hint) => hint,
            None => continue,
        };
        let value = match bound.iter().find(|(name, _)| name == &param.name) {
            Some((_, value)) => value.clone(),
            None => continue,
        };
        let satisfied = match matcher.repository().type_definition(hint) {
            Some(TypeDefinition::Builtin(ty)) => ty.matches(&value),
            Some(TypeDefinition::Custom(_)) => {
                let expr = TypeExpr::Named {
                    name: hint.clone(),
                    constraints: Vec::new(),
                };
                let hint_scope = Scope::new(&value);
                let hint_location = LazyLocation::new();
                matcher.probe(&expr, &value, &hint_scope, &hint_location)
            }
            None => true,
        };
        if !satisfied {
            matcher.report(ValidationError::argument_type_mismatch(
                location,
                &param.name,
                hint,
            ));
            return None;
        }
    }

    Some(bound)
}

fn is_bound(bound: &[(String, Value)], name: &str) -> bool {
    bound.iter().any(|(bound_name, _)| bound_name == name)
}
