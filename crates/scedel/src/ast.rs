//! The Scedel schema AST.
//!
//! Every node family is a closed, exhaustively-matched sum type. The engine
//! never interprets schema *source text*; it consumes these trees, which an
//! external parser (or [`SchemaRepository::from_json`]) produces.
//!
//! All nodes (de)serialize with a `kind` discriminant, so a schema
//! repository can be stored as a plain JSON document:
//!
//! ```rust
//! use scedel::ast::TypeExpr;
//! use serde_json::json;
//!
//! let expr: TypeExpr = serde_json::from_value(json!({
//!     "kind": "array",
//!     "item": {"kind": "named", "name": "String"}
//! })).expect("well-formed type expression");
//! assert!(matches!(expr, TypeExpr::Array { .. }));
//! ```
//!
//! [`SchemaRepository::from_json`]: crate::SchemaRepository::from_json
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A type expression: one node of the tree a JSON value is matched against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeExpr {
    /// No value may be present at this position.
    Absent,
    /// The value must equal the given scalar literal, strictly.
    Literal { value: Value },
    /// Reference to a built-in or user-defined type, plus inline constraints.
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        constraints: Vec<Constraint>,
    },
    /// Like [`TypeExpr::Named`], but JSON `null` is accepted as well.
    NullableNamed { name: String },
    /// JSON `null`, or a value matching the inner expression.
    Nullable { inner: Box<TypeExpr> },
    /// A JSON array whose every item matches `item`.
    Array {
        item: Box<TypeExpr>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        constraints: Vec<Constraint>,
    },
    /// A JSON object with a closed set of declared fields.
    Record { fields: Vec<Field> },
    /// A JSON object with homogeneous keys and values.
    Dict {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// The value must match at least one branch.
    Union { items: Vec<TypeExpr> },
    /// The value must match every branch.
    Intersection { items: Vec<TypeExpr> },
    /// Branch chosen by a predicate over the enclosing scope.
    Conditional {
        condition: Predicate,
        then: Box<TypeExpr>,
        #[serde(rename = "else")]
        otherwise: Box<TypeExpr>,
    },
}

/// One declared field of a record type.
///
/// A `default` expression does not materialize a value into the instance; it
/// only excuses the field's absence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
}

/// A named check attached to a type, resolved against a validator in the
/// repository at application time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    #[serde(default, skip_serializing_if = "ConstraintArgs::is_none")]
    pub args: ConstraintArgs,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
}

/// How a constraint passes arguments to its validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintArgs {
    /// No argument at all.
    None,
    /// `name(arg, key: arg)` call syntax.
    Call(Vec<CallArg>),
    /// Legacy `name: expr` form, a single expression.
    Single(Box<Expr>),
    /// Legacy list form, bound positionally.
    List(Vec<Expr>),
}

impl ConstraintArgs {
    pub fn is_none(&self) -> bool {
        matches!(self, ConstraintArgs::None)
    }
}

impl Default for ConstraintArgs {
    fn default() -> Self {
        ConstraintArgs::None
    }
}

/// One argument inside constraint call syntax.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Expr,
}

/// An expression, as used in constraint arguments, parameter defaults and
/// validator bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    EmptyList,
    Path {
        root: PathRoot,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        segments: Vec<String>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Expr>,
    },
    /// A predicate used in expression position; its boolean result is lifted
    /// into a value.
    Predicate {
        pred: Box<Predicate>,
    },
}

/// A scalar literal. Durations carry their value in integer milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Duration { ms: i64 },
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// The anchor a path expression starts from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "base", content = "name", rename_all = "lowercase")]
pub enum PathRoot {
    /// The scope's current value.
    This,
    /// The scope's parent value.
    Parent,
    /// The root of the validated document.
    Root,
    /// A field looked up on the current value.
    Ident(String),
    /// A scope variable, with or without its `$` sigil.
    Var(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Neg,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

/// A predicate with tri-valued semantics: it may hold, fail, or be
/// undecidable for the value at hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Predicate {
    Not {
        inner: Box<Predicate>,
    },
    And {
        lhs: Box<Predicate>,
        rhs: Box<Predicate>,
    },
    Or {
        lhs: Box<Predicate>,
        rhs: Box<Predicate>,
    },
    Compare {
        lhs: Expr,
        op: CmpOp,
        rhs: Expr,
    },
    /// The expression's string value must match the regex pattern.
    Matches {
        expr: Expr,
        pattern: String,
    },
    /// Any other expression, coerced to a boolean.
    Expr {
        expr: Box<Expr>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

/// One parameter of a user-defined validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
}

/// The executable body of a user-defined validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidatorBody {
    /// The validated string must (or, negated, must not) match the pattern.
    Regex {
        pattern: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        negated: bool,
    },
    /// The predicate must hold for the validator scope.
    Predicate { pred: Predicate },
    /// A rule bundled with a custom human-readable failure message.
    Detailed {
        rule: ValidatorRule,
        message: String,
    },
}

/// The rule inside a [`ValidatorBody::Detailed`] body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidatorRule {
    Regex {
        pattern: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        negated: bool,
    },
    Predicate { pred: Predicate },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_expressions_round_trip() {
        let expr = TypeExpr::Record {
            fields: vec![Field {
                name: "id".to_string(),
                ty: TypeExpr::Named {
                    name: "Int".to_string(),
                    constraints: Vec::new(),
                },
                optional: false,
                default: None,
            }],
        };
        let encoded = serde_json::to_value(&expr).expect("serializable");
        assert_eq!(
            encoded,
            json!({
                "kind": "record",
                "fields": [{"name": "id", "type": {"kind": "named", "name": "Int"}}]
            })
        );
        let decoded: TypeExpr = serde_json::from_value(encoded).expect("deserializable");
        assert_eq!(decoded, expr);
    }

    #[test]
    fn duration_literals_are_distinguished_from_numbers() {
        let duration: Literal = serde_json::from_value(json!({"ms": 3_600_000})).expect("duration");
        assert_eq!(duration, Literal::Duration { ms: 3_600_000 });
        let int: Literal = serde_json::from_value(json!(42)).expect("int");
        assert_eq!(int, Literal::Int(42));
        let float: Literal = serde_json::from_value(json!(1.5)).expect("float");
        assert_eq!(float, Literal::Float(1.5));
    }

    #[test]
    fn path_roots_carry_their_names() {
        let path: Expr = serde_json::from_value(json!({
            "kind": "path",
            "root": {"base": "ident", "name": "status"},
        }))
        .expect("path");
        assert_eq!(
            path,
            Expr::Path {
                root: PathRoot::Ident("status".to_string()),
                segments: Vec::new(),
            }
        );
    }

    #[test]
    fn conditional_uses_the_else_keyword() {
        let expr: TypeExpr = serde_json::from_value(json!({
            "kind": "conditional",
            "condition": {
                "kind": "compare",
                "lhs": {"kind": "path", "root": {"base": "ident", "name": "status"}},
                "op": "==",
                "rhs": {"kind": "literal", "value": "Rejected"}
            },
            "then": {"kind": "named", "name": "String"},
            "else": {"kind": "absent"}
        }))
        .expect("conditional");
        assert!(matches!(expr, TypeExpr::Conditional { .. }));
    }
}
