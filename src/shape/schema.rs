//! Declarative field-list shapes.

use super::violation::Violation;
use super::{FieldDescription, Shape, ShapeDescription, ShapeValidation};
use crate::core::{json_kind, Fields, STATE_TAG};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// What a [`Schema`] does with attributes it does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    /// Drop them from the normalized output
    #[default]
    Strip,

    /// Report each one as a violation
    Reject,
}

/// Accepted type of one attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    Any,
    Null,
    Bool,
    Integer,
    Number,
    String,
    NonEmptyString,
    /// `local@domain.tld`
    Email,
    /// RFC 3339 string, normalized to UTC
    DateTime,
    Object,
    Literal(Value),
    Nullable(Box<FieldType>),
    Array(Box<FieldType>),
}

type FieldCheck = Validation<Value, NonEmptyVec<Violation>>;

impl FieldType {
    pub fn nullable(inner: FieldType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn array_of(inner: FieldType) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Check one value, returning its normalized form.
    fn check(&self, path: &str, value: &Value) -> FieldCheck {
        match (self, value) {
            (Self::Any, v) => Validation::success(v.clone()),
            (Self::Null, Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Number, Value::Number(_))
            | (Self::String, Value::String(_))
            | (Self::Object, Value::Object(_)) => Validation::success(value.clone()),
            (Self::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Validation::success(value.clone())
            }
            (Self::NonEmptyString, Value::String(s)) => {
                if s.trim().is_empty() {
                    invalid(path, "must not be empty")
                } else {
                    Validation::success(value.clone())
                }
            }
            (Self::Email, Value::String(s)) => {
                if is_email(s) {
                    Validation::success(value.clone())
                } else {
                    invalid(path, "not a valid email address")
                }
            }
            (Self::DateTime, Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
                Ok(parsed) => Validation::success(Value::String(
                    parsed
                        .with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                )),
                Err(e) => invalid(path, &format!("not an RFC 3339 date-time ({e})")),
            },
            (Self::Literal(expected), v) => {
                if v == expected {
                    Validation::success(v.clone())
                } else {
                    invalid(path, &format!("expected literal {expected}"))
                }
            }
            (Self::Nullable(_), Value::Null) => Validation::success(Value::Null),
            (Self::Nullable(inner), v) => inner.check(path, v),
            (Self::Array(inner), Value::Array(items)) => {
                let checks = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| inner.check(&format!("{path}[{i}]"), item))
                    .collect();
                Validation::all_vec(checks).map(Value::Array)
            }
            (expected, found) => Validation::fail(Violation::TypeMismatch {
                field: path.to_string(),
                expected: expected.to_string(),
                found: json_kind(found).to_string(),
            }),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Null => f.write_str("null"),
            Self::Bool => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::NonEmptyString => f.write_str("non-empty string"),
            Self::Email => f.write_str("email"),
            Self::DateTime => f.write_str("date-time"),
            Self::Object => f.write_str("object"),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Nullable(inner) => write!(f, "{inner} or null"),
            Self::Array(inner) => write!(f, "array of {inner}"),
        }
    }
}

fn invalid(path: &str, message: &str) -> FieldCheck {
    Validation::fail(Violation::InvalidValue {
        field: path.to_string(),
        message: message.to_string(),
    })
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

#[derive(Clone, Debug)]
struct FieldSpec {
    name: String,
    field_type: FieldType,
    required: bool,
}

/// Cross-field rule evaluated on normalized attributes.
pub type SchemaRule = Arc<dyn Fn(&Fields) -> Result<(), Violation> + Send + Sync>;

/// Shape declared as a list of typed attributes.
///
/// Declared fields are required unless added with [`Schema::optional`]. A
/// required field whose type admits `null` must still be present. Rules
/// added with [`Schema::require`] run only once every field is valid, and
/// see the normalized values.
///
/// # Example
///
/// ```rust
/// use shapeshift::shape::{FieldType, Schema, Shape, UnknownFields};
/// use shapeshift::core::Fields;
/// use serde_json::json;
///
/// let created = Schema::new()
///     .field("email", FieldType::Email)
///     .field("verified_at", FieldType::Null)
///     .unknown_fields(UnknownFields::Reject);
///
/// let fields: Fields = serde_json::from_value(json!({
///     "email": "me@example.com",
///     "verified_at": null,
///     "nickname": "me",
/// }))
/// .unwrap();
///
/// assert!(created.validate(&fields).is_failure());
/// ```
#[derive(Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    unknown_fields: UnknownFields,
    rules: Vec<SchemaRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required attribute. Redeclaring a name replaces it.
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.declare(name.into(), field_type, true)
    }

    /// Declare an attribute that may be absent.
    pub fn optional(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.declare(name.into(), field_type, false)
    }

    /// Set the unknown-attribute policy (default: strip).
    pub fn unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Add a cross-field rule.
    pub fn require<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Fields) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Add a cross-field predicate with an error message.
    pub fn require_pred<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Fields) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        self.require(move |fields| {
            if predicate(fields) {
                Ok(())
            } else {
                Err(Violation::RuleFailed {
                    message: message.clone(),
                })
            }
        })
    }

    pub fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|spec| spec.name == name)
    }

    fn declare(mut self, name: String, field_type: FieldType, required: bool) -> Self {
        self.fields.retain(|spec| spec.name != name);
        self.fields.push(FieldSpec {
            name,
            field_type,
            required,
        });
        self
    }

    fn check_rules(&self, fields: Fields) -> ShapeValidation {
        let checks: Vec<Validation<(), NonEmptyVec<Violation>>> = self
            .rules
            .iter()
            .map(|rule| match rule(&fields) {
                Ok(()) => Validation::success(()),
                Err(violation) => Validation::fail(violation),
            })
            .collect();

        Validation::all_vec(checks).map(|_| fields)
    }
}

impl Shape for Schema {
    fn validate(&self, fields: &Fields) -> ShapeValidation {
        let mut checks: Vec<Validation<Option<(String, Value)>, NonEmptyVec<Violation>>> =
            Vec::with_capacity(self.fields.len());

        for spec in &self.fields {
            let check = match fields.get(&spec.name) {
                Some(value) => spec
                    .field_type
                    .check(&spec.name, value)
                    .map(|normalized| Some((spec.name.clone(), normalized))),
                None if spec.required => Validation::fail(Violation::MissingField {
                    field: spec.name.clone(),
                }),
                None => Validation::success(None),
            };
            checks.push(check);
        }

        if self.unknown_fields == UnknownFields::Reject {
            for key in fields.keys() {
                if key != STATE_TAG && !self.declares(key) {
                    checks.push(Validation::fail(Violation::UnexpectedField {
                        field: key.clone(),
                    }));
                }
            }
        }

        let normalized = Validation::all_vec(checks)
            .map(|entries| entries.into_iter().flatten().collect::<Fields>());

        match normalized {
            Validation::Success(fields) => self.check_rules(fields),
            failure => failure,
        }
    }

    fn describe(&self) -> ShapeDescription {
        ShapeDescription::Schema {
            fields: self
                .fields
                .iter()
                .map(|spec| FieldDescription {
                    name: spec.name.clone(),
                    field_type: spec.field_type.to_string(),
                    required: spec.required,
                })
                .collect(),
            unknown_fields: self.unknown_fields,
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("unknown_fields", &self.unknown_fields)
            .field("rules", &self.rules.len())
            .finish()
    }
}
