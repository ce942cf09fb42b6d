//! Shape violations.

use std::fmt;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A single reason a value does not fit a shape.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Violation {
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("unexpected field '{field}'")]
    UnexpectedField { field: String },

    #[error("expected an object, found {found}")]
    NotAnObject { found: String },

    #[error("{message}")]
    Decode { message: String },

    #[error("rule failed: {message}")]
    RuleFailed { message: String },
}

impl Violation {
    /// The field the violation refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::TypeMismatch { field, .. }
            | Self::InvalidValue { field, .. }
            | Self::UnexpectedField { field } => Some(field),
            Self::NotAnObject { .. } | Self::Decode { .. } | Self::RuleFailed { .. } => None,
        }
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn single(violation: Violation) -> Self {
        Self(vec![violation])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any violation refers to `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field() == Some(field))
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

impl From<NonEmptyVec<Violation>> for Violations {
    fn from(errors: NonEmptyVec<Violation>) -> Self {
        Self(errors.iter().cloned().collect())
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}
