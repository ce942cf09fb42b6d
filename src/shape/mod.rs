//! Per-state shapes and their registry.
//!
//! A shape validates "all attributes except the state tag" for one state.
//! Validation uses Stillwater's `Validation` so that every violation in a
//! record is reported in one pass instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use shapeshift::shape::{FieldType, Schema, Shape};
//! use shapeshift::core::Fields;
//! use serde_json::json;
//!
//! let verified = Schema::new()
//!     .field("email", FieldType::Email)
//!     .field("verified_at", FieldType::DateTime)
//!     .field("full_name", FieldType::Null);
//!
//! let fields: Fields = serde_json::from_value(json!({
//!     "email": "me@example.com",
//!     "verified_at": "2024-05-01T10:00:00+02:00",
//!     "full_name": null,
//! }))
//! .unwrap();
//!
//! assert!(verified.validate(&fields).is_success());
//! ```

mod registry;
mod schema;
mod typed;
mod violation;

pub use registry::{ShapeRegistry, UnknownState};
pub use schema::{FieldType, Schema, UnknownFields};
pub use typed::TypedShape;
pub use violation::{Violation, Violations};

use crate::core::Fields;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result of validating a subject's attributes against a shape.
///
/// On success it carries the normalized attributes, which are what the
/// engine passes onward instead of the raw input.
pub type ShapeValidation = Validation<Fields, NonEmptyVec<Violation>>;

/// Validator for the attributes of one state.
///
/// Implementations must be pure: the outcome depends only on `fields`.
pub trait Shape: Send + Sync {
    /// Validate and normalize `fields`.
    fn validate(&self, fields: &Fields) -> ShapeValidation;

    /// Describe the accepted attributes, for documentation and introspection.
    fn describe(&self) -> ShapeDescription {
        ShapeDescription::Opaque
    }
}

/// Serializable description of a shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDescription {
    /// A declarative [`Schema`].
    Schema {
        fields: Vec<FieldDescription>,
        unknown_fields: UnknownFields,
    },

    /// A [`TypedShape`] backed by a Rust type.
    Typed { type_name: String },

    /// A custom shape that does not describe itself.
    Opaque,
}

/// One attribute of a [`ShapeDescription::Schema`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    pub field_type: String,
    pub required: bool,
}
