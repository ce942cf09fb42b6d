//! Shapes backed by a Rust type.

use super::violation::Violation;
use super::{Shape, ShapeDescription, ShapeValidation};
use crate::core::{json_kind, Fields};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use stillwater::validation::Validation;

/// Shape that accepts exactly what deserializes into `T`.
///
/// Validation decodes the attributes into `T` and encodes the result back,
/// so serde defaults, renames and ignored fields define the normalization.
/// Serde stops at the first error, so a failure carries one violation.
///
/// # Example
///
/// ```rust
/// use shapeshift::shape::{Shape, TypedShape};
/// use shapeshift::core::Fields;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Onboarded {
///     email: String,
///     full_name: String,
/// }
///
/// let shape = TypedShape::<Onboarded>::new();
/// let fields: Fields = serde_json::from_value(json!({
///     "email": "me@example.com",
///     "full_name": "John Doe",
/// }))
/// .unwrap();
///
/// assert!(shape.validate(&fields).is_success());
/// ```
pub struct TypedShape<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedShape<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for TypedShape<T>
where
    T: Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Shape for TypedShape<T>
where
    T: Serialize + DeserializeOwned,
{
    fn validate(&self, fields: &Fields) -> ShapeValidation {
        let typed: T = match serde_json::from_value(Value::Object(fields.clone())) {
            Ok(typed) => typed,
            Err(e) => {
                return Validation::fail(Violation::Decode {
                    message: e.to_string(),
                })
            }
        };

        match serde_json::to_value(&typed) {
            Ok(Value::Object(normalized)) => Validation::success(normalized),
            Ok(other) => Validation::fail(Violation::NotAnObject {
                found: json_kind(&other).to_string(),
            }),
            Err(e) => Validation::fail(Violation::Decode {
                message: e.to_string(),
            }),
        }
    }

    fn describe(&self) -> ShapeDescription {
        ShapeDescription::Typed {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}
