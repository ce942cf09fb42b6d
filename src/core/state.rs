//! State tags for lifecycle entities.
//!
//! A state tag names which shape currently governs a subject. The set of
//! tags is closed: it is an enum owned by the application, and every value
//! of it must have a shape registered before a transition may reference it.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Key under which a subject's state tag is stored in its flat record form.
///
/// Shapes never see this key; the engine strips it from inputs and assigns
/// it itself on outputs.
pub const STATE_TAG: &str = "state";

/// Trait for lifecycle state tags.
///
/// All methods are pure. A state tag carries no data of its own; the data
/// that belongs to a state lives in the subject's fields and is described by
/// the shape registered for that state.
///
/// # Required Traits
///
/// - `Clone`: tags are copied into receipts and results
/// - `PartialEq`: the engine compares a record's tag with a transition's source
/// - `Debug`: tags appear in diagnostics
/// - `Serialize` + `Deserialize`: tags are written into the flat record form
///
/// # Example
///
/// ```rust
/// use shapeshift::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// enum UserState {
///     Created,
///     Verified,
///     Onboarded,
///     Banned,
/// }
///
/// impl State for UserState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Created => "CREATED",
///             Self::Verified => "VERIFIED",
///             Self::Onboarded => "ONBOARDED",
///             Self::Banned => "BANNED",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Onboarded | Self::Banned)
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Banned)
///     }
/// }
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the tag's name for errors, logs and shape lookup.
    ///
    /// Names must be unique across the tag set. They usually match the
    /// serialized form of the tag, though nothing requires it.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Purely informational: the engine allows transitions out of final
    /// states if they are registered.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Purely informational: the engine never consults it, so error states
    /// accept outgoing transitions like any other.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
