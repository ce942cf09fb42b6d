//! Builder API for assembling engines.
//!
//! This module provides the staged [`FsmBuilder`], the fluent
//! [`TransitionBuilder`] and the [`lifecycle_states!`](crate::lifecycle_states)
//! macro for declaring state tags with little boilerplate.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::{FsmBuilder, WithSaver};
pub use transition::TransitionBuilder;

use crate::core::State;
use crate::transition::Transition;

/// Create a transition that keeps the subject's attributes unchanged.
///
/// # Example
///
/// ```
/// use shapeshift::builder::carry_over_transition;
/// use shapeshift::lifecycle_states;
///
/// lifecycle_states! {
///     enum Visibility {
///         Private => "PRIVATE",
///         Public => "PUBLIC",
///     }
/// }
///
/// let publish = carry_over_transition("PUBLISH", Visibility::Private, Visibility::Public).unwrap();
/// assert!(publish.can_execute(&Visibility::Private));
/// ```
pub fn carry_over_transition<S>(
    name: impl Into<String>,
    from: S,
    to: S,
) -> Result<Transition<S>, BuildError>
where
    S: State + 'static,
{
    TransitionBuilder::new(name)
        .from(from)
        .to(to)
        .carry_over()
        .build()
}
