//! Errors raised while assembling shapes, transitions and engines.

use thiserror::Error;

/// Errors that can occur when building registries, transitions and engines.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("Transition name is empty. Pass a non-empty name to TransitionBuilder::new")]
    EmptyTransitionName,

    #[error("Transition '{name}' has no source state. Call .from(state)")]
    MissingFromState { name: String },

    #[error("Transition '{name}' has no target state. Call .to(state)")]
    MissingToState { name: String },

    #[error("Transition '{name}' has no action. Call .action(..), .action_fn(..) or .carry_over()")]
    MissingAction { name: String },

    #[error("A shape for state '{state}' is already registered")]
    DuplicateShape { state: String },

    #[error("Transition '{transition}' references state '{state}', which has no registered shape")]
    MissingShape { transition: String, state: String },

    #[error("A transition named '{name}' is already registered")]
    DuplicateTransition { name: String },
}
