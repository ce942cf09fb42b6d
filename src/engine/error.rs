//! Errors raised while executing a transition.

use super::persistence::PersistenceError;
use crate::shape::{UnknownState, Violations};
use crate::transition::ActionError;
use serde_json::Value;
use thiserror::Error;

/// Why an execution did not complete.
///
/// Every step of the pipeline has its own variant, so callers can branch on
/// the cause.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("no transition named '{name}'")]
    TransitionNotFound { name: String },

    #[error("transition '{transition}' starts from '{expected}', but the record is in '{actual}'")]
    StateMismatch {
        transition: String,
        expected: String,
        actual: String,
    },

    #[error("input to '{transition}' does not fit state '{state}': {violations}")]
    InputValidation {
        transition: String,
        state: String,
        violations: Violations,
    },

    #[error("context for '{transition}' could not be decoded: {message}")]
    InvalidContext { transition: String, message: String },

    #[error("action of '{transition}' failed: {source}")]
    Action {
        transition: String,
        #[source]
        source: ActionError,
    },

    #[error("output of '{transition}' does not fit state '{state}': {violations}")]
    OutputValidation {
        transition: String,
        state: String,
        violations: Violations,
    },

    /// The result was valid but could not be saved. `subject` holds the
    /// validated record in its flat form, tag included, so the caller can
    /// retry the save. It is always an object.
    #[error("saving the result of '{transition}' failed: {source}")]
    Persistence {
        transition: String,
        subject: Value,
        #[source]
        source: PersistenceError,
    },

    #[error(transparent)]
    UnknownState(#[from] UnknownState),
}

impl ExecuteError {
    /// Whether retrying can help without changing the input.
    ///
    /// Only persistence failures qualify, and only by re-saving the carried
    /// subject. Action failures are opaque to the engine and report `false`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Name of the transition involved, when one was resolved.
    pub fn transition(&self) -> Option<&str> {
        match self {
            Self::TransitionNotFound { name } => Some(name),
            Self::StateMismatch { transition, .. }
            | Self::InputValidation { transition, .. }
            | Self::InvalidContext { transition, .. }
            | Self::Action { transition, .. }
            | Self::OutputValidation { transition, .. }
            | Self::Persistence { transition, .. } => Some(transition),
            Self::UnknownState(_) => None,
        }
    }
}
