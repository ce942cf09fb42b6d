//! Transition definitions with caller-supplied actions.

use crate::builder::TransitionBuilder;
use crate::core::{State, Subject};
use crate::BoxError;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Context type for transitions that take none. Accepts any value.
pub type NoContext = serde::de::IgnoredAny;

/// Failure reported by a transition action.
///
/// The engine does not classify action failures; it forwards them as-is.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ActionError {
    /// A business-rule rejection with no underlying error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying failure, such as a downstream call error.
    pub fn failed(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why an erased action did not produce output.
#[derive(Debug)]
pub(crate) enum ActionFailure {
    /// Context did not decode into the action's context type
    Context(String),
    /// The action itself failed
    Action(ActionError),
    /// The action's output did not encode to JSON
    Output(String),
}

/// Type-erased action: validated input subject and JSON context in, JSON
/// attributes out. Erasure lets one registry hold transitions whose context
/// and output types differ.
pub(crate) type ErasedAction<S> =
    Arc<dyn Fn(Subject<S>, Value) -> BoxFuture<'static, Result<Value, ActionFailure>> + Send + Sync>;

/// A named, directed edge between two states, carrying the action that
/// produces the destination state's attributes.
pub struct Transition<S: State> {
    pub name: String,
    pub from: S,
    pub to: S,
    pub description: Option<String>,
    pub(crate) action: ErasedAction<S>,
}

impl<S: State + 'static> Transition<S> {
    /// Start building a transition called `name`.
    pub fn builder(name: impl Into<String>) -> TransitionBuilder<S> {
        TransitionBuilder::new(name)
    }
}

impl<S: State> Transition<S> {
    /// Check if a subject tagged `current` may take this transition (pure).
    ///
    /// Only the tag is compared; attribute shapes are checked at execution.
    pub fn can_execute(&self, current: &S) -> bool {
        *current == self.from
    }

    pub(crate) fn invoke(
        &self,
        subject: Subject<S>,
        context: Value,
    ) -> BoxFuture<'static, Result<Value, ActionFailure>> {
        (self.action)(subject, context)
    }
}

impl<S: State> Clone for Transition<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            description: self.description.clone(),
            action: Arc::clone(&self.action),
        }
    }
}

impl<S: State> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
