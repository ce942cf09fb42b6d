//! Persistence collaborator.

use crate::core::{State, Subject};
use crate::BoxError;
use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use thiserror::Error;

/// Failure reported by a saver.
///
/// The subject handed to the saver was already validated; a persistence
/// failure means it is valid but not durable.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PersistenceError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying storage error.
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

/// Stores the result of a successful transition.
///
/// Called exactly once per successful execution, after both validations
/// passed. The saver receives its own copy of the subject.
///
/// Any `Fn(Subject<S>) -> impl Future<Output = Result<(), PersistenceError>>`
/// closure is a saver.
pub trait Saver<S: State>: Send + Sync {
    fn save(&self, subject: Subject<S>) -> BoxFuture<'_, Result<(), PersistenceError>>;
}

impl<S, F, Fut> Saver<S> for F
where
    S: State,
    F: Fn(Subject<S>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), PersistenceError>> + Send + 'static,
{
    fn save(&self, subject: Subject<S>) -> BoxFuture<'_, Result<(), PersistenceError>> {
        self(subject).boxed()
    }
}
