//! Staged builder for engines.
//!
//! The stages are distinct types, so the order persistence → shapes →
//! transitions is enforced by the compiler:
//!
//! ```text
//! FsmBuilder::new()        // pick the state type
//!     .with_saver(..)      // -> WithSaver<S>
//!     .with_shapes(..)     // -> Fsm<S>, no transitions yet
//!     .transition(..)?     // -> Fsm<S>, one more transition
//! ```

use crate::core::{State, Subject};
use crate::engine::{Fsm, PersistenceError, Saver};
use crate::shape::ShapeRegistry;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// First stage: choose how results are persisted.
pub struct FsmBuilder<S: State + 'static> {
    _phantom: PhantomData<fn() -> S>,
}

impl<S: State + 'static> FsmBuilder<S> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }

    /// Persist results with an async closure.
    pub fn with_saver<F, Fut>(self, saver: F) -> WithSaver<S>
    where
        F: Fn(Subject<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PersistenceError>> + Send + 'static,
    {
        self.with_persistence(saver)
    }

    /// Persist results with any [`Saver`] implementation.
    pub fn with_persistence(self, saver: impl Saver<S> + 'static) -> WithSaver<S> {
        WithSaver {
            saver: Arc::new(saver),
        }
    }
}

impl<S: State + 'static> Default for FsmBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Second stage: persistence chosen, shapes pending.
///
/// Cloneable, so one saver can back several engines.
pub struct WithSaver<S: State + 'static> {
    saver: Arc<dyn Saver<S>>,
}

impl<S: State + 'static> Clone for WithSaver<S> {
    fn clone(&self) -> Self {
        Self {
            saver: Arc::clone(&self.saver),
        }
    }
}

impl<S: State + 'static> WithSaver<S> {
    /// Fix the shape registry, producing an engine with no transitions.
    pub fn with_shapes(&self, shapes: ShapeRegistry<S>) -> Fsm<S> {
        Fsm::new(Arc::clone(&self.saver), shapes)
    }
}
