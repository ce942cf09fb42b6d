//! Mapping from state tag to shape.

use super::{Shape, ShapeDescription};
use crate::builder::BuildError;
use crate::core::State;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Lookup of a state that has no registered shape.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("no shape registered for state '{state}'")]
pub struct UnknownState {
    pub state: String,
}

struct Entry<S> {
    state: S,
    shape: Arc<dyn Shape>,
}

impl<S: Clone> Clone for Entry<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            shape: Arc::clone(&self.shape),
        }
    }
}

/// Shapes keyed by state, fixed once handed to the builder.
///
/// Entries are keyed by [`State::name`]. Shapes are shared, so cloning a
/// registry is cheap.
///
/// # Example
///
/// ```rust
/// use shapeshift::shape::{FieldType, Schema, ShapeRegistry};
/// use shapeshift::lifecycle_states;
///
/// lifecycle_states! {
///     pub enum Light {
///         Off => "OFF",
///         On => "ON",
///     }
/// }
///
/// let shapes = ShapeRegistry::new()
///     .register(Light::Off, Schema::new())
///     .unwrap()
///     .register(Light::On, Schema::new().field("lumens", FieldType::Integer))
///     .unwrap();
///
/// assert!(shapes.contains(&Light::On));
/// assert!(shapes.register(Light::On, Schema::new()).is_err());
/// ```
pub struct ShapeRegistry<S: State> {
    entries: BTreeMap<String, Entry<S>>,
}

impl<S: State> Clone for ShapeRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S: State> Default for ShapeRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> ShapeRegistry<S> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register the shape for `state`.
    ///
    /// Each state may be registered once.
    pub fn register(
        mut self,
        state: S,
        shape: impl Shape + 'static,
    ) -> Result<Self, BuildError> {
        let key = state.name().to_string();
        if self.entries.contains_key(&key) {
            return Err(BuildError::DuplicateShape { state: key });
        }
        self.entries.insert(
            key,
            Entry {
                state,
                shape: Arc::new(shape),
            },
        );
        Ok(self)
    }

    /// Find the shape for `state`.
    pub fn lookup(&self, state: &S) -> Result<&dyn Shape, UnknownState> {
        self.entries
            .get(state.name())
            .map(|entry| entry.shape.as_ref())
            .ok_or_else(|| UnknownState {
                state: state.name().to_string(),
            })
    }

    /// Describe the shape for `state`.
    pub fn describe(&self, state: &S) -> Result<ShapeDescription, UnknownState> {
        self.lookup(state).map(|shape| shape.describe())
    }

    pub fn contains(&self, state: &S) -> bool {
        self.entries.contains_key(state.name())
    }

    /// Registered states, ordered by name.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.entries.values().map(|entry| &entry.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: State> fmt::Debug for ShapeRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
