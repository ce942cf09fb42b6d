//! Ordered, append-only collection of transitions.

use super::definition::Transition;
use crate::builder::BuildError;
use crate::core::State;
use std::sync::Arc;

/// Transitions in registration order.
///
/// `with_transition` returns a new registry and leaves the receiver as it
/// was. Transitions are shared between registries through `Arc`, so the
/// copy is a vector of pointers.
pub struct TransitionRegistry<S: State> {
    transitions: Vec<Arc<Transition<S>>>,
}

impl<S: State> Clone for TransitionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            transitions: self.transitions.clone(),
        }
    }
}

impl<S: State> Default for TransitionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> TransitionRegistry<S> {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Add a transition, returning a new registry.
    ///
    /// Names are unique within a registry.
    pub fn with_transition(&self, transition: Transition<S>) -> Result<Self, BuildError> {
        if self.find_by_name(&transition.name).is_some() {
            return Err(BuildError::DuplicateTransition {
                name: transition.name,
            });
        }

        let mut transitions = self.transitions.clone();
        transitions.push(Arc::new(transition));
        Ok(Self { transitions })
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Transition<S>> {
        self.transitions
            .iter()
            .map(Arc::as_ref)
            .find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition<S>> {
        self.transitions.iter().map(Arc::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|t| t.name.as_str())
    }

    /// Transitions whose source is `state`, in registration order.
    pub fn from_state<'a>(&'a self, state: &'a S) -> impl Iterator<Item = &'a Transition<S>> {
        self.iter().filter(move |t| t.can_execute(state))
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
