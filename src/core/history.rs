//! Receipts of executed transitions and caller-held history.
//!
//! The engine keeps nothing between calls. A receipt describes one
//! completed execution; callers that want an audit trail fold receipts
//! into a [`TransitionHistory`], which is immutable like every other
//! registry in this crate.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Record of one completed transition execution.
///
/// Issued only after validation and persistence both succeeded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionReceipt<S: State> {
    /// Unique id of this execution
    pub id: Uuid,
    /// Name of the transition that ran
    pub transition: String,
    /// Source state
    pub from: S,
    /// Destination state
    pub to: S,
    /// When persistence completed
    pub timestamp: DateTime<Utc>,
}

impl<S: State> TransitionReceipt<S> {
    pub(crate) fn issue(transition: &str, from: S, to: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            transition: transition.to_string(),
            from,
            to,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered receipts for one subject.
///
/// `record` returns a new history; the receiver is never modified.
///
/// # Example
///
/// ```rust
/// use shapeshift::core::{State, TransitionHistory};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Phase { Open }
///
/// impl State for Phase {
///     fn name(&self) -> &str { "OPEN" }
/// }
///
/// let history: TransitionHistory<Phase> = TransitionHistory::new();
/// assert!(history.is_empty());
/// assert!(history.path().is_empty());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionHistory<S: State> {
    receipts: Vec<TransitionReceipt<S>>,
}

impl<S: State> Default for TransitionHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> TransitionHistory<S> {
    pub fn new() -> Self {
        Self {
            receipts: Vec::new(),
        }
    }

    /// Record a receipt, returning a new history.
    pub fn record(&self, receipt: TransitionReceipt<S>) -> Self {
        let mut receipts = self.receipts.clone();
        receipts.push(receipt);
        Self { receipts }
    }

    /// States visited: the first receipt's source, then every destination.
    pub fn path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.receipts.len() + 1);
        if let Some(first) = self.receipts.first() {
            path.push(&first.from);
        }
        path.extend(self.receipts.iter().map(|r| &r.to));
        path
    }

    /// Names of the transitions executed, in order.
    pub fn transition_names(&self) -> Vec<&str> {
        self.receipts.iter().map(|r| r.transition.as_str()).collect()
    }

    /// Time between the first and last receipt, if any were recorded.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.receipts.first()?, self.receipts.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn receipts(&self) -> &[TransitionReceipt<S>] {
        &self.receipts
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}
