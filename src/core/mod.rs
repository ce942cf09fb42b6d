//! Core value types.
//!
//! - State tags via the `State` trait
//! - Subjects: a tag plus the attributes its state prescribes
//! - Receipts and immutable history of executed transitions
//!
//! Everything here is plain data with pure methods.

mod history;
mod state;
mod subject;

pub use history::{TransitionHistory, TransitionReceipt};
pub use state::{State, STATE_TAG};
pub(crate) use subject::json_kind;
pub use subject::{Fields, Subject};
