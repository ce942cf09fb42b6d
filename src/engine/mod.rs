//! Execution engine and its persistence collaborator.
//!
//! [`Fsm`] is the only way to move a subject between states. Each call runs
//! the same linear pipeline:
//!
//! 1. resolve the transition by name
//! 2. check the subject's tag against the transition's source state
//! 3. validate the attributes against the source shape
//! 4. run the action
//! 5. validate the action's output against the destination shape
//! 6. tag the result with the destination state
//! 7. save it
//!
//! Any failure stops the pipeline and is returned as an [`ExecuteError`].
//! Nothing is retried.

mod error;
mod machine;
mod persistence;

pub use error::ExecuteError;
pub use machine::{Fsm, Transitioned};
pub use persistence::{PersistenceError, Saver};
