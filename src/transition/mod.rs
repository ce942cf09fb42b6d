//! Transitions and the registry that holds them.
//!
//! A transition binds a unique name to a source state, a destination state
//! and an action. Actions are arbitrary caller code: they may be async, may
//! fail, and are not trusted to respect the destination shape, which is why
//! the engine re-validates their output.

mod definition;
mod registry;

pub(crate) use definition::{ActionFailure, ErasedAction};
pub use definition::{ActionError, NoContext, Transition};
pub use registry::TransitionRegistry;
