//! Shapeshift: lifecycle state machines whose entities change shape
//!
//! A subject carries a state tag, and each state prescribes which attributes
//! the subject has. Transitions move a subject from one state to the next
//! through a caller-supplied action, and the engine checks the subject's
//! shape on the way in and on the way out.
//!
//! # Core Concepts
//!
//! - **State**: a closed set of tags via the `State` trait (or the
//!   `lifecycle_states!` macro)
//! - **Subject**: a tag plus attributes, flat in its JSON form
//! - **Shape**: a pure validator for the attributes of one state
//! - **Transition**: a named edge with an async action
//! - **Fsm**: the engine that executes transitions and saves the results
//!
//! # Example
//!
//! ```rust
//! use shapeshift::prelude::*;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! lifecycle_states! {
//!     pub enum UserState {
//!         Created => "CREATED",
//!         Verified => "VERIFIED",
//!     }
//! }
//!
//! #[derive(Deserialize)]
//! struct Verification {
//!     at: String,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let shapes = ShapeRegistry::new()
//!     .register(UserState::Created, Schema::new().field("email", FieldType::Email))
//!     .unwrap()
//!     .register(
//!         UserState::Verified,
//!         Schema::new()
//!             .field("email", FieldType::Email)
//!             .field("verified_at", FieldType::DateTime),
//!     )
//!     .unwrap();
//!
//! let fsm = FsmBuilder::new()
//!     .with_saver(|_user: Subject<UserState>| async { Ok(()) })
//!     .with_shapes(shapes)
//!     .transition(
//!         TransitionBuilder::new("VERIFY")
//!             .from(UserState::Created)
//!             .to(UserState::Verified)
//!             .action_fn(|user, ctx: Verification| {
//!                 Ok(json!({ "email": user.get("email"), "verified_at": ctx.at }))
//!             }),
//!     )
//!     .unwrap();
//!
//! let user = Subject::new(UserState::Created).with("email", "me@example.com");
//! let user = fsm
//!     .execute("VERIFY", user, json!({ "at": "2024-05-01T08:00:00Z" }))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(user.state(), &UserState::Verified);
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod shape;
pub mod transition;

/// Boxed error used as the source of action and persistence failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// Re-export commonly used types
pub use builder::{BuildError, FsmBuilder, TransitionBuilder, WithSaver};
pub use core::{Fields, State, Subject, TransitionHistory, TransitionReceipt};
pub use engine::{ExecuteError, Fsm, PersistenceError, Saver, Transitioned};
pub use shape::{FieldType, Schema, Shape, ShapeRegistry, TypedShape, Violation, Violations};
pub use transition::{ActionError, NoContext, Transition};

/// Everything needed to declare and run a lifecycle.
pub mod prelude {
    pub use crate::builder::{BuildError, FsmBuilder, TransitionBuilder};
    pub use crate::core::{Fields, State, Subject};
    pub use crate::engine::{ExecuteError, Fsm, PersistenceError};
    pub use crate::lifecycle_states;
    pub use crate::shape::{FieldType, Schema, Shape, ShapeRegistry, TypedShape};
    pub use crate::transition::{ActionError, NoContext};
}
