//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::{State, Subject};
use crate::transition::{ActionError, ActionFailure, ErasedAction, NoContext, Transition};
use futures_util::future::{self, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Builder for constructing transitions with a fluent API.
///
/// # Example
///
/// ```rust
/// use shapeshift::builder::TransitionBuilder;
/// use shapeshift::lifecycle_states;
/// use serde::Deserialize;
/// use serde_json::json;
///
/// lifecycle_states! {
///     pub enum UserState {
///         Verified => "VERIFIED",
///         Onboarded => "ONBOARDED",
///     }
/// }
///
/// #[derive(Deserialize)]
/// struct OnboardContext {
///     full_name: String,
/// }
///
/// let onboard = TransitionBuilder::new("ONBOARD")
///     .from(UserState::Verified)
///     .to(UserState::Onboarded)
///     .action(|user, ctx: OnboardContext| async move {
///         Ok(json!({
///             "email": user.get("email"),
///             "verified_at": user.get("verified_at"),
///             "full_name": ctx.full_name,
///         }))
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(onboard.name, "ONBOARD");
/// ```
pub struct TransitionBuilder<S: State> {
    name: String,
    from: Option<S>,
    to: Option<S>,
    description: Option<String>,
    action: Option<ErasedAction<S>>,
}

impl<S: State + 'static> TransitionBuilder<S> {
    /// Create a builder for a transition called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: None,
            to: None,
            description: None,
            action: None,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the destination state (required).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Attach a human-readable description (optional).
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set an async action (required unless another action setter is used).
    ///
    /// The action receives the validated input subject and the execution
    /// context decoded into `C`, and returns attributes for the destination
    /// state. Output may be any serializable value; the engine validates it
    /// against the destination shape.
    pub fn action<C, O, F, Fut>(mut self, action: F) -> Self
    where
        C: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(Subject<S>, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ActionError>> + Send + 'static,
    {
        let erased: ErasedAction<S> = Arc::new(move |subject: Subject<S>, context: Value| {
            let context = match serde_json::from_value::<C>(context) {
                Ok(context) => context,
                Err(e) => return future::ready(Err(ActionFailure::Context(e.to_string()))).boxed(),
            };
            let pending = action(subject, context);
            async move {
                let output = pending.await.map_err(ActionFailure::Action)?;
                serde_json::to_value(output).map_err(|e| ActionFailure::Output(e.to_string()))
            }
            .boxed()
        });
        self.action = Some(erased);
        self
    }

    /// Set a synchronous action.
    pub fn action_fn<C, O, F>(self, action: F) -> Self
    where
        C: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(Subject<S>, C) -> Result<O, ActionError> + Send + Sync + 'static,
    {
        self.action(move |subject: Subject<S>, context: C| future::ready(action(subject, context)))
    }

    /// Use the input attributes unchanged as the output.
    ///
    /// Useful when two states share a shape, or when the destination only
    /// drops attributes (the destination shape strips them).
    pub fn carry_over(self) -> Self {
        self.action_fn(|subject: Subject<S>, _: NoContext| {
            let (_, fields) = subject.into_parts();
            Ok::<_, ActionError>(fields)
        })
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S>, BuildError> {
        if self.name.trim().is_empty() {
            return Err(BuildError::EmptyTransitionName);
        }
        let name = self.name;
        let from = self.from.ok_or_else(|| BuildError::MissingFromState { name: name.clone() })?;
        let to = self.to.ok_or_else(|| BuildError::MissingToState { name: name.clone() })?;
        let action = self.action.ok_or_else(|| BuildError::MissingAction { name: name.clone() })?;

        Ok(Transition {
            name,
            from,
            to,
            description: self.description,
            action,
        })
    }
}
