//! The execution engine.

use super::error::ExecuteError;
use super::persistence::Saver;
use crate::builder::{BuildError, TransitionBuilder};
use crate::core::{json_kind, Fields, State, Subject, TransitionReceipt, STATE_TAG};
use crate::shape::{Shape, ShapeDescription, ShapeRegistry, UnknownState, Violation, Violations};
use crate::transition::{ActionFailure, Transition, TransitionRegistry};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use tracing::{debug, warn};

/// A successful execution: the persisted subject and its receipt.
#[derive(Clone, Debug, PartialEq)]
pub struct Transitioned<S: State> {
    pub subject: Subject<S>,
    pub receipt: TransitionReceipt<S>,
}

/// Executes registered transitions over caller-held subjects.
///
/// The engine keeps no per-subject state. Each call validates the input
/// against the source state's shape, runs the action, validates its output
/// against the destination state's shape, saves the result, and returns it.
///
/// Engines are cheap to clone and can be shared across tasks. Concurrent
/// calls for the same subject are not coordinated: each one that succeeds
/// saves its result. Guard against that in the saver (for example with a
/// conditional write) when it matters.
///
/// Obtain one through [`FsmBuilder`](crate::builder::FsmBuilder).
pub struct Fsm<S: State + 'static> {
    saver: Arc<dyn Saver<S>>,
    shapes: Arc<ShapeRegistry<S>>,
    transitions: TransitionRegistry<S>,
}

impl<S: State + 'static> Clone for Fsm<S> {
    fn clone(&self) -> Self {
        Self {
            saver: Arc::clone(&self.saver),
            shapes: Arc::clone(&self.shapes),
            transitions: self.transitions.clone(),
        }
    }
}

impl<S: State + 'static> Fsm<S> {
    pub(crate) fn new(saver: Arc<dyn Saver<S>>, shapes: ShapeRegistry<S>) -> Self {
        Self {
            saver,
            shapes: Arc::new(shapes),
            transitions: TransitionRegistry::new(),
        }
    }

    /// Return a new engine that also knows `transition`.
    ///
    /// Both endpoints must have a registered shape. The receiver is left
    /// unchanged.
    pub fn add_transition(&self, transition: Transition<S>) -> Result<Self, BuildError> {
        for state in [&transition.from, &transition.to] {
            if !self.shapes.contains(state) {
                return Err(BuildError::MissingShape {
                    transition: transition.name.clone(),
                    state: state.name().to_string(),
                });
            }
        }

        let transitions = self.transitions.with_transition(transition)?;
        Ok(Self {
            saver: Arc::clone(&self.saver),
            shapes: Arc::clone(&self.shapes),
            transitions,
        })
    }

    /// Build `builder` and add the result.
    pub fn transition(&self, builder: TransitionBuilder<S>) -> Result<Self, BuildError> {
        self.add_transition(builder.build()?)
    }

    /// Run the transition called `name` on `subject`.
    ///
    /// `context` is serialized to JSON and decoded into the transition's
    /// context type just before the action runs.
    pub async fn execute<C: Serialize>(
        &self,
        name: &str,
        subject: Subject<S>,
        context: C,
    ) -> Result<Subject<S>, ExecuteError> {
        self.execute_with_receipt(name, subject, context)
            .await
            .map(|done| done.subject)
    }

    /// Like [`execute`](Self::execute), also returning a receipt.
    pub async fn execute_with_receipt<C: Serialize>(
        &self,
        name: &str,
        subject: Subject<S>,
        context: C,
    ) -> Result<Transitioned<S>, ExecuteError> {
        let transition = self.resolve(name)?;
        let (state, fields) = subject.into_parts();
        self.run(transition, state, fields, context).await
    }

    /// Run the transition called `name` on a loosely typed record.
    ///
    /// The record is the flat JSON form of a subject, with its tag under
    /// `"state"`. Validation is identical to [`execute`](Self::execute).
    pub async fn execute_unchecked<C: Serialize>(
        &self,
        name: &str,
        record: Value,
        context: C,
    ) -> Result<Subject<S>, ExecuteError> {
        let transition = self.resolve(name)?;

        let mut fields = match record {
            Value::Object(fields) => fields,
            other => {
                debug!(transition = name, found = json_kind(&other), "record is not an object");
                return Err(ExecuteError::InputValidation {
                    transition: name.to_string(),
                    state: transition.from.name().to_string(),
                    violations: Violations::single(Violation::NotAnObject {
                        found: json_kind(&other).to_string(),
                    }),
                });
            }
        };

        let state = match fields.remove(STATE_TAG) {
            None => return Err(mismatch(transition, "<missing>".to_string())),
            Some(tag) => match serde_json::from_value::<S>(tag.clone()) {
                Ok(state) => state,
                Err(_) => {
                    let actual = match tag {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    return Err(mismatch(transition, actual));
                }
            },
        };

        self.run(transition, state, fields, context)
            .await
            .map(|done| done.subject)
    }

    fn resolve(&self, name: &str) -> Result<&Transition<S>, ExecuteError> {
        self.transitions.find_by_name(name).ok_or_else(|| {
            debug!(transition = name, "transition not found");
            ExecuteError::TransitionNotFound {
                name: name.to_string(),
            }
        })
    }

    async fn run<C: Serialize>(
        &self,
        transition: &Transition<S>,
        state: S,
        fields: Fields,
        context: C,
    ) -> Result<Transitioned<S>, ExecuteError> {
        let name = transition.name.as_str();
        debug!(
            transition = name,
            from = transition.from.name(),
            to = transition.to.name(),
            "executing transition"
        );

        if !transition.can_execute(&state) {
            return Err(mismatch(transition, state.name().to_string()));
        }

        let input = validate(self.shapes.lookup(&transition.from)?, &fields).map_err(|violations| {
            debug!(transition = name, %violations, "input rejected");
            ExecuteError::InputValidation {
                transition: name.to_string(),
                state: transition.from.name().to_string(),
                violations,
            }
        })?;

        let context = encode_context(name, context)?;
        let output = transition
            .invoke(Subject::from_parts(state, input), context)
            .await
            .map_err(|failure| {
                debug!(transition = name, ?failure, "action did not produce output");
                match failure {
                    ActionFailure::Context(message) => ExecuteError::InvalidContext {
                        transition: name.to_string(),
                        message,
                    },
                    ActionFailure::Action(source) => ExecuteError::Action {
                        transition: name.to_string(),
                        source,
                    },
                    ActionFailure::Output(message) => self.output_rejected(
                        transition,
                        Violations::single(Violation::Decode { message }),
                    ),
                }
            })?;

        let mut output = match output {
            Value::Object(fields) => fields,
            other => {
                return Err(self.output_rejected(
                    transition,
                    Violations::single(Violation::NotAnObject {
                        found: json_kind(&other).to_string(),
                    }),
                ));
            }
        };
        // The engine assigns the tag.
        output.remove(STATE_TAG);

        let output = validate(self.shapes.lookup(&transition.to)?, &output)
            .map_err(|violations| self.output_rejected(transition, violations))?;

        let subject = Subject::from_parts(transition.to.clone(), output);
        if let Err(source) = self.saver.save(subject.clone()).await {
            warn!(transition = name, error = %source, "persistence failed after validation");
            return Err(ExecuteError::Persistence {
                transition: name.to_string(),
                subject: unsaved_record(&subject),
                source,
            });
        }

        let receipt = TransitionReceipt::issue(name, transition.from.clone(), transition.to.clone());
        debug!(transition = name, receipt = %receipt.id, "transition complete");
        Ok(Transitioned { subject, receipt })
    }

    fn output_rejected(&self, transition: &Transition<S>, violations: Violations) -> ExecuteError {
        debug!(transition = %transition.name, %violations, "output rejected");
        ExecuteError::OutputValidation {
            transition: transition.name.clone(),
            state: transition.to.name().to_string(),
            violations,
        }
    }

    /// Look up a transition by name.
    pub fn find_transition(&self, name: &str) -> Option<&Transition<S>> {
        self.transitions.find_by_name(name)
    }

    pub fn transitions(&self) -> &TransitionRegistry<S> {
        &self.transitions
    }

    pub fn shapes(&self) -> &ShapeRegistry<S> {
        &self.shapes
    }

    /// Every state with a registered shape.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.shapes.states()
    }

    /// Transitions leaving `state`, in registration order.
    pub fn transitions_from<'a>(&'a self, state: &'a S) -> impl Iterator<Item = &'a Transition<S>> {
        self.transitions.from_state(state)
    }

    /// States reachable from `state` in one step, without repeats.
    pub fn next_states(&self, state: &S) -> Vec<S> {
        let mut next: Vec<S> = Vec::new();
        for transition in self.transitions.from_state(state) {
            if !next.contains(&transition.to) {
                next.push(transition.to.clone());
            }
        }
        next
    }

    /// Whether `subject`'s tag allows the transition called `name`.
    ///
    /// Attributes are not validated.
    pub fn can(&self, name: &str, subject: &Subject<S>) -> bool {
        self.find_transition(name)
            .is_some_and(|transition| transition.can_execute(subject.state()))
    }

    /// Describe the attributes expected in `state`.
    pub fn input_shape_for(&self, state: &S) -> Result<ShapeDescription, UnknownState> {
        self.shapes.describe(state)
    }
}

impl<S: State + 'static> fmt::Debug for Fsm<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("shapes", &self.shapes)
            .field("transitions", &self.transitions.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn validate(shape: &dyn Shape, fields: &Fields) -> Result<Fields, Violations> {
    match shape.validate(fields) {
        Validation::Success(fields) => Ok(fields),
        Validation::Failure(violations) => Err(violations.into()),
    }
}

fn encode_context<C: Serialize>(name: &str, context: C) -> Result<Value, ExecuteError> {
    serde_json::to_value(context).map_err(|e| ExecuteError::InvalidContext {
        transition: name.to_string(),
        message: e.to_string(),
    })
}

/// Flat record of a subject that failed to save.
///
/// Attributes are already JSON; a tag that does not serialize falls back to
/// its name.
fn unsaved_record<S: State>(subject: &Subject<S>) -> Value {
    let tag = serde_json::to_value(subject.state())
        .unwrap_or_else(|_| Value::String(subject.state().name().to_string()));
    let mut record = subject.fields().clone();
    record.insert(STATE_TAG.to_string(), tag);
    Value::Object(record)
}

fn mismatch<S: State>(transition: &Transition<S>, actual: String) -> ExecuteError {
    debug!(
        transition = %transition.name,
        expected = transition.from.name(),
        actual = %actual,
        "state mismatch"
    );
    ExecuteError::StateMismatch {
        transition: transition.name.clone(),
        expected: transition.from.name().to_string(),
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FsmBuilder, WithSaver};
    use crate::engine::PersistenceError;
    use crate::shape::{FieldType, Schema, UnknownFields};
    use crate::transition::{ActionError, NoContext};
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    crate::lifecycle_states! {
        enum TicketState {
            Open => "OPEN",
            Assigned => "ASSIGNED",
            Closed => "CLOSED",
        }
        final: [Closed]
        error: [Closed]
    }

    type Saved = Arc<Mutex<Vec<Subject<TicketState>>>>;

    fn recording_saver() -> (WithSaver<TicketState>, Saved) {
        let saved: Saved = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&saved);
        let stage = FsmBuilder::new().with_saver(move |ticket: Subject<TicketState>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(ticket);
                Ok(())
            }
        });
        (stage, saved)
    }

    fn shapes() -> ShapeRegistry<TicketState> {
        ShapeRegistry::new()
            .register(
                TicketState::Open,
                Schema::new().field("title", FieldType::NonEmptyString),
            )
            .unwrap()
            .register(
                TicketState::Assigned,
                Schema::new()
                    .field("title", FieldType::NonEmptyString)
                    .field("assignee", FieldType::NonEmptyString)
                    .unknown_fields(UnknownFields::Reject),
            )
            .unwrap()
            .register(
                TicketState::Closed,
                Schema::new()
                    .field("title", FieldType::NonEmptyString)
                    .field("closed_at", FieldType::DateTime),
            )
            .unwrap()
    }

    #[derive(Deserialize)]
    struct AssignContext {
        assignee: String,
    }

    fn engine(stage: &WithSaver<TicketState>) -> Fsm<TicketState> {
        stage
            .with_shapes(shapes())
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(|ticket, ctx: AssignContext| {
                        Ok(json!({
                            "title": ticket.get("title"),
                            "assignee": ctx.assignee,
                        }))
                    }),
            )
            .unwrap()
            .transition(
                TransitionBuilder::new("CLOSE")
                    .from(TicketState::Assigned)
                    .to(TicketState::Closed)
                    .action(|ticket, _: NoContext| async move {
                        Ok(json!({
                            "title": ticket.get("title"),
                            "closed_at": "2024-03-01T12:00:00+01:00",
                        }))
                    }),
            )
            .unwrap()
    }

    fn open_ticket() -> Subject<TicketState> {
        Subject::new(TicketState::Open).with("title", "Printer on fire")
    }

    #[tokio::test]
    async fn execute_runs_the_pipeline_and_saves_once() {
        let (stage, saved) = recording_saver();
        let fsm = engine(&stage);

        let assigned = fsm
            .execute("ASSIGN", open_ticket(), json!({ "assignee": "moss" }))
            .await
            .unwrap();

        assert_eq!(assigned.state(), &TicketState::Assigned);
        assert_eq!(assigned.get("assignee"), Some(&json!("moss")));

        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0], assigned);
    }

    #[tokio::test]
    async fn output_is_normalized_by_the_destination_shape() {
        let (stage, _) = recording_saver();
        let fsm = engine(&stage);
        let assigned = Subject::new(TicketState::Assigned)
            .with("title", "Printer on fire")
            .with("assignee", "moss");

        let closed = fsm.execute("CLOSE", assigned, ()).await.unwrap();

        assert_eq!(closed.get("closed_at"), Some(&json!("2024-03-01T11:00:00Z")));
    }

    #[tokio::test]
    async fn unknown_transition_is_reported() {
        let (stage, _) = recording_saver();
        let result = engine(&stage).execute("REOPEN", open_ticket(), ()).await;

        assert!(matches!(result, Err(ExecuteError::TransitionNotFound { name }) if name == "REOPEN"));
    }

    #[tokio::test]
    async fn wrong_source_state_is_a_mismatch() {
        let (stage, saved) = recording_saver();
        let result = engine(&stage).execute("CLOSE", open_ticket(), ()).await;

        match result {
            Err(ExecuteError::StateMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, "ASSIGNED");
                assert_eq!(actual, "OPEN");
            }
            other => panic!("expected state mismatch, got {other:?}"),
        }
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_action() {
        let (stage, saved) = recording_saver();
        let ticket = Subject::new(TicketState::Open).with("title", "");

        let result = engine(&stage)
            .execute("ASSIGN", ticket, json!({ "assignee": "moss" }))
            .await;

        match result {
            Err(ExecuteError::InputValidation {
                state, violations, ..
            }) => {
                assert_eq!(state, "OPEN");
                assert!(violations.mentions("title"));
            }
            other => panic!("expected input validation failure, got {other:?}"),
        }
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_context_is_its_own_error() {
        let (stage, _) = recording_saver();
        let result = engine(&stage)
            .execute("ASSIGN", open_ticket(), json!({ "who": "moss" }))
            .await;

        assert!(matches!(result, Err(ExecuteError::InvalidContext { .. })));
    }

    #[tokio::test]
    async fn action_failures_pass_through() {
        let (stage, saved) = recording_saver();
        let fsm = stage
            .with_shapes(shapes())
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(|_, _: NoContext| {
                        Err::<Value, _>(ActionError::rejected("nobody is on call"))
                    }),
            )
            .unwrap();

        let result = fsm.execute("ASSIGN", open_ticket(), ()).await;

        match result {
            Err(ExecuteError::Action { source, .. }) => {
                assert_eq!(source.message(), "nobody is on call")
            }
            other => panic!("expected action failure, got {other:?}"),
        }
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_output_is_rejected_without_saving() {
        let (stage, saved) = recording_saver();
        let fsm = stage
            .with_shapes(shapes())
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(|ticket, _: NoContext| {
                        Ok(json!({ "title": ticket.get("title"), "assignee": 42 }))
                    }),
            )
            .unwrap();

        let result = fsm.execute("ASSIGN", open_ticket(), ()).await;

        match result {
            Err(ExecuteError::OutputValidation {
                state, violations, ..
            }) => {
                assert_eq!(state, "ASSIGNED");
                assert!(violations.mentions("assignee"));
            }
            other => panic!("expected output validation failure, got {other:?}"),
        }
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_object_output_is_rejected() {
        let (stage, _) = recording_saver();
        let fsm = stage
            .with_shapes(shapes())
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(|_, _: NoContext| Ok("moss")),
            )
            .unwrap();

        let result = fsm.execute("ASSIGN", open_ticket(), ()).await;

        assert!(matches!(
            result,
            Err(ExecuteError::OutputValidation { violations, .. })
                if matches!(violations.iter().next(), Some(Violation::NotAnObject { .. }))
        ));
    }

    #[tokio::test]
    async fn action_cannot_forge_the_destination_tag() {
        let (stage, _) = recording_saver();
        let fsm = stage
            .with_shapes(shapes())
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(|ticket, _: NoContext| {
                        Ok(json!({
                            "state": "CLOSED",
                            "title": ticket.get("title"),
                            "assignee": "roy",
                        }))
                    }),
            )
            .unwrap();

        let assigned = fsm.execute("ASSIGN", open_ticket(), ()).await.unwrap();

        assert_eq!(assigned.state(), &TicketState::Assigned);
        assert_eq!(
            assigned.to_value().unwrap(),
            json!({ "state": "ASSIGNED", "title": "Printer on fire", "assignee": "roy" })
        );
    }

    #[tokio::test]
    async fn persistence_failure_carries_the_validated_subject() {
        let fsm = FsmBuilder::new()
            .with_saver(|_ticket: Subject<TicketState>| async {
                Err(PersistenceError::new("disk full"))
            })
            .with_shapes(shapes())
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(|ticket, ctx: AssignContext| {
                        Ok(json!({ "title": ticket.get("title"), "assignee": ctx.assignee }))
                    }),
            )
            .unwrap();

        let err = fsm
            .execute("ASSIGN", open_ticket(), json!({ "assignee": "jen" }))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        match err {
            ExecuteError::Persistence {
                subject, source, ..
            } => {
                assert_eq!(source.message(), "disk full");
                assert_eq!(subject["state"], json!("ASSIGNED"));
                assert_eq!(subject["assignee"], json!("jen"));
            }
            other => panic!("expected persistence failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unserializable_context_does_not_hide_a_state_mismatch() {
        let (stage, _) = recording_saver();
        let fsm = engine(&stage);
        // JSON object keys must be strings.
        let context: HashMap<Vec<u8>, i32> = HashMap::from([(vec![1], 1)]);

        let typed = fsm.execute("CLOSE", open_ticket(), &context).await;
        assert!(matches!(
            typed,
            Err(ExecuteError::StateMismatch { actual, .. }) if actual == "OPEN"
        ));

        let unchecked = fsm
            .execute_unchecked("CLOSE", json!({ "state": "OPEN", "title": "x" }), &context)
            .await;
        assert!(matches!(
            unchecked,
            Err(ExecuteError::StateMismatch { actual, .. }) if actual == "OPEN"
        ));

        let invalid = fsm
            .execute("ASSIGN", Subject::new(TicketState::Open), &context)
            .await;
        assert!(matches!(invalid, Err(ExecuteError::InputValidation { .. })));
    }

    #[tokio::test]
    async fn unserializable_context_on_a_valid_record_is_an_invalid_context() {
        let (stage, saved) = recording_saver();
        let context: HashMap<Vec<u8>, i32> = HashMap::from([(vec![1], 1)]);

        let result = engine(&stage).execute("ASSIGN", open_ticket(), context).await;

        assert!(matches!(result, Err(ExecuteError::InvalidContext { .. })));
        assert!(saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn action_receives_the_normalized_input() {
        let (stage, _) = recording_saver();
        let seen: Arc<Mutex<Option<Fields>>> = Arc::default();
        let witness = Arc::clone(&seen);
        let shapes = ShapeRegistry::new()
            .register(
                TicketState::Open,
                Schema::new()
                    .field("title", FieldType::NonEmptyString)
                    .field("reported_at", FieldType::DateTime),
            )
            .unwrap()
            .register(
                TicketState::Assigned,
                Schema::new().field("title", FieldType::NonEmptyString),
            )
            .unwrap();
        let fsm = stage
            .with_shapes(shapes)
            .transition(
                TransitionBuilder::new("ASSIGN")
                    .from(TicketState::Open)
                    .to(TicketState::Assigned)
                    .action_fn(move |ticket: Subject<TicketState>, _: NoContext| {
                        *witness.lock().unwrap() = Some(ticket.fields().clone());
                        Ok(json!({ "title": ticket.get("title") }))
                    }),
            )
            .unwrap();
        let ticket = open_ticket()
            .with("reported_at", "2024-01-01T02:00:00+02:00")
            .with("junk", 1);

        fsm.execute("ASSIGN", ticket, ()).await.unwrap();

        let input = seen.lock().unwrap().take().unwrap();
        assert_eq!(input.get("reported_at"), Some(&json!("2024-01-01T00:00:00Z")));
        assert!(!input.contains_key("junk"));
        assert!(!input.contains_key(STATE_TAG));
    }

    #[derive(Clone, PartialEq, Debug, Deserialize)]
    enum VaultState {
        Draft,
        Sealed,
    }

    // Tags that can be read but not written.
    impl Serialize for VaultState {
        fn serialize<Se: serde::Serializer>(&self, _: Se) -> Result<Se::Ok, Se::Error> {
            Err(serde::ser::Error::custom("vault tags are read-only"))
        }
    }

    impl State for VaultState {
        fn name(&self) -> &str {
            match self {
                Self::Draft => "DRAFT",
                Self::Sealed => "SEALED",
            }
        }
    }

    #[tokio::test]
    async fn persistence_failure_keeps_the_record_when_the_tag_cannot_serialize() {
        let label = || Schema::new().field("label", FieldType::NonEmptyString);
        let shapes = ShapeRegistry::new()
            .register(VaultState::Draft, label())
            .unwrap()
            .register(VaultState::Sealed, label())
            .unwrap();
        let fsm = FsmBuilder::new()
            .with_saver(|_vault: Subject<VaultState>| async {
                Err(PersistenceError::new("vault offline"))
            })
            .with_shapes(shapes)
            .transition(
                TransitionBuilder::new("SEAL")
                    .from(VaultState::Draft)
                    .to(VaultState::Sealed)
                    .carry_over(),
            )
            .unwrap();

        let err = fsm
            .execute("SEAL", Subject::new(VaultState::Draft).with("label", "q3 ledger"), ())
            .await
            .unwrap_err();

        match err {
            ExecuteError::Persistence { subject, .. } => {
                assert_eq!(subject, json!({ "state": "SEALED", "label": "q3 ledger" }));
            }
            other => panic!("expected persistence failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn final_and_error_states_accept_registered_transitions() {
        let (stage, _) = recording_saver();
        let fsm = engine(&stage)
            .transition(
                TransitionBuilder::new("REOPEN")
                    .from(TicketState::Closed)
                    .to(TicketState::Open)
                    .carry_over(),
            )
            .unwrap();
        let closed = Subject::new(TicketState::Closed)
            .with("title", "Printer on fire")
            .with("closed_at", "2024-03-01T11:00:00Z");
        assert!(closed.state().is_final() && closed.state().is_error());

        let reopened = fsm.execute("REOPEN", closed, ()).await.unwrap();

        assert_eq!(reopened.state(), &TicketState::Open);
        assert_eq!(reopened.get("closed_at"), None);
    }

    #[tokio::test]
    async fn unchecked_records_get_the_same_checks() {
        let (stage, saved) = recording_saver();
        let fsm = engine(&stage);

        let assigned = fsm
            .execute_unchecked(
                "ASSIGN",
                json!({ "state": "OPEN", "title": "Printer on fire" }),
                json!({ "assignee": "moss" }),
            )
            .await
            .unwrap();
        assert_eq!(assigned.state(), &TicketState::Assigned);

        let missing_tag = fsm
            .execute_unchecked("ASSIGN", json!({ "title": "x" }), json!({ "assignee": "moss" }))
            .await;
        assert!(matches!(
            missing_tag,
            Err(ExecuteError::StateMismatch { actual, .. }) if actual == "<missing>"
        ));

        let bogus_tag = fsm
            .execute_unchecked(
                "ASSIGN",
                json!({ "state": "ARCHIVED", "title": "x" }),
                json!({ "assignee": "moss" }),
            )
            .await;
        assert!(matches!(
            bogus_tag,
            Err(ExecuteError::StateMismatch { actual, .. }) if actual == "ARCHIVED"
        ));

        let not_an_object = fsm
            .execute_unchecked("ASSIGN", json!(["OPEN"]), json!({ "assignee": "moss" }))
            .await;
        assert!(matches!(
            not_an_object,
            Err(ExecuteError::InputValidation { .. })
        ));

        assert_eq!(saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn receipts_describe_the_step() {
        let (stage, _) = recording_saver();
        let done = engine(&stage)
            .execute_with_receipt("ASSIGN", open_ticket(), json!({ "assignee": "moss" }))
            .await
            .unwrap();

        assert_eq!(done.receipt.transition, "ASSIGN");
        assert_eq!(done.receipt.from, TicketState::Open);
        assert_eq!(done.receipt.to, TicketState::Assigned);
        assert_eq!(done.subject.state(), &done.receipt.to);
    }

    #[test]
    fn introspection_reflects_registered_edges() {
        let (stage, _) = recording_saver();
        let fsm = engine(&stage);

        assert_eq!(fsm.next_states(&TicketState::Open), vec![TicketState::Assigned]);
        assert!(fsm.next_states(&TicketState::Closed).is_empty());
        assert!(fsm.can("ASSIGN", &open_ticket()));
        assert!(!fsm.can("CLOSE", &open_ticket()));
        assert!(!fsm.can("REOPEN", &open_ticket()));
        assert_eq!(fsm.transitions_from(&TicketState::Assigned).count(), 1);
        assert_eq!(fsm.states().count(), 3);
        assert!(fsm.find_transition("CLOSE").is_some());
    }

    #[test]
    fn input_shape_describes_the_schema() {
        let (stage, _) = recording_saver();
        let fsm = engine(&stage);

        match fsm.input_shape_for(&TicketState::Assigned).unwrap() {
            ShapeDescription::Schema {
                fields,
                unknown_fields,
            } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(unknown_fields, UnknownFields::Reject);
            }
            other => panic!("expected schema description, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (stage, _) = recording_saver();
        let result = engine(&stage).transition(
            TransitionBuilder::new("ASSIGN")
                .from(TicketState::Open)
                .to(TicketState::Assigned)
                .carry_over(),
        );

        assert!(matches!(result, Err(BuildError::DuplicateTransition { name }) if name == "ASSIGN"));
    }
}
