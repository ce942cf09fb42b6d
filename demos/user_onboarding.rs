//! User Onboarding
//!
//! This example walks a user through a three-state lifecycle where each
//! state prescribes different attributes.
//!
//! Key concepts:
//! - State tags declared with `lifecycle_states!`
//! - Per-state shapes (declarative `Schema` and serde-backed `TypedShape`)
//! - Transitions with async actions and typed context
//! - An in-memory saver standing in for a database
//! - Error kinds the caller can branch on
//!
//! Run with: cargo run --example user_onboarding

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shapeshift::prelude::*;
use shapeshift::TransitionHistory;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

lifecycle_states! {
    pub enum UserState {
        Created => "CREATED",
        Verified => "VERIFIED",
        Onboarded => "ONBOARDED",
    }
    final: [Onboarded]
}

#[derive(Debug, Serialize, Deserialize)]
struct OnboardedUser {
    email: String,
    verified_at: String,
    full_name: String,
}

#[derive(Serialize, Deserialize)]
struct OnboardContext {
    full_name: String,
}

// Stand-in for a users table, keyed by email
type UserTable = Arc<Mutex<HashMap<String, Value>>>;

fn shapes() -> Result<ShapeRegistry<UserState>, BuildError> {
    ShapeRegistry::new()
        .register(
            UserState::Created,
            Schema::new()
                .field("email", FieldType::Email)
                .field("verified_at", FieldType::Null)
                .field("full_name", FieldType::Null),
        )?
        .register(
            UserState::Verified,
            Schema::new()
                .field("email", FieldType::Email)
                .field("verified_at", FieldType::DateTime)
                .field("full_name", FieldType::Null),
        )?
        .register(UserState::Onboarded, TypedShape::<OnboardedUser>::new())
}

async fn save_user(table: UserTable, user: Subject<UserState>) -> Result<(), PersistenceError> {
    let record = user.to_value().map_err(PersistenceError::failed)?;
    let email = user
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| PersistenceError::new("user has no email"))?
        .to_string();
    table
        .lock()
        .map_err(|_| PersistenceError::new("user table poisoned"))?
        .insert(email, record);
    Ok(())
}

fn build(table: UserTable) -> Result<Fsm<UserState>, BuildError> {
    FsmBuilder::new()
        .with_saver(move |user| save_user(Arc::clone(&table), user))
        .with_shapes(shapes()?)
        .transition(
            TransitionBuilder::new("MARK_VERIFIED")
                .from(UserState::Created)
                .to(UserState::Verified)
                .describe("Confirm the user's email address")
                .action_fn(|user, _: NoContext| {
                    Ok(json!({
                        "email": user.get("email"),
                        "verified_at": chrono::Utc::now().to_rfc3339(),
                        "full_name": null,
                    }))
                }),
        )?
        .transition(
            TransitionBuilder::new("ONBOARD")
                .from(UserState::Verified)
                .to(UserState::Onboarded)
                .describe("Record the user's name")
                .action(|user, ctx: OnboardContext| async move {
                    if ctx.full_name.trim().is_empty() {
                        return Err(ActionError::rejected("full name is required"));
                    }
                    Ok(json!({
                        "email": user.get("email"),
                        "verified_at": user.get("verified_at"),
                        "full_name": ctx.full_name,
                    }))
                }),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== User Onboarding ===\n");

    let table = UserTable::default();
    let fsm = build(Arc::clone(&table))?;

    println!("States and where they lead:");
    for state in UserState::ALL {
        let next = fsm.next_states(state);
        let names: Vec<&str> = next.iter().map(|s| s.name()).collect();
        println!("  {} -> {:?}", state.name(), names);
    }

    println!("\nInput shape for VERIFIED:");
    let shape = fsm.input_shape_for(&UserState::Verified)?;
    println!("{}", serde_json::to_string_pretty(&shape)?);

    let user = Subject::new(UserState::Created)
        .with("email", "me@example.com")
        .with("verified_at", Value::Null)
        .with("full_name", Value::Null);
    println!("\nStarting record: {}", user.to_value()?);

    // Onboarding before verification is refused
    match fsm
        .execute("ONBOARD", user.clone(), OnboardContext { full_name: "John Doe".into() })
        .await
    {
        Err(ExecuteError::StateMismatch { expected, actual, .. }) => {
            println!("ONBOARD refused: expected {expected}, record is {actual}");
        }
        other => println!("unexpected outcome: {other:?}"),
    }

    let mut history = TransitionHistory::new();

    let verified = fsm.execute_with_receipt("MARK_VERIFIED", user, ()).await?;
    history = history.record(verified.receipt);
    println!("\nAfter MARK_VERIFIED: {}", verified.subject.to_value()?);

    let onboarded = fsm
        .execute_with_receipt(
            "ONBOARD",
            verified.subject,
            OnboardContext {
                full_name: "John Doe".into(),
            },
        )
        .await?;
    history = history.record(onboarded.receipt);
    println!("After ONBOARD:       {}", onboarded.subject.to_value()?);

    let typed: OnboardedUser = onboarded.subject.decode()?;
    println!("\nTyped view: {typed:?}");

    let path: Vec<&str> = history.path().into_iter().map(|s| s.name()).collect();
    println!("Path: {}", path.join(" -> "));

    // Output that breaks the destination shape never reaches the table
    let sloppy = fsm.transition(
        TransitionBuilder::new("RESET")
            .from(UserState::Onboarded)
            .to(UserState::Created)
            .action_fn(|user, _: NoContext| Ok(json!({ "email": user.get("email") }))),
    )?;
    let result = sloppy.execute("RESET", onboarded.subject, ()).await;
    if let Err(err @ ExecuteError::OutputValidation { .. }) = &result {
        println!("\nRESET rejected: {err}");
    }

    let table = table.lock().map_err(|_| "user table poisoned")?;
    println!("\nStored: {}", json!(*table));

    Ok(())
}
