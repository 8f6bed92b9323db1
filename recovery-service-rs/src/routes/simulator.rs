use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use recovery_core::EventEnvelope;

use crate::state::AppState;

/// Wrap an arbitrary disruption payload in an envelope and put it on the
/// flight-ops topic.
pub async fn simulate_flight_disruption(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let event = EventEnvelope::create("FLIGHT_DISRUPTION", "simulator", payload);
    let key = event
        .payload
        .get("flight_number")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| event.event_id.clone());

    state.publisher.publish(&state.topics.flight_ops, &key, &event);
    state.store.record_simulated(&event).await;

    Json(json!({
        "topic": state.topics.flight_ops,
        "event": event,
    }))
}

pub async fn simulator_state(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "state": state.store.current_state().await }))
}
