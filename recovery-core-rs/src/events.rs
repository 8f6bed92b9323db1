//! Event envelope and topic vocabulary for the event bus.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Default topic names. Deployments may override them through configuration.
pub mod topics {
    pub const FLIGHT_OPS_EVENTS: &str = "flight_ops.events.v1";
    pub const BOOKING_EVENTS: &str = "booking.events.v1";
    pub const INVENTORY_EVENTS: &str = "inventory.events.v1";
    pub const DISRUPTION_STATE: &str = "disruption.state.v1";
    pub const PASSENGER_COHORTS: &str = "passenger.cohorts.v1";
    pub const RECOVERY_ACTIONS: &str = "recovery.actions.v1";
    pub const AGENT_AUDIT: &str = "agent.audit.v1";
    pub const AMADEUS_FLIGHT_OFFERS: &str = "amadeus.flight_offers.v1";

    pub const ALL: [&str; 8] = [
        FLIGHT_OPS_EVENTS,
        BOOKING_EVENTS,
        INVENTORY_EVENTS,
        DISRUPTION_STATE,
        PASSENGER_COHORTS,
        RECOVERY_ACTIONS,
        AGENT_AUDIT,
        AMADEUS_FLIGHT_OFFERS,
    ];
}

/// Wrapper for every event published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: String,
    pub event_type: String,
    pub source: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: Value,
}

impl EventEnvelope {
    pub fn create(event_type: impl Into<String>, source: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            source: source.into(),
            occurred_at: Utc::now(),
            payload,
        }
    }
}

/// Fire-and-forget publication. Returns whether the event was accepted for
/// delivery; implementations must not block the caller on the broker.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, topic: &str, key: &str, envelope: &EventEnvelope) -> bool;
}

impl<P: EventPublisher + ?Sized> EventPublisher for Arc<P> {
    fn publish(&self, topic: &str, key: &str, envelope: &EventEnvelope) -> bool {
        (**self).publish(topic, key, envelope)
    }
}
