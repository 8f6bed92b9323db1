//! In-memory disruption store backing the read-only dashboard routes.
//!
//! Fixture data stands in for the operational database; only the simulator
//! counters change at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use recovery_core::EventEnvelope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub delayed_flights_count: u32,
    pub cancelled_flights_count: u32,
    pub passengers_impacted_est: u32,
    pub connections_at_risk_est: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_delay_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisruptionSummary {
    pub disruption_id: String,
    pub severity: String,
    pub airport: String,
    pub region: String,
    pub primary_flight_number: String,
    pub metrics: Metrics,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub airport: String,
    pub region: String,
    pub primary_flight_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub cohort_id: String,
    pub priority: String,
    pub reason: String,
    pub passenger_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisruptionDetail {
    pub disruption_id: String,
    pub severity: String,
    pub scope: Scope,
    pub metrics: Metrics,
    pub cohorts: Vec<CohortSummary>,
    pub last_updated: DateTime<Utc>,
}

/// List filter. Matching is case-insensitive; pagination applies after it.
#[derive(Debug, Clone, Default)]
pub struct DisruptionFilter {
    pub airport: Option<String>,
    pub severity: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Default)]
struct SimulatorState {
    simulated_events: u64,
    last_event: Option<EventEnvelope>,
}

#[derive(Default)]
pub struct MockStore {
    simulator: RwLock<SimulatorState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disruptions(&self) -> Vec<DisruptionSummary> {
        let now = Utc::now();
        vec![
            DisruptionSummary {
                disruption_id: "dsp_123".to_string(),
                severity: "HIGH".to_string(),
                airport: "SFO".to_string(),
                region: "US-WEST".to_string(),
                primary_flight_number: "UA123".to_string(),
                metrics: Metrics {
                    delayed_flights_count: 14,
                    cancelled_flights_count: 3,
                    passengers_impacted_est: 640,
                    connections_at_risk_est: 120,
                    avg_delay_minutes: None,
                },
                last_updated: now,
            },
            DisruptionSummary {
                disruption_id: "dsp_456".to_string(),
                severity: "MEDIUM".to_string(),
                airport: "LAX".to_string(),
                region: "US-WEST".to_string(),
                primary_flight_number: "DL410".to_string(),
                metrics: Metrics {
                    delayed_flights_count: 6,
                    cancelled_flights_count: 1,
                    passengers_impacted_est: 180,
                    connections_at_risk_est: 30,
                    avg_delay_minutes: None,
                },
                last_updated: now,
            },
        ]
    }

    pub fn list_disruptions(&self, filter: &DisruptionFilter) -> Vec<DisruptionSummary> {
        let matches = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .map_or(true, |w| w.eq_ignore_ascii_case(actual))
        };

        self.disruptions()
            .into_iter()
            .filter(|d| matches(&filter.airport, &d.airport) && matches(&filter.severity, &d.severity))
            .skip(filter.offset)
            .take(filter.limit)
            .collect()
    }

    pub fn disruption(&self, disruption_id: &str) -> Option<DisruptionSummary> {
        self.disruptions()
            .into_iter()
            .find(|d| d.disruption_id == disruption_id)
    }

    pub fn disruption_detail(&self, disruption_id: &str) -> Option<DisruptionDetail> {
        let base = self.disruption(disruption_id)?;
        let severe = matches!(base.severity.as_str(), "HIGH" | "CRITICAL");

        Some(DisruptionDetail {
            disruption_id: base.disruption_id,
            severity: base.severity,
            scope: Scope {
                airport: base.airport,
                region: base.region,
                primary_flight_number: base.primary_flight_number,
            },
            metrics: Metrics {
                avg_delay_minutes: Some(if severe { 52 } else { 25 }),
                ..base.metrics
            },
            cohorts: vec![
                cohort_summary("c_001", "P0", "SPECIAL_ASSISTANCE", 18),
                cohort_summary("c_002", "P1", "TIGHT_CONNECTION", 64),
                cohort_summary("c_003", "P2", "LOYALTY_PREMIUM", 40),
            ],
            last_updated: base.last_updated,
        })
    }

    pub fn cohorts(&self, disruption_id: &str) -> Option<Value> {
        let detail = self.disruption_detail(disruption_id)?;

        Some(json!({
            "disruption_id": disruption_id,
            "cohorts": [{
                "cohort_id": "c_001",
                "priority": "P0",
                "reason": "SPECIAL_ASSISTANCE",
                "passengers": [{
                    "passenger_id": "p_9001",
                    "pnr": "AB12CD",
                    "loyalty_tier": "GOLD",
                    "special_assistance": true,
                    "itinerary": {
                        "flight_number": detail.scope.primary_flight_number,
                        "origin_airport": detail.scope.airport,
                        "destination_airport": "ORD",
                        "scheduled_departure": "2025-12-28T01:10:00Z",
                        "connection_flight_number": "UA456"
                    }
                }]
            }]
        }))
    }

    pub fn actions(&self, disruption_id: &str) -> Option<Value> {
        self.disruption(disruption_id)?;

        Some(json!({
            "disruption_id": disruption_id,
            "actions": [
                {
                    "action_id": "a_001",
                    "action_type": "REBOOK",
                    "priority": "P0",
                    "target": {"pnr": "AB12CD", "passenger_id": "p_9001"},
                    "details": {
                        "recommended_option": "UA789 SFO→ORD 03:10Z",
                        "notes": "Auto-protect under policy"
                    },
                    "status": "VALIDATED",
                    "created_at": "2025-12-28T00:02:00Z"
                },
                {
                    "action_id": "a_002",
                    "action_type": "HOTEL_OFFER",
                    "priority": "P1",
                    "target": {"pnr": "ZX98YU", "passenger_id": "p_8122"},
                    "details": {"hotel": "Airport Inn", "nights": 1, "cap_usd": 180},
                    "status": "VALIDATED",
                    "created_at": "2025-12-28T00:02:10Z"
                }
            ]
        }))
    }

    pub fn audit(&self, disruption_id: &str) -> Option<Value> {
        let detail = self.disruption_detail(disruption_id)?;

        Some(json!({
            "disruption_id": disruption_id,
            "model": {"provider": "anthropic", "name": "claude", "version": "tbd"},
            "decision_summary": {
                "severity": detail.severity,
                "total_actions": 2,
                "key_reasons": ["high cancellations", "connection risk", "limited capacity"]
            },
            "safety_and_guardrails": {
                "validated": true,
                "blocked_actions": 1,
                "notes": "Blocked hotel for non-overnight delays (policy guardrail)"
            },
            "performance": {"end_to_end_latency_ms": 1240, "model_latency_ms": 680},
            "created_at": "2025-12-28T00:02:01Z"
        }))
    }

    /// Remember a simulated event for the state summary.
    pub async fn record_simulated(&self, envelope: &EventEnvelope) {
        let mut state = self.simulator.write().await;
        state.simulated_events += 1;
        state.last_event = Some(envelope.clone());
    }

    pub async fn current_state(&self) -> Value {
        let state = self.simulator.read().await;
        let disruptions = self.disruptions();

        json!({
            "active_disruptions": disruptions.len(),
            "disruption_ids": disruptions.iter().map(|d| d.disruption_id.as_str()).collect::<Vec<_>>(),
            "simulated_events": state.simulated_events,
            "last_event": state.last_event,
        })
    }
}

fn cohort_summary(id: &str, priority: &str, reason: &str, passenger_count: u32) -> CohortSummary {
    CohortSummary {
        cohort_id: id.to_string(),
        priority: priority.to_string(),
        reason: reason.to_string(),
        passenger_count,
    }
}
