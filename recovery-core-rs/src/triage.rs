//! Triage stage: severity, cause and rebooking constraints for a disruption.
//!
//! Two interchangeable strategies implement [`Triager`]: [`RuleTriager`]
//! applies fixed thresholds, [`JudgmentTriager`] delegates to a
//! [`JudgmentService`] and validates its answer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde::Deserialize;
use serde_json::json;

use crate::judgment::{JudgmentService, JudgmentServiceError};
use crate::models::{round2, Cause, Constraints, DisruptionEvent, TriageResult};

/// Severity at or above which constraints tighten.
pub const STRICT_SEVERITY: f64 = 0.75;

/// Delay thresholds in minutes and the severity floor each one implies,
/// checked from the longest down.
const DELAY_FLOORS: [(i64, f64); 4] = [(180, 0.90), (120, 0.80), (60, 0.65), (30, 0.55)];
const SHORT_DELAY_FLOOR: f64 = 0.35;

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const TRIAGE_SYSTEM_PROMPT: &str = "You are an airline operations disruption triage agent. \
You analyze flight disruptions and produce operational constraints.";

const TRIAGE_SCHEMA: &str = r#"{
  "severity_score": 0.0,
  "cause": "DELAY|CANCEL|WEATHER|CREW|ATC|MAINTENANCE|UNKNOWN",
  "constraints": {
    "min_layover_minutes": 30,
    "max_stops": 2,
    "avoid_overnight": false
  },
  "notes": "string"
}"#;

#[async_trait]
pub trait Triager: Send + Sync {
    async fn triage(&self, event: &DisruptionEvent) -> Result<TriageResult, JudgmentServiceError>;
}

#[async_trait]
impl<T: Triager + ?Sized> Triager for Arc<T> {
    async fn triage(&self, event: &DisruptionEvent) -> Result<TriageResult, JudgmentServiceError> {
        (**self).triage(event).await
    }
}

/// Deterministic threshold triage. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTriager;

#[async_trait]
impl Triager for RuleTriager {
    async fn triage(&self, event: &DisruptionEvent) -> Result<TriageResult, JudgmentServiceError> {
        Ok(triage(event))
    }
}

/// Rule-based triage of a disruption event.
pub fn triage(event: &DisruptionEvent) -> TriageResult {
    let event_type = event
        .event_type
        .as_deref()
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let delay = delay_minutes(
        event.scheduled_departure.as_deref(),
        event.estimated_departure.as_deref(),
    );

    let (mut severity, cause) = match event_type.as_str() {
        "CANCEL" | "CANCELLATION" => (0.95, Cause::Cancel),
        "WEATHER" => (0.75, Cause::Weather),
        "DELAY" | "LATE" => (0.55, Cause::Delay),
        _ => (0.40, Cause::Unknown),
    };

    if let Some(minutes) = delay {
        let floor = DELAY_FLOORS
            .iter()
            .find(|(threshold, _)| minutes >= *threshold)
            .map(|(_, floor)| *floor)
            .unwrap_or(SHORT_DELAY_FLOOR);
        severity = f64::max(severity, floor);
    }

    let mut notes = format!("type={}, severity={:.2}", event_type, severity);
    if let Some(minutes) = delay {
        notes.push_str(&format!(", delay_minutes={}", minutes));
    }

    TriageResult {
        severity_score: round2(severity),
        cause,
        constraints: constraints_for_severity(severity),
        notes,
    }
}

/// Rebooking constraints implied by a severity score. Higher severity never
/// relaxes a constraint.
pub fn constraints_for_severity(severity: f64) -> Constraints {
    if severity >= STRICT_SEVERITY {
        Constraints::new(45, 1, true)
    } else {
        Constraints::new(35, 2, false)
    }
}

/// Whole minutes between two departure timestamps, floored. `None` when
/// either side is missing or unparsable.
pub fn delay_minutes(scheduled: Option<&str>, estimated: Option<&str>) -> Option<i64> {
    let scheduled = parse_timestamp(scheduled?)?;
    let estimated = parse_timestamp(estimated?)?;
    Some((estimated - scheduled).num_milliseconds().div_euclid(60_000))
}

/// Offset-aware timestamps are compared in UTC; naive ones as given.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Deserialize)]
struct TriageJudgment {
    severity_score: f64,
    cause: Cause,
    constraints: Constraints,
    notes: String,
}

/// Triage delegated to a judgment service.
pub struct JudgmentTriager<J> {
    judge: J,
}

impl<J: JudgmentService> JudgmentTriager<J> {
    pub fn new(judge: J) -> Self {
        Self { judge }
    }

    /// Ask the judgment service for a triage and validate the answer.
    /// Schema violations surface as errors; there is no silent fallback.
    pub async fn triage_llm(
        &self,
        event: &DisruptionEvent,
    ) -> Result<TriageResult, JudgmentServiceError> {
        let facts = json!({
            "event_type": event.event_type,
            "flight_number": event.flight_number,
            "origin": event.origin,
            "destination": event.destination,
            "scheduled_departure": event.scheduled_departure,
            "estimated_departure": event.estimated_departure,
            "timestamp": event.timestamp,
            "raw": event.raw,
        });

        let user = format!(
            "Disruption event:\n{}\n\nRules:\n\
             - severity_score must be between 0 and 1\n\
             - Cancellations and long delays increase severity\n\
             - Higher severity → stricter constraints\n",
            facts
        );

        let value = self
            .judge
            .judge(TRIAGE_SYSTEM_PROMPT, &user, TRIAGE_SCHEMA)
            .await?;
        debug!("Triage judgment received: {}", value);

        let judgment: TriageJudgment = serde_json::from_value(value)
            .map_err(|e| JudgmentServiceError::invalid_response(format!("triage: {}", e)))?;

        if !judgment.severity_score.is_finite() {
            return Err(JudgmentServiceError::invalid_response(
                "triage: severity_score is not a finite number",
            ));
        }

        Ok(TriageResult {
            severity_score: judgment.severity_score.clamp(0.0, 1.0),
            cause: judgment.cause,
            constraints: judgment.constraints,
            notes: judgment.notes,
        })
    }
}

#[async_trait]
impl<J: JudgmentService> Triager for JudgmentTriager<J> {
    async fn triage(&self, event: &DisruptionEvent) -> Result<TriageResult, JudgmentServiceError> {
        self.triage_llm(event).await
    }
}
