//! Data contracts shared by every pipeline stage.
//!
//! Upstream payloads are loosely typed, so the ingress types here carry a
//! single normalization step (`DisruptionEvent::from_value`,
//! `SearchParams::from_request`) instead of scattering key lookups through
//! the stages.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Max stops applied when constraints carry no usable value.
pub const DEFAULT_MAX_STOPS: u32 = 2;

/// Adults assumed when the passenger block does not say.
pub const DEFAULT_ADULTS: u32 = 1;

/// Provider result cap when the search block does not say.
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// A reported operational irregularity affecting one flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct DisruptionEvent {
    /// DELAY | CANCEL | WEATHER | ... as sent upstream, not yet normalized
    pub event_type: Option<String>,
    pub flight_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// ISO-8601 local time, timezone optional
    pub scheduled_departure: Option<String>,
    /// ISO-8601 local time, timezone optional
    pub estimated_departure: Option<String>,
    pub timestamp: Option<String>,
    /// Forward-compatible passthrough, never interpreted by the pipeline
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl DisruptionEvent {
    /// Build an event from any JSON value, accepting snake_case and camelCase
    /// spellings. Non-object input yields an empty event.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            event_type: first_string(obj, &["event_type", "type", "eventType"]),
            flight_number: first_string(obj, &["flight_number", "flightNumber"]),
            origin: first_string(obj, &["origin"]),
            destination: first_string(obj, &["destination"]),
            scheduled_departure: first_string(obj, &["scheduled_departure", "scheduledDeparture"]),
            estimated_departure: first_string(obj, &["estimated_departure", "estimatedDeparture"]),
            timestamp: first_string(obj, &["timestamp"]),
            raw: obj
                .get("raw")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl From<Value> for DisruptionEvent {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

/// Disruption cause vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Cause {
    Delay,
    Cancel,
    Weather,
    Crew,
    Atc,
    Maintenance,
    Unknown,
}

impl Cause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::Delay => "DELAY",
            Cause::Cancel => "CANCEL",
            Cause::Weather => "WEATHER",
            Cause::Crew => "CREW",
            Cause::Atc => "ATC",
            Cause::Maintenance => "MAINTENANCE",
            Cause::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for Cause {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DELAY" => Cause::Delay,
            "CANCEL" => Cause::Cancel,
            "WEATHER" => Cause::Weather,
            "CREW" => Cause::Crew,
            "ATC" => Cause::Atc,
            "MAINTENANCE" => Cause::Maintenance,
            _ => Cause::Unknown,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy bounds on acceptable replacement itineraries.
///
/// Every field is optional and coerced leniently on input: a judgment
/// service may send `"1"` or omit a key, and the request must not fail for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub min_layover_minutes: Option<u32>,

    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub max_stops: Option<u32>,

    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub avoid_overnight: Option<bool>,
}

impl Constraints {
    pub fn new(min_layover_minutes: u32, max_stops: u32, avoid_overnight: bool) -> Self {
        Self {
            min_layover_minutes: Some(min_layover_minutes),
            max_stops: Some(max_stops),
            avoid_overnight: Some(avoid_overnight),
        }
    }

    pub fn effective_max_stops(&self) -> u32 {
        self.max_stops.unwrap_or(DEFAULT_MAX_STOPS)
    }
}

/// Output of the triage stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    /// 0.0 (low) to 1.0 (high)
    pub severity_score: f64,
    pub cause: Cause,
    pub constraints: Constraints,
    pub notes: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Provider-agnostic candidate itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOffer {
    pub offer_id: String,
    pub total_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Duration notation such as PT8H12M
    pub total_duration: String,
    pub stops: u32,
    /// e.g. ["SFO", "SEA", "ORD"]
    pub route: Vec<String>,
    #[serde(default)]
    pub carriers: Vec<String>,
    /// Provider record as received
    #[serde(default)]
    pub raw: Value,
}

/// One ranked entry of a decision. The offer is shared, not owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedOffer {
    pub rank: u32,
    pub offer: Arc<NormalizedOffer>,
    /// Lower is better
    pub score: f64,
}

/// Output of the decision stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub recommended: Vec<RecommendedOffer>,
    pub reasoning: Vec<String>,
    pub confidence: f64,
    pub notes: String,
}

/// Inbound request to the recommendation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub disruption: DisruptionEvent,

    /// e.g. {"adults": 1}
    #[serde(default)]
    pub passenger: Map<String, Value>,

    /// e.g. {"origin": "SFO", "destination": "ORD", "date": "2025-12-31", "max_results": 5}
    #[serde(default)]
    pub search: Map<String, Value>,
}

/// Normalized offer-search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    pub departure_date: Option<String>,
    pub adults: u32,
    pub max_results: u32,
}

impl SearchParams {
    /// Pull search parameters out of a request. Origin and destination fall
    /// back to the disruption itself when the search block omits them.
    pub fn from_request(request: &RecommendationRequest) -> Self {
        let search = &request.search;
        let disruption = &request.disruption;

        Self {
            origin: first_string(search, &["origin"])
                .or_else(|| disruption.origin.clone())
                .unwrap_or_default(),
            destination: first_string(search, &["destination"])
                .or_else(|| disruption.destination.clone())
                .unwrap_or_default(),
            departure_date: first_string(search, &["departure_date", "date", "departureDate"]),
            adults: request
                .passenger
                .get("adults")
                .and_then(coerce_u32)
                .unwrap_or(DEFAULT_ADULTS),
            max_results: search
                .get("max_results")
                .and_then(coerce_u32)
                .unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }
}

/// Final pipeline output returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub trace_id: String,
    pub severity_score: f64,
    #[serde(default)]
    pub recommended_offers: Vec<RecommendedOffer>,
    #[serde(default)]
    pub reasoning: Vec<String>,
    pub confidence: f64,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First key holding a non-empty string (numbers are stringified).
pub(crate) fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Integer coercion that accepts numbers and numeric strings.
pub(crate) fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_u32(&value))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_bool(&value))
}
