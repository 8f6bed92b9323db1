//! Decision stage: rank filtered offers and explain the choice.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::duration::parse_duration_minutes;
use crate::judgment::{JudgmentService, JudgmentServiceError};
use crate::models::{round2, DecisionResult, NormalizedOffer, RecommendedOffer};

/// Offers recommended per decision unless the caller says otherwise.
pub const DEFAULT_TOP_K: usize = 3;

const DURATION_WEIGHT: f64 = 1.0;
const STOP_PENALTY: f64 = 90.0;
const PRICE_WEIGHT: f64 = 0.15;

const CONFIDENCE_MANY: f64 = 0.75;
const CONFIDENCE_SINGLE: f64 = 0.6;
const CONFIDENCE_NONE: f64 = 0.2;

const DECISION_SYSTEM_PROMPT: &str = "You are an airline rebooking decision agent. \
Choose the best rebooking options based on risk and passenger experience.";

const DECISION_SCHEMA: &str = r#"{
  "recommended_offer_ids": ["string"],
  "reasoning": ["string"],
  "confidence": 0.0
}"#;

#[async_trait]
pub trait Decider: Send + Sync {
    async fn decide(
        &self,
        offers: &[Arc<NormalizedOffer>],
        triage_notes: &str,
        top_k: usize,
    ) -> Result<DecisionResult, JudgmentServiceError>;
}

#[async_trait]
impl<D: Decider + ?Sized> Decider for Arc<D> {
    async fn decide(
        &self,
        offers: &[Arc<NormalizedOffer>],
        triage_notes: &str,
        top_k: usize,
    ) -> Result<DecisionResult, JudgmentServiceError> {
        (**self).decide(offers, triage_notes, top_k).await
    }
}

/// Weighted-score ranking. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringDecider;

#[async_trait]
impl Decider for ScoringDecider {
    async fn decide(
        &self,
        offers: &[Arc<NormalizedOffer>],
        triage_notes: &str,
        top_k: usize,
    ) -> Result<DecisionResult, JudgmentServiceError> {
        Ok(decide(offers, triage_notes, top_k))
    }
}

/// Lower is better: duration dominates, each stop costs 90 minutes, price
/// is a mild tie-breaker.
pub fn score_offer(offer: &NormalizedOffer) -> f64 {
    let minutes = parse_duration_minutes(&offer.total_duration) as f64;
    minutes * DURATION_WEIGHT + f64::from(offer.stops) * STOP_PENALTY + offer.total_price * PRICE_WEIGHT
}

fn no_offers() -> DecisionResult {
    DecisionResult {
        recommended: Vec::new(),
        reasoning: vec!["No available rebooking offers after applying constraints.".to_string()],
        confidence: CONFIDENCE_NONE,
        notes: "no_offers".to_string(),
    }
}

fn route_label(offer: &NormalizedOffer) -> String {
    if offer.route.is_empty() {
        "N/A".to_string()
    } else {
        offer.route.join(" → ")
    }
}

/// Deterministic decision. Equal scores keep their input order.
pub fn decide(offers: &[Arc<NormalizedOffer>], triage_notes: &str, top_k: usize) -> DecisionResult {
    if offers.is_empty() {
        return no_offers();
    }

    let mut scored: Vec<(&Arc<NormalizedOffer>, f64)> =
        offers.iter().map(|offer| (offer, score_offer(offer))).collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    let recommended: Vec<RecommendedOffer> = scored
        .iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (offer, score))| RecommendedOffer {
            rank: i as u32 + 1,
            offer: Arc::clone(*offer),
            score: round2(*score),
        })
        .collect();

    let best = scored[0].0;
    let reasoning = vec![
        "Chosen best overall score (duration + stops + price).".to_string(),
        format!("Best option route: {}", route_label(best)),
        format!("Triage: {}", triage_notes),
    ];

    let confidence = if offers.len() >= 2 {
        CONFIDENCE_MANY
    } else {
        CONFIDENCE_SINGLE
    };

    DecisionResult {
        notes: format!("offers_in={}, recommended={}", offers.len(), recommended.len()),
        recommended,
        reasoning,
        confidence,
    }
}

#[derive(Debug, Deserialize)]
struct DecisionJudgment {
    recommended_offer_ids: Vec<Value>,
    reasoning: Vec<String>,
    confidence: f64,
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decision delegated to a judgment service.
pub struct JudgmentDecider<J> {
    judge: J,
}

impl<J: JudgmentService> JudgmentDecider<J> {
    pub fn new(judge: J) -> Self {
        Self { judge }
    }

    /// Ask the judgment service to pick offers by id. Unknown ids are
    /// dropped and ranks stay dense over the matches. Scores are 0.0.
    pub async fn decide_llm(
        &self,
        offers: &[Arc<NormalizedOffer>],
        triage_notes: &str,
        top_k: usize,
    ) -> Result<DecisionResult, JudgmentServiceError> {
        if offers.is_empty() {
            return Ok(no_offers());
        }

        let summaries: Vec<Value> = offers
            .iter()
            .map(|o| {
                json!({
                    "offer_id": o.offer_id,
                    "price": o.total_price,
                    "duration": o.total_duration,
                    "stops": o.stops,
                    "route": o.route,
                    "carriers": o.carriers,
                })
            })
            .collect();

        let user = format!(
            "Triage notes:\n{}\n\nAvailable offers:\n{}\n\n\
             Choose the best {} offers.\n\
             Prefer fewer stops, shorter duration, and reliable connections.\n",
            triage_notes,
            Value::Array(summaries),
            top_k.min(offers.len())
        );

        let value = self
            .judge
            .judge(DECISION_SYSTEM_PROMPT, &user, DECISION_SCHEMA)
            .await?;
        debug!("Decision judgment received: {}", value);

        let judgment: DecisionJudgment = serde_json::from_value(value)
            .map_err(|e| JudgmentServiceError::invalid_response(format!("decision: {}", e)))?;

        if !judgment.confidence.is_finite() {
            return Err(JudgmentServiceError::invalid_response(
                "decision: confidence is not a finite number",
            ));
        }

        let by_id: HashMap<&str, &Arc<NormalizedOffer>> =
            offers.iter().map(|o| (o.offer_id.as_str(), o)).collect();
        let mut seen = HashSet::new();

        let recommended: Vec<RecommendedOffer> = judgment
            .recommended_offer_ids
            .iter()
            .take(top_k)
            .filter_map(id_text)
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .filter(|offer| seen.insert(offer.offer_id.clone()))
            .enumerate()
            .map(|(i, offer)| RecommendedOffer {
                rank: i as u32 + 1,
                offer: Arc::clone(offer),
                score: 0.0,
            })
            .collect();

        Ok(DecisionResult {
            recommended,
            reasoning: judgment.reasoning,
            confidence: judgment.confidence.clamp(0.0, 1.0),
            notes: "llm_decision".to_string(),
        })
    }
}

#[async_trait]
impl<J: JudgmentService> Decider for JudgmentDecider<J> {
    async fn decide(
        &self,
        offers: &[Arc<NormalizedOffer>],
        triage_notes: &str,
        top_k: usize,
    ) -> Result<DecisionResult, JudgmentServiceError> {
        self.decide_llm(offers, triage_notes, top_k).await
    }
}
