use axum::extract::State;
use axum::Json;
use log::info;
use serde_json::json;

use recovery_core::{EventEnvelope, RecommendationRequest, RecommendationResponse};

use super::SERVICE_NAME;
use crate::error::ApiError;
use crate::state::AppState;

/// Run the recovery pipeline and publish the outcome.
pub async fn create_recommendation(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    info!(
        "Recommendation requested: type={:?} flight={:?}",
        request.disruption.event_type, request.disruption.flight_number
    );

    let run = state.pipeline.run_detailed(&request).await?;
    let response = run.response;
    let key = request
        .disruption
        .flight_number
        .clone()
        .unwrap_or_else(|| response.trace_id.clone());

    let recommendation = EventEnvelope::create(
        "RECOVERY_RECOMMENDATION",
        SERVICE_NAME,
        serde_json::to_value(&response).unwrap_or_default(),
    );
    state
        .publisher
        .publish(&state.topics.recovery_actions, &key, &recommendation);

    let audit = EventEnvelope::create(
        "AGENT_DECISION",
        SERVICE_NAME,
        json!({
            "trace_id": &response.trace_id,
            "severity_score": run.triage.severity_score,
            "cause": run.triage.cause,
            "triage_notes": run.triage.notes,
            "search": run.search,
            "rebook_notes": run.rebook_notes,
            "decision_notes": run.decision.notes,
            "recommended_offer_ids": response
                .recommended_offers
                .iter()
                .map(|r| r.offer.offer_id.as_str())
                .collect::<Vec<_>>(),
            "confidence": response.confidence,
        }),
    );
    state.publisher.publish(&state.topics.agent_audit, &key, &audit);

    Ok(Json(response))
}
