use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{DisruptionDetail, DisruptionFilter};

const NOT_FOUND: &str = "Disruption not found";

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct DisruptionQuery {
    pub airport: Option<String>,
    pub severity: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

pub async fn list_disruptions(
    State(state): State<AppState>,
    Query(query): Query<DisruptionQuery>,
) -> Json<Value> {
    let items = state.store.list_disruptions(&DisruptionFilter {
        airport: query.airport,
        severity: query.severity,
        limit: query.limit,
        offset: query.offset,
    });
    Json(json!({ "items": items }))
}

pub async fn get_disruption(
    State(state): State<AppState>,
    Path(disruption_id): Path<String>,
) -> Result<Json<DisruptionDetail>, ApiError> {
    state
        .store
        .disruption_detail(&disruption_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}

pub async fn get_cohorts(
    State(state): State<AppState>,
    Path(disruption_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    found(state.store.cohorts(&disruption_id))
}

pub async fn get_actions(
    State(state): State<AppState>,
    Path(disruption_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    found(state.store.actions(&disruption_id))
}

pub async fn get_audit(
    State(state): State<AppState>,
    Path(disruption_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    found(state.store.audit(&disruption_id))
}

/// Stored recommendations for a disruption. None are persisted yet.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(disruption_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .disruption(&disruption_id)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(json!({
        "disruption_id": disruption_id,
        "recommendations": [],
    })))
}

fn found(document: Option<Value>) -> Result<Json<Value>, ApiError> {
    document
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}
