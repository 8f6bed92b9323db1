//! HTTP handlers, grouped by surface.

pub mod amadeus;
pub mod disruptions;
pub mod recommendations;
pub mod simulator;

use axum::response::IntoResponse;
use axum::Json;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

pub const SERVICE_NAME: &str = "recovery-service";

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub uptime_seconds: u64,
}

/// Mark the process start for uptime reporting.
pub fn mark_started() {
    Lazy::force(&START_TIME);
}

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        uptime_seconds: START_TIME.elapsed().as_secs(),
    })
}
