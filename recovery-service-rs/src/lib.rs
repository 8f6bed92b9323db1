//! # Recovery Service
//!
//! HTTP surface for disruption recovery: the recommendation pipeline, the
//! disruption dashboard store, the event simulator and provider passthrough
//! routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub mod adapters;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;

pub use error::{ApiError, ErrorResponse};
pub use state::{AppState, Topics};

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .route(
            "/api/v1/recommendations",
            post(routes::recommendations::create_recommendation),
        )
        .route(
            "/simulate/flight-disruption",
            post(routes::simulator::simulate_flight_disruption),
        )
        .route("/simulator/state", get(routes::simulator::simulator_state))
        .route("/disruptions", get(routes::disruptions::list_disruptions))
        .route(
            "/disruptions/:disruption_id",
            get(routes::disruptions::get_disruption),
        )
        .route(
            "/disruptions/:disruption_id/cohorts",
            get(routes::disruptions::get_cohorts),
        )
        .route(
            "/disruptions/:disruption_id/actions",
            get(routes::disruptions::get_actions),
        )
        .route(
            "/disruptions/:disruption_id/audit",
            get(routes::disruptions::get_audit),
        )
        .route(
            "/disruptions/:disruption_id/recommendations",
            get(routes::disruptions::get_recommendations),
        )
        .route(
            "/amadeus/flight-offers",
            get(routes::amadeus::search_flight_offers),
        )
        .route("/amadeus/airlines", get(routes::amadeus::list_airlines))
        .route(
            "/amadeus/airports/:airport_code",
            get(routes::amadeus::get_airport),
        )
        .route(
            "/amadeus/flight-status/:flight_number",
            get(routes::amadeus::get_flight_status),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
