use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use provider_sdk::{FlightOfferQuery, ServiceError};
use recovery_core::EventEnvelope;

use crate::adapters::{default_departure_date, today};
use crate::error::ApiError;
use crate::state::{AppState, AIRLINE_CACHE_TTL, AIRPORT_CACHE_TTL};

/// Airlines returned by the reference route
pub const MAX_AIRLINES: usize = 100;

fn default_adults() -> u32 {
    1
}

fn default_max_results() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct FlightOffersParams {
    pub origin: String,
    pub destination: String,
    pub departure_date: Option<String>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl FlightOffersParams {
    fn validate(&self) -> Result<(), ApiError> {
        if !(1..=9).contains(&self.adults) {
            return Err(ApiError::BadRequest("adults must be between 1 and 9".to_string()));
        }
        if !(1..=50).contains(&self.max_results) {
            return Err(ApiError::BadRequest(
                "max_results must be between 1 and 50".to_string(),
            ));
        }
        Ok(())
    }
}

/// Provider passthrough: `{offers, meta, dictionaries}`.
pub async fn search_flight_offers(
    State(state): State<AppState>,
    Query(params): Query<FlightOffersParams>,
) -> Result<impl IntoResponse, ApiError> {
    params.validate()?;

    let departure_date = params
        .departure_date
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(default_departure_date);
    let query = FlightOfferQuery::new(&params.origin, &params.destination, &departure_date)
        .adults(params.adults)
        .max_results(params.max_results);

    let offers = state.flights.flight_offers(&query).await.map_err(|e| {
        ApiError::ServiceUnavailable(format!("Amadeus API unavailable or not configured: {}", e))
    })?;

    let data = offers.get("data").cloned().unwrap_or_else(|| json!([]));
    let offers_count = data.as_array().map(Vec::len).unwrap_or(0);

    let key = format!("{}-{}", params.origin, params.destination);
    let event = EventEnvelope::create(
        "FLIGHT_OFFERS_FETCHED",
        "amadeus_api",
        json!({
            "origin": params.origin,
            "destination": params.destination,
            "departure_date": departure_date,
            "offers_count": offers_count,
            "offers": &offers,
        }),
    );
    state.publisher.publish(&state.topics.amadeus_offers, &key, &event);

    let body = json!({
        "offers": data,
        "meta": offers.get("meta").cloned().unwrap_or_else(|| json!({})),
        "dictionaries": offers.get("dictionaries").cloned().unwrap_or_else(|| json!({})),
    });

    Ok((
        [(header::CACHE_CONTROL, format!("public, max-age={}", state.offers_max_age))],
        Json(body),
    ))
}

/// Airline reference list, cached with a stale fallback.
pub async fn list_airlines(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let flights = state.flights.clone();
    let lookup = state
        .airline_cache
        .get_or_refresh(|| async move {
            let mut airlines = flights.airlines().await?;
            airlines.truncate(MAX_AIRLINES);
            info!("Cached {} airlines for {:?}", airlines.len(), AIRLINE_CACHE_TTL);
            Ok(airlines)
        })
        .await
        .map_err(|e| {
            ApiError::ServiceUnavailable(format!(
                "Airlines data is currently unavailable. Check Amadeus credentials or network. ({})",
                e
            ))
        })?;

    let airlines: Value = json!({ "airlines": lookup.into_inner() });
    Ok((
        [(
            header::CACHE_CONTROL,
            format!("public, max-age={}", AIRLINE_CACHE_TTL.as_secs()),
        )],
        Json(airlines),
    ))
}

#[derive(Debug, Deserialize)]
pub struct FlightStatusParams {
    pub scheduled_date: Option<String>,
}

/// Provider schedule/status passthrough; the date defaults to today.
pub async fn get_flight_status(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
    Query(params): Query<FlightStatusParams>,
) -> Result<Json<Value>, ApiError> {
    let scheduled_date = params
        .scheduled_date
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(today);

    let status = state
        .flights
        .flight_status(&flight_number, &scheduled_date)
        .await
        .map_err(|e| match e.root() {
            ServiceError::Validation(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::ServiceUnavailable(format!(
                "Amadeus API unavailable or not configured: {}",
                e
            )),
        })?;

    info!("Flight status served for {} on {}", flight_number, scheduled_date);
    Ok(Json(status))
}

/// Airport name and coordinates by IATA code. Found airports are cached.
pub async fn get_airport(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = code.trim().to_ascii_uppercase();
    let flights = state.flights.clone();
    let lookup_code = code.clone();

    let lookup = state
        .airport_cache
        .get_or_refresh(&code, || async move {
            flights.airport(&lookup_code).await?.ok_or_else(|| {
                ServiceError::not_found(format!("Airport {} not found", lookup_code))
            })
        })
        .await
        .map_err(|e| match e.root() {
            ServiceError::NotFound(_) => ApiError::NotFound(format!("Airport {} not found", code)),
            ServiceError::Validation(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::ServiceUnavailable(format!(
                "Airport data is currently unavailable ({})",
                e
            )),
        })?;

    Ok((
        [(
            header::CACHE_CONTROL,
            format!("public, max-age={}", AIRPORT_CACHE_TTL.as_secs()),
        )],
        Json(lookup.into_inner()),
    ))
}
