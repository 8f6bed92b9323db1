//! Amadeus Self-Service API client
//!
//! Every call authenticates with an OAuth2 client-credentials token that is
//! cached until shortly before it expires.

mod models;
pub use models::*;

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::{AmadeusConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::ServiceClient;
use crate::error::{Result, ServiceError};
use crate::resilience::{RetryConfig, RetryExecutor};
use crate::services::common::{build_http_client, endpoint_url, parse_error_response, UserAgent};

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
const FLIGHT_STATUS_PATH: &str = "/v2/schedule/flights";
const AIRLINES_PATH: &str = "/v1/reference-data/airlines";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 1799;
/// Refresh this long before the provider's expiry.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Amadeus API client
pub struct AmadeusClient {
    http_client: Client,
    config: AmadeusConfig,
    retry: RetryExecutor,
    token: Mutex<Option<AccessToken>>,
}

impl AmadeusClient {
    /// Client configured from the process environment
    pub fn from_env() -> Result<Self> {
        Self::new_with_config(AmadeusConfig::from_provider(&**DEFAULT_PROVIDER))
    }

    pub fn new_with_config(config: AmadeusConfig) -> Result<Self> {
        Self::with_retry(config, RetryConfig::provider_default())
    }

    fn with_retry(config: AmadeusConfig, retry: RetryConfig) -> Result<Self> {
        let http_client = build_http_client(
            Some(UserAgent::for_client("amadeus")),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;

        if !config.has_credentials() {
            warn!("Amadeus credentials not configured; calls will fail until they are set");
        }

        Ok(Self {
            http_client,
            config,
            retry: RetryExecutor::new(retry),
            token: Mutex::new(None),
        })
    }

    pub fn builder() -> AmadeusClientBuilder {
        AmadeusClientBuilder::default()
    }

    /// Raw flight-offers search result (`{data, meta, dictionaries}`)
    pub async fn search_flight_offers(&self, query: &FlightOfferQuery) -> Result<Value> {
        let params = query.to_params();
        let offers = self.get_json(FLIGHT_OFFERS_PATH, &params).await?;

        info!(
            "Fetched {} flight offers: {} -> {} on {}",
            offers
                .get("data")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
            query.origin,
            query.destination,
            query.departure_date
        );
        Ok(offers)
    }

    /// Schedule/status for a flight such as `UA123` on a YYYY-MM-DD date.
    /// The first two characters are the carrier code.
    pub async fn flight_status(&self, flight_number: &str, scheduled_date: &str) -> Result<Value> {
        let flight_number = flight_number.trim();
        if flight_number.chars().count() < 3 {
            return Err(ServiceError::validation(format!(
                "Flight number '{}' must be a carrier code followed by a number",
                flight_number
            )));
        }

        let carrier: String = flight_number.chars().take(2).collect();
        let number: String = flight_number.chars().skip(2).collect();
        let params = [
            ("carrierCode", carrier),
            ("flightNumber", number),
            ("scheduledDepartureDate", scheduled_date.to_string()),
        ];

        self.get_json(FLIGHT_STATUS_PATH, &params).await
    }

    /// Airline reference list
    pub async fn airline_codes(&self) -> Result<Vec<Airline>> {
        let response = self.get_json(AIRLINES_PATH, &[]).await?;

        let records = response
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ServiceError::parsing("Airline response has no data array"))?;

        Ok(records.iter().map(Airline::from_reference).collect())
    }

    /// Airport by IATA code. `Ok(None)` when the provider has no airport
    /// with exactly that code.
    pub async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ServiceError::validation(format!(
                "Airport code '{}' must be three letters",
                code
            )));
        }

        let params = [("subType", "AIRPORT".to_string()), ("keyword", code.clone())];
        let response = self.get_json(LOCATIONS_PATH, &params).await?;

        let airport = response
            .get("data")
            .and_then(Value::as_array)
            .and_then(|records| {
                records.iter().find(|record| {
                    record
                        .get("iataCode")
                        .and_then(Value::as_str)
                        .is_some_and(|iata| iata.eq_ignore_ascii_case(&code))
                })
            })
            .map(|record| Airport::from_location(&code, record));

        if airport.is_none() {
            debug!("Amadeus has no airport {}", code);
        }
        Ok(airport)
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        self.retry.execute(|| self.get_once(path, params)).await
    }

    async fn get_once(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let token = self.access_token().await?;
        let url = endpoint_url(&self.config.base_url, path);
        debug!("Sending request to Amadeus: GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| ServiceError::parsing(format!("Failed to parse Amadeus response: {}", e)));
        }

        if status == StatusCode::UNAUTHORIZED {
            // Revoked or rotated credentials; force a new grant next time.
            self.token.lock().await.take();
        }
        Err(parse_error_response("amadeus", path, response).await)
    }

    /// Cached bearer token, fetching a new one when missing or near expiry.
    async fn access_token(&self) -> Result<String> {
        self.config.validate()?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let url = endpoint_url(&self.config.base_url, TOKEN_PATH);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self.http_client.post(&url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(parse_error_response("amadeus", TOKEN_PATH, response).await);
        }

        let grant: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::parsing(format!("Failed to parse Amadeus token: {}", e)))?;

        let lifetime = grant
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);

        info!("Amadeus access token obtained, valid for {}s", lifetime);
        *cached = Some(AccessToken {
            value: grant.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(grant.access_token)
    }
}

impl ServiceClient for AmadeusClient {
    fn name(&self) -> &str {
        "amadeus"
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn is_configured(&self) -> bool {
        self.config.has_credentials()
    }
}

/// Builder for the Amadeus client
#[derive(Default)]
pub struct AmadeusClientBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    retry_config: Option<RetryConfig>,
}

impl AmadeusClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = Some(config);
        self
    }

    /// Environment values fill whatever was not set explicitly.
    pub fn build(self) -> Result<AmadeusClient> {
        let mut config = AmadeusConfig::from_provider(&**DEFAULT_PROVIDER);

        if let Some(client_id) = self.client_id {
            config.client_id = client_id;
        }
        if let Some(client_secret) = self.client_secret {
            config.client_secret = client_secret;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        AmadeusClient::with_retry(
            config,
            self.retry_config.unwrap_or_else(RetryConfig::provider_default),
        )
    }
}
