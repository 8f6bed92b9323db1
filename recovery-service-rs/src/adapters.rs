//! Bridges between provider-sdk clients and the recovery core's
//! collaborator traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local};
use log::{info, warn};
use serde_json::Value;

use provider_sdk::{Airline, Airport, AmadeusClient, AnthropicClient, FlightOfferQuery, RestProxyPublisher, ServiceError};
use recovery_core::{
    EventEnvelope, EventPublisher, JudgmentService, JudgmentServiceError, OfferSearch, SearchParams,
    SearchUnavailable,
};

/// Flight data the API needs from the offer provider.
#[async_trait]
pub trait FlightDataSource: Send + Sync {
    async fn flight_offers(&self, query: &FlightOfferQuery) -> provider_sdk::Result<Value>;

    async fn airlines(&self) -> provider_sdk::Result<Vec<Airline>>;

    /// Raw schedule/status for a flight on a YYYY-MM-DD date.
    async fn flight_status(&self, flight_number: &str, scheduled_date: &str) -> provider_sdk::Result<Value>;

    async fn airport(&self, code: &str) -> provider_sdk::Result<Option<Airport>>;
}

#[async_trait]
impl FlightDataSource for AmadeusClient {
    async fn flight_offers(&self, query: &FlightOfferQuery) -> provider_sdk::Result<Value> {
        self.search_flight_offers(query).await
    }

    async fn airlines(&self) -> provider_sdk::Result<Vec<Airline>> {
        self.airline_codes().await
    }

    async fn flight_status(&self, flight_number: &str, scheduled_date: &str) -> provider_sdk::Result<Value> {
        AmadeusClient::flight_status(self, flight_number, scheduled_date).await
    }

    async fn airport(&self, code: &str) -> provider_sdk::Result<Option<Airport>> {
        self.airport_by_code(code).await
    }
}

/// Today's local date as YYYY-MM-DD.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Departure date used when a search does not name one: tomorrow, local time.
pub fn default_departure_date() -> String {
    (Local::now().date_naive() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

/// `OfferSearch` over any flight data source.
pub struct ProviderOfferSearch {
    source: Arc<dyn FlightDataSource>,
}

impl ProviderOfferSearch {
    pub fn new(source: Arc<dyn FlightDataSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl OfferSearch for ProviderOfferSearch {
    async fn search(&self, params: &SearchParams) -> Result<Value, SearchUnavailable> {
        if params.origin.is_empty() || params.destination.is_empty() {
            return Err(SearchUnavailable(
                "origin and destination are required for an offer search".to_string(),
            ));
        }

        let departure_date = params
            .departure_date
            .clone()
            .unwrap_or_else(default_departure_date);
        let query = FlightOfferQuery::new(&params.origin, &params.destination, departure_date)
            .adults(params.adults)
            .max_results(params.max_results);

        self.source
            .flight_offers(&query)
            .await
            .map_err(|e| SearchUnavailable(e.to_string()))
    }
}

/// `JudgmentService` backed by the Anthropic Messages API.
pub struct AnthropicJudgment {
    client: Arc<AnthropicClient>,
}

impl AnthropicJudgment {
    pub fn new(client: Arc<AnthropicClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JudgmentService for AnthropicJudgment {
    async fn judge(
        &self,
        system: &str,
        user: &str,
        schema_hint: &str,
    ) -> Result<Value, JudgmentServiceError> {
        self.client
            .json_response(system, user, schema_hint)
            .await
            .map_err(judgment_error)
    }
}

fn judgment_error(error: ServiceError) -> JudgmentServiceError {
    match error.root() {
        ServiceError::Configuration(_) => JudgmentServiceError::misconfigured(error.to_string()),
        ServiceError::Parsing(_) => JudgmentServiceError::invalid_response(error.to_string()),
        _ => JudgmentServiceError::unavailable(error.to_string()),
    }
}

/// Publishes through the Kafka REST proxy without blocking the caller.
pub struct RestProxyEventPublisher {
    publisher: Arc<RestProxyPublisher>,
}

impl RestProxyEventPublisher {
    pub fn new(publisher: Arc<RestProxyPublisher>) -> Self {
        Self { publisher }
    }
}

impl EventPublisher for RestProxyEventPublisher {
    fn publish(&self, topic: &str, key: &str, envelope: &EventEnvelope) -> bool {
        let value = match serde_json::to_value(envelope) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize {} for {}: {}", envelope.event_type, topic, e);
                return false;
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available, skipping message to {}", topic);
                return false;
            }
        };

        let publisher = Arc::clone(&self.publisher);
        let topic = topic.to_string();
        let key = key.to_string();
        runtime.spawn(async move {
            if publisher.send(&topic, Some(&key), value).await.is_ok() {
                info!("Message delivered to {} (key {})", topic, key);
            }
        });
        true
    }
}

/// Stand-in used when no event bus is configured.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl EventPublisher for LogPublisher {
    fn publish(&self, topic: &str, key: &str, envelope: &EventEnvelope) -> bool {
        warn!(
            "Event producer disabled, skipping {} (key {}) to {}",
            envelope.event_type, key, topic
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubSource {
        queries: Mutex<Vec<FlightOfferQuery>>,
        fail: bool,
    }

    #[async_trait]
    impl FlightDataSource for StubSource {
        async fn flight_offers(&self, query: &FlightOfferQuery) -> provider_sdk::Result<Value> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                Err(ServiceError::network("connection refused"))
            } else {
                Ok(serde_json::json!({"data": []}))
            }
        }

        async fn airlines(&self) -> provider_sdk::Result<Vec<Airline>> {
            Ok(Vec::new())
        }

        async fn flight_status(&self, _: &str, _: &str) -> provider_sdk::Result<Value> {
            Ok(Value::Null)
        }

        async fn airport(&self, _: &str) -> provider_sdk::Result<Option<Airport>> {
            Ok(None)
        }
    }

    fn params(origin: &str, date: Option<&str>) -> SearchParams {
        SearchParams {
            origin: origin.to_string(),
            destination: "ORD".to_string(),
            departure_date: date.map(str::to_string),
            adults: 2,
            max_results: 4,
        }
    }

    #[tokio::test]
    async fn test_search_builds_provider_query() {
        let source = Arc::new(StubSource { queries: Mutex::new(Vec::new()), fail: false });
        let search = ProviderOfferSearch::new(source.clone());

        search.search(&params("SFO", Some("2025-12-31"))).await.unwrap();

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0], FlightOfferQuery::new("SFO", "ORD", "2025-12-31").adults(2).max_results(4));
    }

    #[tokio::test]
    async fn test_search_defaults_to_tomorrow() {
        let source = Arc::new(StubSource { queries: Mutex::new(Vec::new()), fail: false });
        let search = ProviderOfferSearch::new(source.clone());

        search.search(&params("SFO", None)).await.unwrap();

        assert_eq!(source.queries.lock().unwrap()[0].departure_date, default_departure_date());
    }

    #[tokio::test]
    async fn test_search_without_route_is_unavailable() {
        let source = Arc::new(StubSource { queries: Mutex::new(Vec::new()), fail: false });
        let search = ProviderOfferSearch::new(source.clone());

        assert!(search.search(&params("", None)).await.is_err());
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_unavailable() {
        let source = Arc::new(StubSource { queries: Mutex::new(Vec::new()), fail: true });
        let search = ProviderOfferSearch::new(source);

        let err = search.search(&params("SFO", None)).await.unwrap_err();
        assert!(err.0.contains("connection refused"));
    }

    #[test]
    fn test_judgment_error_mapping() {
        assert!(matches!(
            judgment_error(ServiceError::configuration("no key")),
            JudgmentServiceError::Misconfigured(_)
        ));
        assert!(matches!(
            judgment_error(ServiceError::parsing("not json")),
            JudgmentServiceError::InvalidResponse(_)
        ));
        assert!(matches!(
            judgment_error(ServiceError::rate_limit("slow down")),
            JudgmentServiceError::Unavailable(_)
        ));
    }

    #[test]
    fn test_log_publisher_reports_skip() {
        let envelope = EventEnvelope::create("TEST", "unit", serde_json::json!({}));
        assert!(!LogPublisher.publish("agent.audit.v1", "k", &envelope));
    }
}
