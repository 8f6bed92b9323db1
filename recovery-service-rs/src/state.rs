//! Shared application state and its construction from the environment.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use config_rs::{env_or, RecoveryStrategy, Settings, DEFAULT_CACHE_TTL_SECONDS};
use provider_sdk::{
    Airline, Airport, AmadeusClient, AnthropicClient, KeyedTtlCache, RestProxyPublisher, ServiceClient,
    TtlCache,
};
use recovery_core::{
    topics, Decider, EventPublisher, JudgmentDecider, JudgmentService, JudgmentTriager, OfferSearch,
    RecoveryPipeline, RuleTriager, ScoringDecider, Triager,
};

use crate::adapters::{AnthropicJudgment, FlightDataSource, LogPublisher, ProviderOfferSearch, RestProxyEventPublisher};
use crate::store::MockStore;

/// Pipeline with every stage chosen at runtime
pub type SharedPipeline =
    RecoveryPipeline<Arc<dyn Triager>, Arc<dyn Decider>, Arc<dyn OfferSearch>>;

/// Airline reference data is kept for an hour.
pub const AIRLINE_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Airport locations change rarely; entries are kept for a day.
pub const AIRPORT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Topic names, overridable with `TOPIC_*` variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub flight_ops: String,
    pub disruption_state: String,
    pub passenger_cohorts: String,
    pub recovery_actions: String,
    pub agent_audit: String,
    pub amadeus_offers: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            flight_ops: topics::FLIGHT_OPS_EVENTS.to_string(),
            disruption_state: topics::DISRUPTION_STATE.to_string(),
            passenger_cohorts: topics::PASSENGER_COHORTS.to_string(),
            recovery_actions: topics::RECOVERY_ACTIONS.to_string(),
            agent_audit: topics::AGENT_AUDIT.to_string(),
            amadeus_offers: topics::AMADEUS_FLIGHT_OFFERS.to_string(),
        }
    }
}

impl Topics {
    pub fn from_env() -> Self {
        Self {
            flight_ops: env_or("TOPIC_FLIGHT_OPS", topics::FLIGHT_OPS_EVENTS),
            disruption_state: env_or("TOPIC_DISRUPTION_STATE", topics::DISRUPTION_STATE),
            passenger_cohorts: env_or("TOPIC_PASSENGER_COHORTS", topics::PASSENGER_COHORTS),
            recovery_actions: env_or("TOPIC_RECOVERY_ACTIONS", topics::RECOVERY_ACTIONS),
            agent_audit: env_or("TOPIC_AGENT_AUDIT", topics::AGENT_AUDIT),
            amadeus_offers: env_or("TOPIC_AMADEUS_OFFERS", topics::AMADEUS_FLIGHT_OFFERS),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SharedPipeline>,
    pub flights: Arc<dyn FlightDataSource>,
    pub airline_cache: Arc<TtlCache<Vec<Airline>>>,
    pub airport_cache: Arc<KeyedTtlCache<Airport>>,
    pub publisher: Arc<dyn EventPublisher>,
    pub store: Arc<MockStore>,
    pub topics: Arc<Topics>,
    /// `Cache-Control` max-age for offer passthrough responses
    pub offers_max_age: u64,
}

impl AppState {
    /// State over explicit collaborators; the pipeline searches through
    /// `flights`.
    pub fn new(
        triager: Arc<dyn Triager>,
        decider: Arc<dyn Decider>,
        flights: Arc<dyn FlightDataSource>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let search: Arc<dyn OfferSearch> = Arc::new(ProviderOfferSearch::new(Arc::clone(&flights)));

        Self {
            pipeline: Arc::new(RecoveryPipeline::new(triager, decider, search)),
            flights,
            airline_cache: Arc::new(TtlCache::new("airlines", AIRLINE_CACHE_TTL)),
            airport_cache: Arc::new(KeyedTtlCache::new("airports", AIRPORT_CACHE_TTL)),
            publisher,
            store: Arc::new(MockStore::new()),
            topics: Arc::new(Topics::default()),
            offers_max_age: DEFAULT_CACHE_TTL_SECONDS,
        }
    }

    pub fn with_topics(mut self, topics: Topics) -> Self {
        self.topics = Arc::new(topics);
        self
    }

    /// Wire the production collaborators from configuration.
    pub fn from_settings(settings: &Settings) -> provider_sdk::Result<Self> {
        let amadeus = Arc::new(AmadeusClient::from_env()?);
        if !amadeus.is_configured() {
            warn!("{} credentials missing; offer search will report unavailable", amadeus.name());
        }

        let triager: Arc<dyn Triager>;
        let decider: Arc<dyn Decider>;
        match settings.strategy {
            RecoveryStrategy::Judgment => {
                let client = Arc::new(AnthropicClient::from_env()?);
                if !client.is_configured() {
                    warn!("ANTHROPIC_API_KEY not set; delegated stages will fail until it is");
                }
                info!("Using judgment strategy with model {}", client.model());
                let judge: Arc<dyn JudgmentService> = Arc::new(AnthropicJudgment::new(client));
                triager = Arc::new(JudgmentTriager::new(Arc::clone(&judge)));
                decider = Arc::new(JudgmentDecider::new(judge));
            }
            RecoveryStrategy::Rules => {
                info!("Using rules strategy");
                triager = Arc::new(RuleTriager);
                decider = Arc::new(ScoringDecider);
            }
        }

        let publisher: Arc<dyn EventPublisher> = match RestProxyPublisher::from_env()? {
            Some(proxy) => {
                info!("Event producer publishing through {} at {}", proxy.name(), proxy.base_url());
                Arc::new(RestProxyEventPublisher::new(Arc::new(proxy)))
            }
            None => {
                warn!("Event bus not configured, producer disabled");
                Arc::new(LogPublisher)
            }
        };

        let mut state = Self::new(triager, decider, amadeus, publisher).with_topics(Topics::from_env());
        state.offers_max_age = settings.cache_ttl_seconds;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topics_match_core_names() {
        let topics = Topics::default();
        assert_eq!(topics.flight_ops, "flight_ops.events.v1");
        assert_eq!(topics.recovery_actions, "recovery.actions.v1");
        assert_eq!(topics.amadeus_offers, "amadeus.flight_offers.v1");
    }

    #[test]
    fn test_topics_from_env_override() {
        std::env::set_var("TOPIC_AGENT_AUDIT", "audit.custom.v2");
        let topics = Topics::from_env();
        assert_eq!(topics.agent_audit, "audit.custom.v2");
        std::env::remove_var("TOPIC_AGENT_AUDIT");
    }
}
