//! # Provider SDK
//!
//! Typed clients for the external providers the recovery service talks to.
//!
//! This crate provides:
//!
//! - `AmadeusClient`: OAuth2-authenticated flight-offer search, flight status
//!   and airline/airport reference data
//! - `AnthropicClient`: structured JSON judgments over the Messages API
//! - `RestProxyPublisher`: event publication through a Kafka REST proxy
//! - `ServiceError`: normalized error type with retry classification
//! - `RetryExecutor`: exponential backoff for transient failures
//! - `TtlCache` / `KeyedTtlCache`: expiring caches with stale fallback

pub mod core;
pub use core::ServiceClient;

pub mod services;
pub use services::amadeus::{Airline, Airport, AmadeusClient, AmadeusClientBuilder, FlightOfferQuery};
pub use services::anthropic::{AnthropicClient, AnthropicClientBuilder};
pub use services::confluent::{ProducerRecord, RestProxyPublisher};

pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

pub mod resilience;
pub use resilience::{RetryConfig, RetryExecutor};

pub mod config;
pub use config::{
    AmadeusConfig, AnthropicConfig, ConfigProvider, ConfigProviderExt, RestProxyConfig,
    ServiceConfig,
};

pub mod cache;
pub use cache::{CacheLookup, KeyedTtlCache, TtlCache};

mod util;

#[cfg(test)]
mod tests;
