//! Kafka REST proxy (Confluent) publisher
//!
//! Records are produced with the JSON embedded format:
//! `POST {base}/topics/{topic}` with `application/vnd.kafka.json.v2+json`.

use std::time::Duration;

use log::{debug, warn};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{RestProxyConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::ServiceClient;
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, endpoint_url, parse_error_response, UserAgent};
use crate::util::truncate_string;

pub const KAFKA_JSON_CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";

/// One record to produce
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProducerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: Value,
}

impl ProducerRecord {
    pub fn new(key: Option<String>, value: Value) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Serialize)]
struct ProduceRequest<'a> {
    records: &'a [ProducerRecord],
}

/// Per-record result reported by the proxy
#[derive(Debug, Clone, Deserialize)]
pub struct RecordOffset {
    #[serde(default)]
    pub partition: Option<i32>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProduceResponse {
    #[serde(default)]
    pub offsets: Vec<RecordOffset>,
}

/// Publisher backed by a Kafka REST proxy
pub struct RestProxyPublisher {
    http_client: Client,
    config: RestProxyConfig,
}

impl RestProxyPublisher {
    /// `Ok(None)` when no REST proxy is configured.
    pub fn from_env() -> Result<Option<Self>> {
        RestProxyConfig::from_provider(&**DEFAULT_PROVIDER)
            .map(Self::new_with_config)
            .transpose()
    }

    pub fn new_with_config(config: RestProxyConfig) -> Result<Self> {
        config.validate()?;
        let http_client = build_http_client(
            Some(UserAgent::for_client("confluent")),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;

        Ok(Self { http_client, config })
    }

    /// Produce records to `topic`. Fails if the proxy rejects the request or
    /// reports an error for any record.
    pub async fn produce(&self, topic: &str, records: &[ProducerRecord]) -> Result<ProduceResponse> {
        let path = format!("/topics/{}", topic);
        let url = endpoint_url(&self.config.base_url, &path);
        let body = serde_json::to_vec(&ProduceRequest { records })?;

        debug!("Producing {} record(s) to {}", records.len(), url);

        let mut request = self
            .http_client
            .post(&url)
            .header(header::CONTENT_TYPE, KAFKA_JSON_CONTENT_TYPE)
            .header(header::ACCEPT, "application/vnd.kafka.v2+json, application/json")
            .body(body);

        if let (Some(key), Some(secret)) = (&self.config.api_key, &self.config.api_secret) {
            request = request.basic_auth(key, Some(secret));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(parse_error_response("confluent", &path, response).await);
        }

        let text = response.text().await?;
        let produced = match serde_json::from_str::<ProduceResponse>(&text) {
            Ok(produced) => produced,
            Err(e) => {
                warn!(
                    "Unreadable produce response for {} ({}); records accepted without offsets: {}",
                    topic,
                    e,
                    truncate_string(&text, 200)
                );
                ProduceResponse::default()
            }
        };

        if let Some(failed) = produced.offsets.iter().find(|o| o.error_code.is_some()) {
            return Err(ServiceError::service(format!(
                "REST proxy rejected record for {}: {}",
                topic,
                failed.error.as_deref().unwrap_or("unknown error")
            )));
        }

        Ok(produced)
    }

    /// Produce a single keyed JSON value
    pub async fn send(&self, topic: &str, key: Option<&str>, value: Value) -> Result<()> {
        let record = ProducerRecord::new(key.map(str::to_string), value);
        match self.produce(topic, std::slice::from_ref(&record)).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Failed to publish to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

impl ServiceClient for RestProxyPublisher {
    fn name(&self) -> &str {
        "confluent"
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }
}
