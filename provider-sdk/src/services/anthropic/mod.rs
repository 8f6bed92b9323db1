//! Anthropic Messages API client
//!
//! Used as a structured-judgment backend: the caller supplies a system
//! prompt, a user prompt and a JSON schema hint, and gets a parsed JSON
//! value back.

mod models;
pub use models::*;

use std::time::Duration;

use log::{debug, info};
use reqwest::Client;
use serde_json::Value;

use crate::config::{AnthropicConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::ServiceClient;
use crate::error::{Result, ServiceError};
use crate::resilience::{RetryConfig, RetryExecutor};
use crate::services::common::{build_http_client, endpoint_url, parse_error_response, UserAgent};
use crate::util::truncate_string;

const MESSAGES_PATH: &str = "/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicClient {
    http_client: Client,
    config: AnthropicConfig,
    retry: RetryExecutor,
}

impl AnthropicClient {
    /// Client configured from the process environment
    pub fn from_env() -> Result<Self> {
        Self::new_with_config(AnthropicConfig::from_provider(&**DEFAULT_PROVIDER))
    }

    pub fn new_with_config(config: AnthropicConfig) -> Result<Self> {
        Self::with_retry(config, RetryConfig::provider_default())
    }

    fn with_retry(config: AnthropicConfig, retry: RetryConfig) -> Result<Self> {
        let http_client = build_http_client(
            Some(UserAgent::for_client("anthropic")),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;

        Ok(Self {
            http_client,
            config,
            retry: RetryExecutor::new(retry),
        })
    }

    pub fn builder() -> AnthropicClientBuilder {
        AnthropicClientBuilder::default()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a Messages API request
    pub async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        self.config.validate()?;
        self.retry.execute(|| self.send_once(request)).await
    }

    async fn send_once(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let url = endpoint_url(&self.config.base_url, MESSAGES_PATH);
        debug!("Sending request to Anthropic: POST {} (model {})", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(parse_error_response("anthropic", MESSAGES_PATH, response).await);
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|e| ServiceError::parsing(format!("Failed to parse Anthropic response: {}", e)))
    }

    /// Ask for a JSON answer matching `schema_hint` and parse the first text
    /// block. A surrounding markdown code fence is tolerated.
    pub async fn json_response(&self, system: &str, user: &str, schema_hint: &str) -> Result<Value> {
        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message::user(format!(
                "{}\n\nReturn ONLY valid JSON matching this schema:\n{}",
                user, schema_hint
            ))],
        };

        let response = self.create_message(&request).await?;
        if let Some(usage) = &response.usage {
            info!(
                "Anthropic judgment completed: model={}, input_tokens={}, output_tokens={}",
                response.model, usage.input_tokens, usage.output_tokens
            );
        }

        let text = response
            .first_text()
            .ok_or_else(|| ServiceError::parsing("Anthropic response has no text content"))?;

        extract_json(text)
    }
}

/// Parse model output as JSON, stripping a markdown fence if present and
/// falling back to the outermost `{...}` span.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = strip_code_fence(text.trim());

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(ServiceError::parsing(format!(
        "Model output is not valid JSON: {}",
        truncate_string(trimmed, 200)
    )))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json) up to the first newline.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

impl ServiceClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }
}

/// Builder for the Anthropic client
#[derive(Default)]
pub struct AnthropicClientBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
    max_tokens: Option<u32>,
    retry_config: Option<RetryConfig>,
}

impl AnthropicClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
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

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = Some(config);
        self
    }

    pub fn build(self) -> Result<AnthropicClient> {
        let mut config = AnthropicConfig::from_provider(&**DEFAULT_PROVIDER);

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }

        AnthropicClient::with_retry(
            config,
            self.retry_config.unwrap_or_else(RetryConfig::provider_default),
        )
    }
}
