//! Configuration management for provider clients
//!
//! Values come from a `ConfigProvider`; in production that is the process
//! environment, in tests an in-memory map. Several settings accept more than
//! one variable name so older deployments keep working.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{Result, ServiceError};

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid float for key {}: {}", key, e)))
    }

    /// First non-empty value among several accepted keys
    fn get_first(&self, keys: &[&str]) -> Result<String> {
        keys.iter()
            .find_map(|key| self.get_string(key).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                ServiceError::configuration(format!("None of these keys are set: {}", keys.join(", ")))
            })
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a float configuration value with a default
    fn get_float_or(&self, key: &str, default: f64) -> f64 {
        self.get_float(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let key = key
            .to_uppercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");

        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key),
            None => key,
        }
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider (unprefixed process environment)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new()));

/// Trait for provider-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Provider name
    fn service_name(&self) -> &str;
}

pub const AMADEUS_DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";
pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Amadeus Self-Service API configuration
#[derive(Clone)]
pub struct AmadeusConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Debug for AmadeusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmadeusConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: AMADEUS_DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl AmadeusConfig {
    /// Load from a provider. Missing credentials are not an error here: the
    /// client reports them on first use so the service can still start.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Self {
        Self {
            client_id: provider
                .get_first(&["amadeus_client_id", "amadeus_api_key"])
                .unwrap_or_default(),
            client_secret: provider
                .get_first(&["amadeus_client_secret", "amadeus_api_secret"])
                .unwrap_or_default(),
            base_url: provider
                .get_first(&["amadeus_api_base_url", "amadeus_host"])
                .map(|url| normalize_base_url(&url))
                .unwrap_or_else(|_| AMADEUS_DEFAULT_BASE_URL.to_string()),
            timeout_seconds: provider.get_int_or("amadeus_timeout_seconds", 30).max(1) as u64,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl ServiceConfig for AmadeusConfig {
    fn validate(&self) -> Result<()> {
        if !self.has_credentials() {
            return Err(ServiceError::configuration(
                "Amadeus credentials are not configured (AMADEUS_CLIENT_ID / AMADEUS_CLIENT_SECRET)",
            ));
        }
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("Amadeus base URL is required"));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "amadeus"
    }
}

/// Anthropic Messages API configuration
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            base_url: ANTHROPIC_DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 60,
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

impl AnthropicConfig {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Self {
        let defaults = Self::default();
        Self {
            api_key: provider.get_string_or("anthropic_api_key", ""),
            model: provider
                .get_first(&["claude_model", "anthropic_model"])
                .unwrap_or(defaults.model),
            base_url: provider
                .get_string("anthropic_base_url")
                .map(|url| normalize_base_url(&url))
                .unwrap_or(defaults.base_url),
            timeout_seconds: provider
                .get_int_or("anthropic_timeout_seconds", defaults.timeout_seconds as i64)
                .max(1) as u64,
            temperature: provider.get_float_or("anthropic_temperature", 0.2) as f32,
            max_tokens: provider
                .get_int_or("anthropic_max_tokens", defaults.max_tokens as i64)
                .max(1) as u32,
        }
    }
}

impl ServiceConfig for AnthropicConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::configuration(
                "Anthropic API key not set. Set ANTHROPIC_API_KEY in .env or env vars.",
            ));
        }
        if self.model.is_empty() {
            return Err(ServiceError::configuration("Anthropic model is required"));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "anthropic"
    }
}

/// Kafka REST proxy (Confluent) configuration
#[derive(Clone, Default)]
pub struct RestProxyConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub timeout_seconds: u64,
}

impl Debug for RestProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestProxyConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl RestProxyConfig {
    /// `None` when no REST proxy URL is configured.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Option<Self> {
        let base_url = provider
            .get_first(&["confluent_rest_url", "kafka_rest_url"])
            .ok()?;

        Some(Self {
            base_url: normalize_base_url(&base_url),
            api_key: provider.get_string("confluent_api_key").ok().filter(|v| !v.is_empty()),
            api_secret: provider.get_string("confluent_api_secret").ok().filter(|v| !v.is_empty()),
            timeout_seconds: provider.get_int_or("confluent_timeout_seconds", 10).max(1) as u64,
        })
    }
}

impl ServiceConfig for RestProxyConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("REST proxy URL is required"));
        }
        if self.api_key.is_some() != self.api_secret.is_some() {
            return Err(ServiceError::configuration(
                "CONFLUENT_API_KEY and CONFLUENT_API_SECRET must be set together",
            ));
        }
        Ok(())
    }

    fn service_name(&self) -> &str {
        "confluent"
    }
}

/// Bare host names get an https scheme; trailing slashes are dropped.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("key1", "value1");
        provider.set("key2", "123");

        assert_eq!(provider.get_string("key1").unwrap(), "value1");
        assert_eq!(provider.get_int("key2").unwrap(), 123);
        assert!(provider.get_string("key3").is_err());
    }

    #[test]
    fn test_env_key_format() {
        assert_eq!(EnvConfigProvider::new().format_key("amadeus_client_id"), "AMADEUS_CLIENT_ID");
        assert_eq!(
            EnvConfigProvider::new().with_prefix("TEST").format_key("base-url"),
            "TEST_BASE_URL"
        );
    }

    #[test]
    fn test_get_first_skips_empty_values() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("amadeus_client_id", "");
        provider.set("amadeus_api_key", "legacy-id");

        assert_eq!(
            provider.get_first(&["amadeus_client_id", "amadeus_api_key"]).unwrap(),
            "legacy-id"
        );
        assert!(provider.get_first(&["nope", "also_nope"]).is_err());
    }

    #[test]
    fn test_amadeus_config_aliases_and_defaults() {
        let config = AmadeusConfig::from_provider(&MemoryConfigProvider::new());
        assert_eq!(config.base_url, AMADEUS_DEFAULT_BASE_URL);
        assert!(!config.has_credentials());
        assert!(config.validate().is_err());

        let mut provider = MemoryConfigProvider::new();
        provider.set("amadeus_api_key", "id");
        provider.set("amadeus_api_secret", "secret");
        provider.set("amadeus_host", "api.amadeus.com/");

        let config = AmadeusConfig::from_provider(&provider);
        assert_eq!(config.client_id, "id");
        assert_eq!(config.base_url, "https://api.amadeus.com");
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", config).contains("secret\""));
    }

    #[test]
    fn test_anthropic_config() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("claude_model", "claude-3-5-sonnet-latest");

        let config = AnthropicConfig::from_provider(&provider);
        assert_eq!(config.model, "claude-3-5-sonnet-latest");
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!(config.validate().is_err());

        provider.set("anthropic_api_key", "sk-test");
        assert!(AnthropicConfig::from_provider(&provider).validate().is_ok());
    }

    #[test]
    fn test_rest_proxy_config() {
        assert!(RestProxyConfig::from_provider(&MemoryConfigProvider::new()).is_none());

        let mut provider = MemoryConfigProvider::new();
        provider.set("confluent_rest_url", "http://localhost:8082/");
        provider.set("confluent_api_key", "key");

        let config = RestProxyConfig::from_provider(&provider).unwrap();
        assert_eq!(config.base_url, "http://localhost:8082");
        assert!(config.validate().is_err());

        provider.set("confluent_api_secret", "secret");
        assert!(RestProxyConfig::from_provider(&provider).unwrap().validate().is_ok());
    }
}
