//! config-rs/lib.rs
//! Shared configuration utilities for the recovery service
//! Provides `.env` loading, port/address resolution and process settings

use std::env;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Default HTTP port when neither `RECOVERY_SERVICE_PORT` nor `API_PORT` is set
pub const DEFAULT_API_PORT: u16 = 8000;

/// Default cache TTL for provider reference data
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Load variables from a `.env` file in the working directory (or a parent),
/// if one exists. Already-set variables are not overridden.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Failed to load .env file: {}", e),
    }
}

/// Value of `name`, or `default` when unset or empty
pub fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "RECOVERY")
/// * `default_port` - The default port to use if not specified in environment
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", service_name.to_uppercase());
    match env::var(&var_name) {
        Ok(value) => value.trim().parse::<u16>().unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        }),
        Err(_) => default_port,
    }
}

/// Create a SocketAddr for binding a service
///
/// `{SERVICE}_SERVICE_ADDR` may hold a full `host:port` (optionally with an
/// `http://` prefix); otherwise the service binds all interfaces on the
/// port from [`get_service_port`].
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", service_name.to_uppercase());

    if let Ok(addr_str) = env::var(&var_name) {
        let trimmed = addr_str
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://");
        match trimmed.parse::<SocketAddr>() {
            Ok(addr) => return addr,
            Err(_) => log::warn!("Invalid address format in {}, using default", var_name),
        }
    }

    let port = get_service_port(service_name, default_port);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Which implementation the triage and decision stages use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryStrategy {
    /// Delegate to the language-model judgment service
    #[default]
    Judgment,
    /// Deterministic rules and scoring only
    Rules,
}

impl FromStr for RecoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "judgment" | "llm" | "delegated" => Ok(RecoveryStrategy::Judgment),
            "rules" | "rule" | "deterministic" => Ok(RecoveryStrategy::Rules),
            other => Err(format!("unknown recovery strategy '{}'", other)),
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryStrategy::Judgment => write!(f, "judgment"),
            RecoveryStrategy::Rules => write!(f, "rules"),
        }
    }
}

/// Process-wide settings for the recovery service
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub environment: String,
    pub api_port: u16,
    pub log_level: String,
    pub strategy: RecoveryStrategy,
    pub cache_ttl_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            api_port: DEFAULT_API_PORT,
            log_level: "info".to_string(),
            strategy: RecoveryStrategy::default(),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`. Unparseable values fall back to the
    /// default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_port = get("RECOVERY_SERVICE_PORT")
            .or_else(|| get("API_PORT"))
            .map(|raw| {
                raw.parse::<u16>().unwrap_or_else(|_| {
                    log::warn!("Invalid API port '{}', using default {}", raw, DEFAULT_API_PORT);
                    DEFAULT_API_PORT
                })
            })
            .unwrap_or(defaults.api_port);

        let strategy = get("RECOVERY_STRATEGY")
            .map(|raw| {
                raw.parse::<RecoveryStrategy>().unwrap_or_else(|e| {
                    log::warn!("{}, using {}", e, RecoveryStrategy::default());
                    RecoveryStrategy::default()
                })
            })
            .unwrap_or(defaults.strategy);

        let cache_ttl_seconds = get("CACHE_TTL_SECONDS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(defaults.cache_ttl_seconds);

        Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            api_port,
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or(defaults.log_level),
            strategy,
            cache_ttl_seconds,
        }
    }

    /// Address the HTTP API binds to
    pub fn bind_address(&self) -> SocketAddr {
        get_bind_address("RECOVERY", self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_get_service_port() {
        // Test with environment variable
        std::env::set_var("CFGTEST_SERVICE_PORT", "9000");
        assert_eq!(get_service_port("cfgtest", 8000), 9000);

        // Invalid value falls back
        std::env::set_var("CFGBAD_SERVICE_PORT", "not-a-port");
        assert_eq!(get_service_port("CFGBAD", 8000), 8000);

        // Test with default
        std::env::remove_var("UNKNOWN_SERVICE_PORT");
        assert_eq!(get_service_port("UNKNOWN", 8000), 8000);
    }

    #[test]
    fn test_get_bind_address() {
        std::env::set_var("CFGADDR_SERVICE_ADDR", "http://127.0.0.1:9100");
        assert_eq!(
            get_bind_address("CFGADDR", 8000),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );

        std::env::remove_var("CFGNONE_SERVICE_ADDR");
        std::env::remove_var("CFGNONE_SERVICE_PORT");
        assert_eq!(
            get_bind_address("CFGNONE", 8123),
            "0.0.0.0:8123".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_env_or() {
        std::env::set_var("CFGTEST_TOPIC", "custom.topic.v2");
        std::env::set_var("CFGTEST_EMPTY", "  ");
        assert_eq!(env_or("CFGTEST_TOPIC", "default.v1"), "custom.topic.v2");
        assert_eq!(env_or("CFGTEST_EMPTY", "default.v1"), "default.v1");
        assert_eq!(env_or("CFGTEST_MISSING", "default.v1"), "default.v1");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.strategy, RecoveryStrategy::Judgment);
        assert_eq!(settings.api_port, 8000);
        assert_eq!(settings.cache_ttl_seconds, 300);
    }

    #[test]
    fn test_settings_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "production"),
            ("API_PORT", "9000"),
            ("LOG_LEVEL", "DEBUG"),
            ("RECOVERY_STRATEGY", "rules"),
            ("CACHE_TTL_SECONDS", "60"),
        ]));

        assert_eq!(settings.environment, "production");
        assert_eq!(settings.api_port, 9000);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.strategy, RecoveryStrategy::Rules);
        assert_eq!(settings.cache_ttl_seconds, 60);
    }

    #[test]
    fn test_service_port_takes_precedence_over_api_port() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("RECOVERY_SERVICE_PORT", "8100"),
            ("API_PORT", "9000"),
        ]));
        assert_eq!(settings.api_port, 8100);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("API_PORT", "99999"),
            ("RECOVERY_STRATEGY", "coin-flip"),
            ("CACHE_TTL_SECONDS", "-5"),
        ]));
        assert_eq!(settings.api_port, DEFAULT_API_PORT);
        assert_eq!(settings.strategy, RecoveryStrategy::Judgment);
        assert_eq!(settings.cache_ttl_seconds, DEFAULT_CACHE_TTL_SECONDS);
    }
}
