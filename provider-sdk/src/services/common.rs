//! Common utilities for provider clients

use std::fmt;
use std::time::Duration;

use log::warn;
use reqwest::{header, Client};

use crate::error::mapping::classify_http_error;
use crate::error::{ErrorContext, Result, ServiceError};
use crate::util::{sanitize_for_logging, truncate_string};

/// UserAgent structure for identifying the client to upstream providers
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,
    pub version: String,
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "disruption-recovery".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("provider-sdk".to_string()),
        }
    }
}

impl UserAgent {
    /// Default agent tagged with the calling client
    pub fn for_client(client: &str) -> Self {
        Self {
            extra: Some(format!("provider-sdk; {}", client)),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client with default settings
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(30)))
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into a ServiceError carrying the provider,
/// endpoint and HTTP status
pub async fn parse_error_response(
    service_name: &str,
    endpoint: &str,
    response: reqwest::Response,
) -> ServiceError {
    let status = response.status();
    let mut context = ErrorContext::for_service(service_name)
        .status_code(status.as_u16())
        .endpoint(endpoint);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    warn!(
        "{} {} returned {} ({}): {}",
        service_name,
        endpoint,
        status.as_u16(),
        classify_http_error(status),
        truncate_string(&sanitize_for_logging(&body), 300)
    );

    let error = crate::error::mapping::map_http_error(status, &body, &mut context);
    error.with_context(context)
}

/// Join a base URL and a path without doubling slashes
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        let ua = UserAgent::for_client("amadeus").to_string();
        assert!(ua.starts_with("disruption-recovery/"));
        assert!(ua.ends_with("(provider-sdk; amadeus)"));
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("https://test.api.amadeus.com/", "/v2/shopping/flight-offers"),
            "https://test.api.amadeus.com/v2/shopping/flight-offers"
        );
        assert_eq!(endpoint_url("http://proxy", "topics/a.v1"), "http://proxy/topics/a.v1");
    }
}
