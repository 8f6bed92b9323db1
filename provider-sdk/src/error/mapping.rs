//! Error mapping for provider APIs
//!
//! Converts provider error bodies into the normalized `ServiceError`,
//! recording provider error codes on the `ErrorContext`.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};
use crate::util::truncate_string;

/// Normalized error for an HTTP status and a human-readable message
fn error_for_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::validation(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        _ => ServiceError::service(message),
    }
}

/// Map an Amadeus error body.
///
/// API calls return `{"errors": [{"status", "code", "title", "detail"}]}`;
/// the OAuth2 token endpoint returns `{"error", "error_description", "code"}`.
pub fn map_amadeus_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "amadeus".to_string();

    if let Some(first) = json.get("errors").and_then(Value::as_array).and_then(|e| e.first()) {
        if let Some(code) = first.get("code") {
            context.error_code = Some(value_text(code));
        }
        if let Some(title) = first.get("title").and_then(Value::as_str) {
            context.add("title", title);
        }
        let message = first
            .get("detail")
            .or_else(|| first.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown Amadeus error");
        return error_for_status(status, message);
    }

    if let Some(error) = json.get("error").and_then(Value::as_str) {
        context.error_code = Some(error.to_string());
        let message = json
            .get("error_description")
            .and_then(Value::as_str)
            .unwrap_or(error);
        return error_for_status(status, message);
    }

    error_for_status(status, "Unknown Amadeus error")
}

/// Map an Anthropic error body: `{"type": "error", "error": {"type", "message"}}`
pub fn map_anthropic_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "anthropic".to_string();

    let error = json.get("error");
    if let Some(error_type) = error.and_then(|e| e.get("type")).and_then(Value::as_str) {
        context.error_code = Some(error_type.to_string());
    }

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown Anthropic error");

    match context.error_code.as_deref() {
        Some("overloaded_error") => ServiceError::service(message),
        Some("rate_limit_error") => ServiceError::rate_limit(message),
        Some("authentication_error") => ServiceError::authentication(message),
        _ => error_for_status(status, message),
    }
}

/// Map a Kafka REST proxy error body: `{"error_code", "message"}`
pub fn map_rest_proxy_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "confluent".to_string();

    if let Some(code) = json.get("error_code") {
        context.error_code = Some(value_text(code));
    }

    let message = json
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown REST proxy error");
    error_for_status(status, message)
}

/// Map a provider HTTP error to a ServiceError, dispatching on the provider
/// named in the context
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    context.status_code = Some(status.as_u16());

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match context.service.as_str() {
            "amadeus" => return map_amadeus_error(status, &json, context),
            "anthropic" => return map_anthropic_error(status, &json, context),
            "confluent" => return map_rest_proxy_error(status, &json, context),
            _ => {
                if let Some(message) = json
                    .get("message")
                    .or_else(|| json.get("error"))
                    .and_then(Value::as_str)
                {
                    return error_for_status(status, message);
                }
            }
        }
    }

    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate_string(body, 100))
    };
    error_for_status(status, message)
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

/// Determine if an HTTP status code indicates a retryable error.
/// 529 is Anthropic's "overloaded" status.
pub fn is_retryable_status(status: StatusCode) -> bool {
    is_retryable_status_code(status.as_u16())
}

pub(crate) fn is_retryable_status_code(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
