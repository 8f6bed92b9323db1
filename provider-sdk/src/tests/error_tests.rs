//! Tests for error mapping and retry classification

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::error::mapping::{classify_http_error, is_retryable_status, map_http_error};
    use crate::error::{ErrorContext, ServiceError};

    #[test]
    fn test_amadeus_errors_array() {
        let body = r#"{"errors":[{"status":429,"code":38194,"title":"Too many requests"}]}"#;
        let mut context = ErrorContext::for_service("amadeus");

        let error = map_http_error(StatusCode::TOO_MANY_REQUESTS, body, &mut context);

        assert!(matches!(error, ServiceError::RateLimit(ref m) if m == "Too many requests"));
        assert_eq!(context.error_code.as_deref(), Some("38194"));
        assert_eq!(context.status_code, Some(429));
    }

    #[test]
    fn test_anthropic_overloaded_is_service_error() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let mut context = ErrorContext::for_service("anthropic");
        let status = StatusCode::from_u16(529).unwrap();

        let error = map_http_error(status, body, &mut context).with_context(context);

        assert!(matches!(error.root(), ServiceError::Service(_)));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_non_json_body_falls_back_to_status() {
        let mut context = ErrorContext::for_service("amadeus");
        let error = map_http_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", &mut context);

        assert!(matches!(error, ServiceError::Service(ref m) if m.starts_with("502")));
    }

    #[test]
    fn test_retry_classification() {
        assert!(ServiceError::network("reset").is_retryable());
        assert!(ServiceError::timeout("slow").is_retryable());
        assert!(!ServiceError::validation("bad date").is_retryable());
        assert!(!ServiceError::configuration("no key").is_retryable());

        let wrapped = ServiceError::service("oops")
            .with_context(ErrorContext::for_service("amadeus").status_code(503));
        assert!(wrapped.is_retryable());

        let not_found = ServiceError::not_found("gone")
            .with_context(ErrorContext::for_service("amadeus").status_code(404));
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(classify_http_error(StatusCode::UNAUTHORIZED), "authentication");
        assert_eq!(classify_http_error(StatusCode::SERVICE_UNAVAILABLE), "server");
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_anthropic_overloaded_status_is_retryable() {
        let overloaded = StatusCode::from_u16(529).unwrap();
        assert!(is_retryable_status(overloaded));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn test_context_value_merges_into_existing_context() {
        let error = ServiceError::service("oops")
            .with_context(ErrorContext::for_service("amadeus").error_code("141"))
            .with_context_value("attempts", 3);

        assert_eq!(error.error_code(), Some("141"));
        assert_eq!(error.service_name(), Some("amadeus"));
    }
}
