//! Mock tests for the Anthropic client

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::ServiceError;
    use crate::resilience::RetryConfig;
    use crate::services::anthropic::{AnthropicClient, AnthropicClientBuilder};

    fn create_test_client(mock_server: &MockServer) -> AnthropicClient {
        AnthropicClientBuilder::new()
            .api_key("mock_api_key_for_testing")
            .model("claude-3-haiku-20240307")
            .base_url(mock_server.uri())
            .timeout(5)
            .retry(RetryConfig {
                max_retries: 1,
                initial_interval: Duration::from_millis(10),
                max_interval: Duration::from_millis(10),
                multiplier: 1.0,
                randomization_factor: 0.0,
                max_elapsed_time: Some(Duration::from_secs(5)),
            })
            .build()
            .expect("Failed to build Anthropic client")
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({
            "id": "msg_mock123",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku-20240307",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 120, "output_tokens": 30}
        })
    }

    #[tokio::test]
    async fn test_json_response_sends_schema_and_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "mock_api_key_for_testing"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-haiku-20240307",
                "system": "You are a triage agent.",
                "messages": [{
                    "role": "user",
                    "content": "Event: {}\n\nReturn ONLY valid JSON matching this schema:\n{\"severity\": 0.0}"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
                "```json\n{\"severity\": 0.6, \"constraints\": {\"max_stops\": 1}}\n```",
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let value = client
            .json_response("You are a triage agent.", "Event: {}", "{\"severity\": 0.0}")
            .await
            .unwrap();

        assert_eq!(value["severity"], 0.6);
        assert_eq!(value["constraints"]["max_stops"], 1);
    }

    #[tokio::test]
    async fn test_non_json_output_is_parsing_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Sorry, no.")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.json_response("s", "u", "{}").await.unwrap_err();
        assert!(matches!(err, ServiceError::Parsing(_)));
    }

    #[tokio::test]
    async fn test_authentication_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.json_response("s", "u", "{}").await.unwrap_err();

        assert!(matches!(err.root(), ServiceError::Authentication(_)));
        assert_eq!(err.error_code(), Some("authentication_error"));
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn test_overloaded_is_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{\"ok\": true}")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let value = client.json_response("s", "u", "{}").await.unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = AnthropicClientBuilder::new()
            .api_key("")
            .base_url(mock_server.uri())
            .build()
            .unwrap();

        let err = client.json_response("s", "u", "{}").await.unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
