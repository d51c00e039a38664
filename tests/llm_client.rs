use std::time::Duration;

use batch_question_solver::{ChatModel, Config, LlmClient, ModelErrorKind};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LlmClient {
    let config = Config {
        llm_api_key: "test-key".to_string(),
        llm_api_base_url: server.uri(),
        llm_model_name: "test_model".to_string(),
        ..Config::default()
    };
    LlmClient::new(&config)
}

#[tokio::test]
async fn success_returns_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(json!({
            "model": "test_model",
            "max_tokens": 128,
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "What is 2+2?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "4" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call("What is 2+2?", "Be brief.", 0.0, Duration::from_secs(5))
        .await;

    assert!(result.ok);
    assert_eq!(result.text.as_deref(), Some("4"));
    assert_eq!(result.error_kind, None);
}

#[tokio::test]
async fn http_error_keeps_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "invalid api key" }
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call("hi", "sys", 0.0, Duration::from_secs(5))
        .await;

    assert!(!result.ok);
    assert_eq!(result.text, None);
    assert_eq!(result.error_kind, Some(ModelErrorKind::Http));
    assert_eq!(result.status_code, Some(401));
    assert!(result.error.unwrap().contains("invalid api key"));
}

#[tokio::test]
async fn plain_text_error_body_is_kept_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call("hi", "sys", 0.0, Duration::from_secs(5))
        .await;

    assert_eq!(result.status_code, Some(503));
    assert_eq!(result.error.as_deref(), Some("overloaded"));
    assert_eq!(result.error_summary(), "HTTP 503: overloaded");
}

#[tokio::test]
async fn slow_response_is_reported_as_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] })),
        )
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call("hi", "sys", 0.0, Duration::from_millis(50))
        .await;

    assert!(!result.ok);
    assert_eq!(result.error_kind, Some(ModelErrorKind::Timeout));
    assert_eq!(result.status_code, None);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let config = Config {
        llm_api_base_url: "http://127.0.0.1:1/v1".to_string(),
        ..Config::default()
    };
    let client = LlmClient::new(&config);

    let result = client.call("hi", "sys", 0.0, Duration::from_secs(2)).await;

    assert!(!result.ok);
    assert!(result.error_kind.unwrap().is_transport());
    assert_eq!(result.status_code, None);
}

#[tokio::test]
async fn unparseable_success_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call("hi", "sys", 0.0, Duration::from_secs(5))
        .await;

    assert!(!result.ok);
    assert_eq!(result.error_kind, Some(ModelErrorKind::Decode));
}
