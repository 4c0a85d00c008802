use gemma_chat::backend::{BackendError, ChatBackend, ChatReply, HttpBackend};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), None).unwrap()
}

/// A base URL nothing listens on.
fn unreachable_backend() -> HttpBackend {
    HttpBackend::new("http://127.0.0.1:1", None).unwrap()
}

// ============================================================================
// GET /status
// ============================================================================

#[tokio::test]
async fn test_status_online_with_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ollama_running": true,
            "gemma3_available": true,
            "models_available": ["gemma3:latest", "llama3"]
        })))
        .mount(&mock_server)
        .await;

    let status = backend_for(&mock_server).check_status().await.unwrap();
    assert!(status.running);
    assert_eq!(status.model_available, Some(true));
    assert_eq!(status.models, vec!["gemma3:latest", "llama3"]);
}

#[tokio::test]
async fn test_status_ollama_down_omits_model_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ollama_running": false,
            "error": "connection refused"
        })))
        .mount(&mock_server)
        .await;

    let status = backend_for(&mock_server).check_status().await.unwrap();
    assert!(!status.running);
    assert_eq!(status.model_available, None);
    assert!(status.models.is_empty());
}

#[tokio::test]
async fn test_status_unreachable_is_network_error() {
    let result = unreachable_backend().check_status().await;
    assert!(matches!(result, Err(BackendError::Network(_))));
}

// ============================================================================
// POST /chat
// ============================================================================

#[tokio::test]
async fn test_chat_sends_message_and_parses_both_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "Hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "formatted_response": "<p>Hi <b>there</b></p>",
            "response": "Hi **there**",
            "user_message": "Hello"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reply = backend_for(&mock_server).send_message("Hello").await.unwrap();
    assert_eq!(reply.formatted.as_deref(), Some("<p>Hi <b>there</b></p>"));
    assert_eq!(reply.text.as_deref(), Some("Hi **there**"));
    assert_eq!(reply.error, None);
}

#[tokio::test]
async fn test_chat_empty_strings_count_as_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "formatted_response": "",
            "response": ""
        })))
        .mount(&mock_server)
        .await;

    let reply = backend_for(&mock_server).send_message("Hello").await.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_chat_400_json_body_is_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "No message provided" })),
        )
        .mount(&mock_server)
        .await;

    let reply = backend_for(&mock_server).send_message("Hello").await.unwrap();
    assert_eq!(
        reply,
        ChatReply {
            error: Some("No message provided".into()),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_chat_500_html_body_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("<h1>Internal Server Error</h1>"),
        )
        .mount(&mock_server)
        .await;

    let result = backend_for(&mock_server).send_message("Hello").await;
    match result {
        Err(BackendError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("Internal Server Error"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chat_200_garbage_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = backend_for(&mock_server).send_message("Hello").await;
    assert!(matches!(result, Err(BackendError::Parse(_))));
}

#[tokio::test]
async fn test_chat_unreachable_is_network_error() {
    let result = unreachable_backend().send_message("Hello").await;
    assert!(matches!(result, Err(BackendError::Network(_))));
}

// ============================================================================
// POST /clear
// ============================================================================

#[tokio::test]
async fn test_clear_any_response_is_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/clear"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert_eq!(backend_for(&mock_server).clear().await, Ok(()));
}

#[tokio::test]
async fn test_clear_unreachable_is_network_error() {
    let result = unreachable_backend().clear().await;
    assert!(matches!(result, Err(BackendError::Network(_))));
}

#[tokio::test]
async fn test_base_path_prefix_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bot/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ollama_running": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(&format!("{}/bot/", mock_server.uri()), None).unwrap();
    let status = backend.check_status().await.unwrap();
    assert!(status.running);
    assert_eq!(status.model_available, None);
}
