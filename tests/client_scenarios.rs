//! End-to-end chat flows: `ChatClient` over `HttpBackend` against a mock server.

use std::sync::Arc;

use gemma_chat::backend::HttpBackend;
use gemma_chat::core::client::ChatClient;
use gemma_chat::core::markup::Token;
use gemma_chat::core::message::{
    BubbleBody, CLEAR_FAILED_TEXT, CLEARED_TEXT, NO_RESPONSE_TEXT, Role, SEND_FAILED_TEXT,
};
use gemma_chat::core::state::{App, LoadingState, OverlapPolicy};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn client_for(base_url: &str) -> ChatClient {
    let backend = HttpBackend::new(base_url, None).unwrap();
    ChatClient::new(
        App::new("Gemma3".to_string(), OverlapPolicy::Ignore),
        Arc::new(backend),
    )
}

async fn mount_chat_reply(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn roles_and_texts(client: &ChatClient) -> Vec<(Role, String)> {
    client
        .app()
        .messages
        .iter()
        .map(|b| (b.role, b.plain_text()))
        .collect()
}

// ============================================================================
// Sending
// ============================================================================

#[tokio::test]
async fn test_hello_gets_plain_reply() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(&mock_server, json!({ "response": "Hi there" })).await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("Hello").await;

    assert_eq!(
        roles_and_texts(&client),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Bot, "Hi there".to_string()),
        ]
    );
    assert!(!client.app().messages[1].is_markup());
    assert_eq!(client.app().loading, LoadingState::Idle);
    assert!(client.app().can_send());
}

#[tokio::test]
async fn test_formatted_reply_renders_bold() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(&mock_server, json!({ "formatted_response": "<b>Hi</b>" })).await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("Hello").await;

    let bot = &client.app().messages[1];
    assert_eq!(bot.role, Role::Bot);
    let BubbleBody::Markup(markup) = &bot.body else {
        panic!("expected a markup bubble");
    };
    assert!(
        markup
            .tokens()
            .iter()
            .any(|t| matches!(t, Token::Start { name, .. } if name == "b"))
    );
    assert_eq!(bot.plain_text(), "Hi");
}

#[tokio::test]
async fn test_formatted_reply_is_sanitized() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(
        &mock_server,
        json!({
            "formatted_response": "<p onclick=\"x()\">safe</p><script>alert(1)</script>\u{1b}[31m"
        }),
    )
    .await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("Hello").await;

    let bot = &client.app().messages[1];
    let BubbleBody::Markup(markup) = &bot.body else {
        panic!("expected a markup bubble");
    };
    for token in markup.tokens() {
        match token {
            Token::Start { name, attrs, .. } => {
                assert_ne!(name, "script");
                assert!(attrs.is_empty());
            }
            Token::Text(text) => {
                assert!(!text.contains("alert"));
                assert!(!text.contains('\u{1b}'));
            }
            Token::End { .. } => {}
        }
    }
    assert!(bot.plain_text().contains("safe"));
}

#[tokio::test]
async fn test_empty_reply_is_no_response_error() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(&mock_server, json!({})).await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("Hello").await;

    assert_eq!(
        roles_and_texts(&client).last().unwrap(),
        &(Role::Error, NO_RESPONSE_TEXT.to_string())
    );
    assert_eq!(client.app().loading, LoadingState::Idle);
}

#[tokio::test]
async fn test_bad_request_body_is_no_response_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "No message provided" })),
        )
        .mount(&mock_server)
        .await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("Hello").await;

    assert_eq!(
        roles_and_texts(&client).last().unwrap(),
        &(Role::Error, NO_RESPONSE_TEXT.to_string())
    );
}

#[tokio::test]
async fn test_transport_failure_is_send_error() {
    let mut client = client_for("http://127.0.0.1:1");
    client.send_message("Hello").await;

    assert_eq!(
        roles_and_texts(&client),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Error, SEND_FAILED_TEXT.to_string()),
        ]
    );
    assert_eq!(client.app().loading, LoadingState::Idle);
    assert!(client.app().can_send());
}

#[tokio::test]
async fn test_whitespace_input_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "x" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("  \n\t ").await;

    assert!(client.app().messages.is_empty());
}

// ============================================================================
// Clearing
// ============================================================================

#[tokio::test]
async fn test_clear_replaces_history_with_one_bot_bubble() {
    let mock_server = MockServer::start().await;
    mount_chat_reply(&mock_server, json!({ "response": "Hi there" })).await;
    Mock::given(method("POST"))
        .and(path("/clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "cleared" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = client_for(&mock_server.uri());
    client.send_message("Hello").await;
    client.clear_chat().await;

    assert_eq!(
        roles_and_texts(&client),
        vec![(Role::Bot, CLEARED_TEXT.to_string())]
    );
}

#[tokio::test]
async fn test_clear_failure_keeps_history() {
    let mut client = client_for("http://127.0.0.1:1");
    client.send_message("Hello").await;
    client.clear_chat().await;

    assert_eq!(
        roles_and_texts(&client),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Error, SEND_FAILED_TEXT.to_string()),
            (Role::Error, CLEAR_FAILED_TEXT.to_string()),
        ]
    );
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn test_status_not_running_is_offline_regardless_of_model() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ollama_running": false,
            "gemma3_available": true
        })))
        .mount(&mock_server)
        .await;

    let mut client = client_for(&mock_server.uri());
    client.check_status().await;

    assert!(client.app().status.is_offline());
    assert_eq!(client.app().status_text(), "Ollama is not running");
}

#[tokio::test]
async fn test_status_online_shows_model_label() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ollama_running": true,
            "gemma3_available": true,
            "models_available": ["gemma3:latest"]
        })))
        .mount(&mock_server)
        .await;

    let mut client = client_for(&mock_server.uri());
    client.check_status().await;

    assert_eq!(client.app().status_text(), "Gemma3 model available");
}

#[tokio::test]
async fn test_status_unreachable_is_offline() {
    let mut client = client_for("http://127.0.0.1:1");
    client.check_status().await;
    assert!(client.app().status.is_offline());
}
