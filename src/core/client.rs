//! # ChatClient
//!
//! Headless driver for the core: owns an [`App`] and a backend, and runs
//! each operation to completion by feeding effects back through `update()`.
//!
//! The TUI does not use `ChatClient` directly. It calls [`perform`] on
//! spawned tasks instead, so requests never block the event loop, but both
//! paths share the same reducer and the same effect executor.

use std::sync::Arc;

use log::{debug, warn};

use crate::backend::ChatBackend;
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::markup::{AllowListSanitizer, MarkupSanitizer, TrustedMarkup};
use crate::core::state::App;

/// Executes one effect against the backend and returns the action that
/// settles it. Backend errors become part of the action, never a panic or
/// an early return, so every request settles exactly once.
pub async fn perform(backend: &dyn ChatBackend, effect: Effect) -> Option<Action> {
    match effect {
        Effect::None | Effect::Quit => None,
        Effect::CheckStatus => Some(Action::StatusChecked(backend.check_status().await)),
        Effect::SendMessage {
            request_id, text, ..
        } => {
            debug!("Sending request {} via {}", request_id, backend.name());
            let reply = backend.send_message(&text).await;
            Some(Action::ReplyReceived { request_id, reply })
        }
        Effect::Clear => Some(Action::ClearFinished(backend.clear().await)),
    }
}

/// Picks the sanitizer for a resolved config.
pub fn build_sanitizer(config: &ResolvedConfig) -> Arc<dyn MarkupSanitizer> {
    if config.trust_markup {
        warn!("trust_markup is enabled: server HTML will be rendered without sanitization");
        Arc::new(TrustedMarkup)
    } else {
        Arc::new(AllowListSanitizer)
    }
}

/// Builds the core state for a resolved config.
pub fn build_app(config: &ResolvedConfig) -> App {
    App::new(config.model_label.clone(), config.overlap_policy)
        .with_sanitizer(build_sanitizer(config))
}

pub struct ChatClient {
    app: App,
    backend: Arc<dyn ChatBackend>,
}

impl ChatClient {
    pub fn new(app: App, backend: Arc<dyn ChatBackend>) -> Self {
        Self { app, backend }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Probes `/status` and updates the status label.
    pub async fn check_status(&mut self) {
        self.dispatch(Action::CheckStatus).await;
    }

    /// Echoes `text`, sends it, and renders the reply (or the error).
    /// Blank input does nothing.
    pub async fn send_message(&mut self, text: &str) {
        self.dispatch(Action::Submit(text.to_string())).await;
    }

    /// Asks the backend to clear; resets the bubbles on success.
    pub async fn clear_chat(&mut self) {
        self.dispatch(Action::Clear).await;
    }

    /// Runs `action` and every follow-up it causes until nothing is pending.
    async fn dispatch(&mut self, action: Action) {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            debug!("ChatClient dispatch: {:?}", action);
            let effect = update(&mut self.app, action);
            next = perform(self.backend.as_ref(), effect).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, ChatReply, ServiceStatus};
    use crate::core::message::{CLEAR_FAILED_TEXT, CLEARED_TEXT, Role, SEND_FAILED_TEXT};
    use crate::core::state::{LoadingState, OverlapPolicy};
    use crate::test_support::{ScriptedBackend, test_app};

    fn client(backend: ScriptedBackend) -> (ChatClient, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        (ChatClient::new(test_app(), backend.clone()), backend)
    }

    #[test]
    fn blank_message_makes_no_request() {
        let (mut client, backend) = client(ScriptedBackend::default());
        tokio_test::block_on(client.send_message("   "));
        assert!(backend.sent().is_empty());
        assert!(client.app().messages.is_empty());
    }

    #[test]
    fn send_renders_reply_and_settles() {
        let (mut client, backend) =
            client(ScriptedBackend::default().with_reply(Ok(ChatReply::text("Hi there"))));
        tokio_test::block_on(client.send_message("Hello"));

        assert_eq!(backend.sent(), vec!["Hello".to_string()]);
        let messages = &client.app().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].plain_text(), "Hi there");
        assert_eq!(client.app().loading, LoadingState::Idle);
    }

    #[test]
    fn send_failure_settles_with_error_bubble() {
        let (mut client, _) = client(
            ScriptedBackend::default().with_reply(Err(BackendError::Network("refused".into()))),
        );
        tokio_test::block_on(client.send_message("Hello"));

        let last = client.app().messages.last().unwrap();
        assert_eq!(last.role, Role::Error);
        assert_eq!(last.plain_text(), SEND_FAILED_TEXT);
        assert!(client.app().can_send());
    }

    #[test]
    fn clear_replaces_history() {
        let (mut client, backend) = client(
            ScriptedBackend::default()
                .with_reply(Ok(ChatReply::text("one")))
                .with_reply(Ok(ChatReply::text("two"))),
        );
        tokio_test::block_on(async {
            client.send_message("a").await;
            client.send_message("b").await;
            client.clear_chat().await;
        });

        let messages = &client.app().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].plain_text(), CLEARED_TEXT);
        assert_eq!(backend.clear_calls(), 1);
    }

    #[test]
    fn clear_failure_keeps_history_and_appends_error() {
        let (mut client, backend) = client(
            ScriptedBackend::default()
                .with_reply(Ok(ChatReply::text("Hi")))
                .with_clear(Err(BackendError::Network("down".into()))),
        );
        tokio_test::block_on(async {
            client.send_message("Hello").await;
            client.clear_chat().await;
        });

        assert_eq!(backend.clear_calls(), 1);
        let roles: Vec<(Role, String)> = client
            .app()
            .messages
            .iter()
            .map(|b| (b.role, b.plain_text()))
            .collect();
        assert_eq!(
            roles,
            vec![
                (Role::User, "Hello".to_string()),
                (Role::Bot, "Hi".to_string()),
                (Role::Error, CLEAR_FAILED_TEXT.to_string()),
            ]
        );
    }

    #[test]
    fn status_check_updates_label() {
        let (mut client, _) = client(ScriptedBackend::default().with_status(Ok(ServiceStatus {
            running: true,
            model_available: Some(false),
            models: vec!["llama3".into()],
        })));
        tokio_test::block_on(client.check_status());
        assert_eq!(client.app().status_text(), "Gemma3 model not found");
    }

    #[test]
    fn perform_none_and_quit_settle_nothing() {
        let backend = ScriptedBackend::default();
        assert!(tokio_test::block_on(perform(&backend, Effect::None)).is_none());
        assert!(tokio_test::block_on(perform(&backend, Effect::Quit)).is_none());
    }

    #[test]
    fn build_app_respects_config() {
        let config = ResolvedConfig {
            base_url: "http://localhost:5000".into(),
            request_timeout: None,
            model_label: "Gemma3".into(),
            overlap_policy: OverlapPolicy::Queue,
            trust_markup: true,
            log_file: "test.log".into(),
        };
        let app = build_app(&config);
        assert_eq!(app.overlap_policy, OverlapPolicy::Queue);
        assert_eq!(app.sanitizer.name(), TrustedMarkup.name());
    }
}
