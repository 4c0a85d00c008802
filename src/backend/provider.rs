use std::fmt;

use async_trait::async_trait;

use super::types::{ChatReply, ServiceStatus};

/// Errors that can occur while talking to the chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend misconfigured (bad base URL, client could not be built). Fatal at startup.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Backend answered with a non-success status and a body that was not JSON.
    Api { status: u16, message: String },
    /// Backend answered but the body could not be parsed.
    Parse(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "config error: {msg}"),
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// The three endpoints the chat client consumes.
///
/// Implementations report what happened on the wire; they never decide what
/// the user sees. That mapping lives in `core::action::update`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend, for logs.
    fn name(&self) -> &str;

    /// One-shot readiness check (`GET /status`).
    async fn check_status(&self) -> Result<ServiceStatus, BackendError>;

    /// Sends one user message (`POST /chat`).
    async fn send_message(&self, message: &str) -> Result<ChatReply, BackendError>;

    /// Asks the backend to forget the conversation (`POST /clear`).
    async fn clear(&self) -> Result<(), BackendError>;
}
