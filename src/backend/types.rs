//! Wire types for the chat backend plus the domain values the core consumes.
//!
//! The wire structs mirror the JSON the backend actually emits. Every field
//! the backend may omit is optional so that a sparse or partial body still
//! parses; deciding what a missing field *means* is the core's job.

use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Types
// ============================================================================

/// `GET /status` response body.
///
/// `gemma3_available` is absent when the backend cannot reach Ollama.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub ollama_running: bool,
    #[serde(default)]
    pub gemma3_available: Option<bool>,
    #[serde(default)]
    pub models_available: Vec<String>,
}

/// `POST /chat` request body.
#[derive(Serialize, Debug)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
}

/// `POST /chat` response body. Any subset of fields may be present.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub formatted_response: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Domain Types
// ============================================================================

/// Result of a status check that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceStatus {
    /// Whether the backend can reach its model host.
    pub running: bool,
    /// `None` when the backend did not say.
    pub model_available: Option<bool>,
    /// Model names the host reported, possibly empty.
    pub models: Vec<String>,
}

impl From<StatusResponse> for ServiceStatus {
    fn from(body: StatusResponse) -> Self {
        Self {
            running: body.ollama_running,
            model_available: body.gemma3_available,
            models: body.models_available,
        }
    }
}

/// A parsed `/chat` reply.
///
/// Empty strings are normalized to `None`, so "present" always means
/// "present and non-empty".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatReply {
    /// Server-rendered HTML. Untrusted.
    pub formatted: Option<String>,
    /// Plain-text reply.
    pub text: Option<String>,
    /// Error text the backend attached (e.g. "No message provided").
    pub error: Option<String>,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn formatted(html: impl Into<String>) -> Self {
        Self {
            formatted: Some(html.into()),
            ..Default::default()
        }
    }

    /// True when neither reply field carries content.
    pub fn is_empty(&self) -> bool {
        self.formatted.is_none() && self.text.is_none()
    }
}

impl From<ChatResponse> for ChatReply {
    fn from(body: ChatResponse) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        Self {
            formatted: non_empty(body.formatted_response),
            text: non_empty(body.response),
            error: non_empty(body.error),
        }
    }
}
