//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{BackendError, ChatBackend, ChatReply, ServiceStatus};
use crate::core::state::{App, OverlapPolicy};

/// A backend that answers from scripted results and records what it was sent.
///
/// Replies are consumed in order; once the script runs out every send
/// answers with an empty reply. Status and clear answer with the same
/// result every time.
pub struct ScriptedBackend {
    status: Result<ServiceStatus, BackendError>,
    replies: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    clear: Result<(), BackendError>,
    sent: Mutex<Vec<String>>,
    clears: Mutex<usize>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            status: Ok(ServiceStatus {
                running: true,
                model_available: Some(true),
                models: vec!["gemma3:latest".to_string()],
            }),
            replies: Mutex::new(VecDeque::new()),
            clear: Ok(()),
            sent: Mutex::new(Vec::new()),
            clears: Mutex::new(0),
        }
    }
}

impl ScriptedBackend {
    pub fn with_status(mut self, status: Result<ServiceStatus, BackendError>) -> Self {
        self.status = status;
        self
    }

    pub fn with_reply(self, reply: Result<ChatReply, BackendError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_clear(mut self, clear: Result<(), BackendError>) -> Self {
        self.clear = clear;
        self
    }

    /// Messages passed to `send_message`, in call order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) -> usize {
        *self.clears.lock().unwrap()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn check_status(&self) -> Result<ServiceStatus, BackendError> {
        self.status.clone()
    }

    async fn send_message(&self, message: &str) -> Result<ChatReply, BackendError> {
        self.sent.lock().unwrap().push(message.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatReply::default()))
    }

    async fn clear(&self) -> Result<(), BackendError> {
        *self.clears.lock().unwrap() += 1;
        self.clear.clone()
    }
}

/// Creates a test App with the default label, policy and sanitizer.
pub fn test_app() -> App {
    App::new("Gemma3".to_string(), OverlapPolicy::Ignore)
}
