//! # Application State
//!
//! Core chat state. Domain logic only, no TUI-specific types. Presentation
//! state (scroll offsets, the input buffer) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── messages: Vec<Bubble>            // append-only, arrival order
//! ├── loading: LoadingState            // Idle | Waiting { request_id }
//! ├── status: StatusLabel              // title bar status
//! ├── model_label: String              // model name in the status text
//! ├── overlap_policy: OverlapPolicy    // what a submit does while Waiting
//! ├── queued: VecDeque<String>         // echoed but not yet sent (Queue policy)
//! ├── sanitizer: Arc<dyn MarkupSanitizer>
//! └── next_request_id: u64
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::markup::{AllowListSanitizer, MarkupSanitizer};
use crate::core::message::Bubble;
use crate::core::status::StatusLabel;

/// What a submit does while a reply is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Reject the submit; the send control stays disabled until the reply lands.
    #[default]
    Ignore,
    /// Echo now, send after the pending reply settles.
    Queue,
    /// Abort the pending request and send the new message instead.
    Replace,
}

impl FromStr for OverlapPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(OverlapPolicy::Ignore),
            "queue" => Ok(OverlapPolicy::Queue),
            "replace" => Ok(OverlapPolicy::Replace),
            _ => Err(()),
        }
    }
}

/// The loading indicator as an explicit state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Waiting { request_id: u64 },
}

impl LoadingState {
    pub fn is_waiting(self) -> bool {
        matches!(self, LoadingState::Waiting { .. })
    }

    /// True when `request_id` is the request currently being waited on.
    pub fn is_waiting_for(self, request_id: u64) -> bool {
        self == LoadingState::Waiting { request_id }
    }
}

pub struct App {
    pub messages: Vec<Bubble>,
    pub loading: LoadingState,
    pub status: StatusLabel,
    pub model_label: String,
    pub overlap_policy: OverlapPolicy,
    pub queued: VecDeque<String>,
    pub sanitizer: Arc<dyn MarkupSanitizer>,
    next_request_id: u64,
}

impl App {
    pub fn new(model_label: String, overlap_policy: OverlapPolicy) -> Self {
        Self {
            messages: Vec::new(),
            loading: LoadingState::Idle,
            status: StatusLabel::Checking,
            model_label,
            overlap_policy,
            queued: VecDeque::new(),
            sanitizer: Arc::new(AllowListSanitizer),
            next_request_id: 1,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn MarkupSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Whether a submit right now would be accepted.
    pub fn can_send(&self) -> bool {
        !self.loading.is_waiting() || self.overlap_policy != OverlapPolicy::Ignore
    }

    pub fn status_text(&self) -> String {
        self.status.text(&self.model_label)
    }

    pub(crate) fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }
}
