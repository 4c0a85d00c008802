//! # Actions
//!
//! Everything that can happen in the chat becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::ReplyReceived { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing the I/O to perform next.
//! No side effects here. I/O happens in `core::client::perform`.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Every request an `Effect` starts settles as exactly one follow-up
//! action, success or failure, which is what returns the loading state to
//! `Idle` on every path.

use log::{debug, info, warn};

use crate::backend::{BackendError, ChatReply, ServiceStatus};
use crate::core::message::{
    Bubble, CLEAR_FAILED_TEXT, CLEARED_TEXT, NO_RESPONSE_TEXT, SEND_FAILED_TEXT,
};
use crate::core::state::{App, LoadingState, OverlapPolicy};
use crate::core::status::StatusLabel;

#[derive(Debug)]
pub enum Action {
    /// Probe backend availability.
    CheckStatus,
    StatusChecked(Result<ServiceStatus, BackendError>),
    /// User submitted text (not yet validated).
    Submit(String),
    ReplyReceived {
        request_id: u64,
        reply: Result<ChatReply, BackendError>,
    },
    /// User asked to clear the conversation.
    Clear,
    ClearFinished(Result<(), BackendError>),
    Quit,
}

/// I/O requested by `update()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    CheckStatus,
    SendMessage {
        request_id: u64,
        text: String,
        /// Pending request this one replaces; its task should be aborted.
        supersedes: Option<u64>,
    },
    Clear,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::CheckStatus => Effect::CheckStatus,

        Action::StatusChecked(result) => {
            app.status = StatusLabel::from_check(&result);
            Effect::None
        }

        Action::Submit(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Effect::None;
            }

            match (app.loading, app.overlap_policy) {
                (LoadingState::Idle, _) => {
                    app.messages.push(Bubble::user(text));
                    start_send(app, text.to_string(), None)
                }
                (LoadingState::Waiting { request_id }, OverlapPolicy::Ignore) => {
                    debug!("Submit ignored: request {} still pending", request_id);
                    Effect::None
                }
                (LoadingState::Waiting { .. }, OverlapPolicy::Queue) => {
                    app.messages.push(Bubble::user(text));
                    app.queued.push_back(text.to_string());
                    info!("Queued message ({} waiting)", app.queued.len());
                    Effect::None
                }
                (LoadingState::Waiting { request_id }, OverlapPolicy::Replace) => {
                    app.messages.push(Bubble::user(text));
                    info!("Superseding pending request {}", request_id);
                    start_send(app, text.to_string(), Some(request_id))
                }
            }
        }

        Action::ReplyReceived { request_id, reply } => {
            if !app.loading.is_waiting_for(request_id) {
                info!("Discarding stale reply for request {}", request_id);
                return Effect::None;
            }

            let bubble = match reply {
                Ok(ChatReply {
                    formatted: Some(html),
                    ..
                }) => Bubble::bot_markup(&html, app.sanitizer.as_ref()),
                Ok(ChatReply {
                    text: Some(text), ..
                }) => Bubble::bot(text),
                Ok(ChatReply { error, .. }) => {
                    warn!("Reply for request {} had no content (error: {:?})", request_id, error);
                    Bubble::error(NO_RESPONSE_TEXT)
                }
                Err(e) => {
                    warn!("Request {} failed: {}", request_id, e);
                    Bubble::error(SEND_FAILED_TEXT)
                }
            };
            app.messages.push(bubble);
            app.loading = LoadingState::Idle;

            match app.queued.pop_front() {
                Some(next) => start_send(app, next, None),
                None => Effect::None,
            }
        }

        Action::Clear => Effect::Clear,

        Action::ClearFinished(Ok(())) => {
            if !app.queued.is_empty() {
                info!("Clear dropped {} queued message(s)", app.queued.len());
                app.queued.clear();
            }
            app.messages = vec![Bubble::bot(CLEARED_TEXT)];
            Effect::None
        }

        Action::ClearFinished(Err(e)) => {
            warn!("Clear failed: {}", e);
            app.messages.push(Bubble::error(CLEAR_FAILED_TEXT));
            Effect::None
        }

        Action::Quit => Effect::Quit,
    }
}

/// Moves to `Waiting` under a fresh request id.
fn start_send(app: &mut App, text: String, supersedes: Option<u64>) -> Effect {
    let request_id = app.take_request_id();
    app.loading = LoadingState::Waiting { request_id };
    Effect::SendMessage {
        request_id,
        text,
        supersedes,
    }
}
