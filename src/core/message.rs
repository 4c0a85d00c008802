//! # Bubbles
//!
//! A bubble is one rendered chat message. Bubbles exist only in memory: they
//! are created on send/receive and thrown away wholesale on clear or exit.

use chrono::{DateTime, Local};

use crate::core::markup::{MarkupSanitizer, SafeMarkup};

/// Text of the single bubble left after a successful clear.
pub const CLEARED_TEXT: &str = "Chat history cleared. How can I help you?";
/// Error bubble for a reply that carried neither markup nor text.
pub const NO_RESPONSE_TEXT: &str = "Error: No response from server";
/// Error bubble for a `/chat` request that failed in transit.
pub const SEND_FAILED_TEXT: &str = "Error: Could not send message";
/// Error bubble for a `/clear` request that failed in transit.
pub const CLEAR_FAILED_TEXT: &str = "Error: Could not clear chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
    Error,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "you",
            Role::Bot => "bot",
            Role::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleBody {
    /// Shown verbatim, never interpreted as markup.
    Text(String),
    /// Sanitized server markup.
    Markup(SafeMarkup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub body: BubbleBody,
    pub at: DateTime<Local>,
}

impl Bubble {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            body: BubbleBody::Text(content.into()),
            at: Local::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::text(Role::Bot, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::text(Role::Error, content)
    }

    /// A bot bubble built from untrusted server markup.
    pub fn bot_markup(raw: &str, sanitizer: &dyn MarkupSanitizer) -> Self {
        Self {
            role: Role::Bot,
            body: BubbleBody::Markup(SafeMarkup::from_untrusted(raw, sanitizer)),
            at: Local::now(),
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self.body, BubbleBody::Markup(_))
    }

    /// The bubble as readable text (markup flattened).
    pub fn plain_text(&self) -> String {
        match &self.body {
            BubbleBody::Text(text) => text.clone(),
            BubbleBody::Markup(markup) => markup.to_plain_text(),
        }
    }
}
