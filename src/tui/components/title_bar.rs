//! # TitleBar Component
//!
//! Top status bar: application name, backend status label, and a "↓ New"
//! marker when the user has scrolled away from fresh bubbles.
//!
//! Purely presentational. The status label and its text come from core
//! state; `has_unseen_content` comes from the message list's scroll state.
//!
//! ```text
//! Gemma Chat | Gemma3 model available | ↓ New
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::status::StatusLabel;
use crate::tui::component::Component;

pub const APP_TITLE: &str = "Gemma Chat";

pub struct TitleBar {
    pub status: StatusLabel,
    /// Rendered status text (e.g. "Gemma3 model available")
    pub status_text: String,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(status: StatusLabel, status_text: String, has_unseen_content: bool) -> Self {
        Self {
            status,
            status_text,
            has_unseen_content,
        }
    }
}

/// Green when the model is there, yellow when the backend is up without it,
/// red when offline, grey while the first check is pending.
pub(crate) fn status_style(status: &StatusLabel) -> Style {
    match status {
        StatusLabel::Checking => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        StatusLabel::Online {
            model_available: Some(true),
        } => Style::default().fg(Color::Green),
        StatusLabel::Online { .. } => Style::default().fg(Color::Yellow),
        StatusLabel::Offline => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let separator = Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![
            Span::styled(APP_TITLE, Style::default().add_modifier(Modifier::BOLD)),
            separator.clone(),
            Span::styled(self.status_text.clone(), status_style(&self.status)),
        ];
        if self.has_unseen_content {
            spans.push(separator);
            spans.push(Span::styled("↓ New", Style::default().fg(Color::Cyan)));
        }

        frame.render_widget(Line::from(spans), area);
    }
}
