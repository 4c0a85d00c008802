//! # TypingIndicator Component
//!
//! One-line spinner shown below the message list while a reply is pending.
//! The parent only gives it a row when `LoadingState` is `Waiting`.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct TypingIndicator<'a> {
    pub model_label: &'a str,
    pub spinner_frame: usize,
    /// Messages echoed but not yet sent (queue policy)
    pub queued: usize,
}

impl<'a> TypingIndicator<'a> {
    pub fn new(model_label: &'a str, spinner_frame: usize, queued: usize) -> Self {
        Self {
            model_label,
            spinner_frame,
            queued,
        }
    }

    fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }
}

impl<'a> Component for TypingIndicator<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        let mut spans = vec![
            Span::styled(format!(" {} ", self.spinner()), Style::default().fg(Color::Blue)),
            Span::styled(format!("{} is typing...", self.model_label), style),
        ];
        if self.queued > 0 {
            spans.push(Span::styled(format!(" ({} queued)", self.queued), style));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
