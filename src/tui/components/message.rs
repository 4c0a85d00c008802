use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{Bubble, BubbleBody, Role};
use crate::tui::markup;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// A stateless component that renders a single chat bubble.
///
/// Created fresh each frame by `MessageList`. Plain-text bodies are shown
/// verbatim; markup bodies go through [`markup::render`].
///
/// Colors by role:
/// - **User** (green)
/// - **Bot** (blue)
/// - **Error** (red)
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub bubble: &'a Bubble,
}

impl<'a> Message<'a> {
    pub fn new(bubble: &'a Bubble) -> Self {
        Self { bubble }
    }

    /// Height the bubble needs at `width`, borders included.
    ///
    /// Plain text is measured with `textwrap` using options that match
    /// ratatui's `Paragraph` wrapping. Markup is measured by ratatui itself,
    /// since its lines are already styled.
    pub fn calculate_height(bubble: &Bubble, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Too narrow for borders + padding; still occupy a row.
            return 1;
        }

        let lines = match &bubble.body {
            BubbleBody::Text(content) => {
                let content = content.trim();
                if content.is_empty() {
                    return VERTICAL_OVERHEAD;
                }
                let options = textwrap::Options::new(content_width as usize)
                    .break_words(true)
                    .word_separator(textwrap::WordSeparator::AsciiSpace);
                textwrap::wrap(content, options).len()
            }
            BubbleBody::Markup(safe) => {
                Paragraph::new(markup::render(safe, role_color(bubble.role)))
                    .wrap(Wrap { trim: false })
                    .line_count(content_width)
            }
        };

        (lines as u16).max(1) + VERTICAL_OVERHEAD
    }
}

pub(crate) fn role_color(role: Role) -> Color {
    match role {
        Role::User => Color::Green,
        Role::Bot => Color::Blue,
        Role::Error => Color::Red,
    }
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let color = role_color(self.bubble.role);
        let style = Style::default().fg(color);
        let border_style = match self.bubble.role {
            Role::Error => style,
            _ => style.add_modifier(Modifier::DIM),
        };

        let title = format!(
            "{} · {}",
            self.bubble.role.label(),
            self.bubble.at.format("%H:%M")
        );

        let block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let paragraph = match &self.bubble.body {
            BubbleBody::Text(content) => Paragraph::new(Text::raw(content.trim().to_string()))
                .style(style)
                .wrap(Wrap { trim: true }),
            BubbleBody::Markup(safe) => {
                Paragraph::new(markup::render(safe, color)).wrap(Wrap { trim: false })
            }
        };

        paragraph.render(inner_area, buf);
    }
}
