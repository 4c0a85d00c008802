//! # InputBox Component
//!
//! Single-buffer text input at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input and paste
//! - Editing: backspace, delete, left/right, home/end
//! - Emit `Submit` on Enter, unless the send control is disabled
//!
//! The buffer is hard-wrapped by display width (not word-wrapped), so the
//! cursor position on screen is exact for wide and combining characters.
//! The box grows with its content up to `MAX_VISIBLE_LINES`, then scrolls.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders
const VERTICAL_OVERHEAD: u16 = 2;
/// Content lines shown before the box starts scrolling
const MAX_VISIBLE_LINES: u16 = 5;
/// Border + padding between the area edge and the first text column
const TEXT_OFFSET_X: u16 = 2;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Submit(String),
    ContentChanged,
}

/// Text input component.
///
/// # Props
///
/// - `disabled`: the send control is off (a reply is pending under the
///   ignore policy). Typing still works; Enter does nothing and the text stays.
///
/// # State
///
/// - `buffer`: current text
/// - `cursor`: byte offset into `buffer`, always on a char boundary
pub struct InputBox {
    pub buffer: String,
    pub disabled: bool,
    cursor: usize,
    scroll_offset: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: false,
            cursor: 0,
            scroll_offset: 0,
        }
    }

    /// Height for the current buffer at `width`, borders included.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let lines = layout_lines(&self.buffer, inner_width(width)).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// (row, column) of the cursor within the wrapped buffer.
    fn cursor_row_col(&self, width: u16) -> (u16, u16) {
        let lines = layout_lines(&self.buffer, width);
        let row = lines
            .iter()
            .rposition(|&(start, _)| start <= self.cursor)
            .unwrap_or(0);
        let start = lines.get(row).map_or(0, |&(start, _)| start);
        (row as u16, display_width(&self.buffer[start..self.cursor]))
    }

    fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map_or(self.buffer.len(), |c| self.cursor + c.len_utf8())
    }
}

/// Usable text columns inside the bordered, padded block.
fn inner_width(width: u16) -> u16 {
    width.saturating_sub(HORIZONTAL_OVERHEAD)
}

fn display_width(text: &str) -> u16 {
    text.chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0) as u16)
        .sum()
}

/// Splits `text` into display lines of at most `width` columns.
///
/// Returns `(start, end)` byte ranges; a `\n` ends a line and is not part of
/// either neighbour. A full last line is followed by an empty one so the
/// cursor has somewhere to sit.
fn layout_lines(text: &str, width: u16) -> Vec<(usize, usize)> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used: u16 = 0;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            lines.push((start, i));
            start = i + 1;
            used = 0;
            continue;
        }
        let w = UnicodeWidthChar::width(c).unwrap_or(0) as u16;
        if used + w > width && used > 0 {
            lines.push((start, i));
            start = i;
            used = 0;
        }
        used += w;
    }

    lines.push((start, text.len()));
    if used >= width {
        lines.push((text.len(), text.len()));
    }
    lines
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        let visible = area.height.saturating_sub(VERTICAL_OVERHEAD).max(1);
        let (cursor_row, cursor_col) = self.cursor_row_col(width);

        // Keep the cursor line inside the visible window
        if cursor_row < self.scroll_offset {
            self.scroll_offset = cursor_row;
        } else if cursor_row >= self.scroll_offset + visible {
            self.scroll_offset = cursor_row + 1 - visible;
        }

        let lines: Vec<Line> = layout_lines(&self.buffer, width)
            .into_iter()
            .map(|(start, end)| Line::raw(&self.buffer[start..end]))
            .collect();

        let (title, style) = if self.disabled {
            (
                "Waiting for reply...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            )
        } else {
            ("Message (Enter to send)", Style::default().fg(Color::Green))
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .padding(Padding::horizontal(1));

        let input = Paragraph::new(lines)
            .block(block)
            .style(style)
            .scroll((self.scroll_offset, 0));
        frame.render_widget(input, area);

        let x = area.x + TEXT_OFFSET_X + cursor_col;
        let y = area.y + 1 + cursor_row - self.scroll_offset;
        frame.set_cursor_position((x, y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut tmp = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut tmp));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                let text = text.replace("\r\n", "\n").replace('\r', "\n");
                self.insert_str(&text);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace if self.cursor > 0 => {
                let prev = self.prev_boundary();
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete if self.cursor < self.buffer.len() => {
                let next = self.next_boundary();
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft if self.cursor > 0 => {
                self.cursor = self.prev_boundary();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorRight if self.cursor < self.buffer.len() => {
                self.cursor = self.next_boundary();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Home if self.cursor > 0 => {
                self.cursor = 0;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::End if self.cursor < self.buffer.len() => {
                self.cursor = self.buffer.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Submit if !self.disabled && !self.buffer.trim().is_empty() => {
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                self.scroll_offset = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
