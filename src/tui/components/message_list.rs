//! # MessageList Component
//!
//! Scrollable view of the chat bubbles.
//!
//! ## Responsibilities
//!
//! - Display bubbles in arrival order
//! - Keep the newest bubble in view while the user hasn't scrolled away
//! - Cache bubble heights so only new bubbles are measured each frame
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the bubble slice (props).
//! Bubbles never change once appended, so the layout cache only grows;
//! the event loop resets the state when the history is replaced by a clear.

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::message::Bubble;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll once the user has scrolled back to the end.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// True when content exists below the visible area.
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.scroll_state.offset().y < self.max_offset()
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub bubbles: &'a [Bubble],
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, bubbles: &'a [Bubble]) -> Self {
        Self { state, bubbles }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.bubbles.is_empty() {
            let hint = Paragraph::new("Type a message and press Enter")
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::DIM));
            let y = area.y + area.height / 2;
            frame.render_widget(hint, Rect::new(area.x, y, area.width, 1.min(area.height)));
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        // 1. Measure bubbles the cache hasn't seen yet
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.bubbles.len(), content_width);
        layout.heights.truncate(reusable);
        for bubble in self.bubbles.iter().skip(layout.heights.len()) {
            layout
                .heights
                .push(Message::calculate_height(bubble, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(self.bubbles.len(), content_width);

        let total_height = layout.total_height();

        // 2. Pin to the bottom, or clamp a manual scroll position
        self.state.viewport_height = area.height;
        if self.state.stick_to_bottom {
            let bottom = self.state.max_offset();
            self.state.scroll_state.set_offset(Position { x: 0, y: bottom });
        } else {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render only the visible bubbles into the ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(Message::new(&self.bubbles[i]), rect);
            y_offset += height;
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler lives on `MessageListState` because `MessageList` is rebuilt
/// every frame and cannot hold the scroll position.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::End => {
                self.stick_to_bottom = true;
                let bottom = self.max_offset();
                self.scroll_state.set_offset(Position { x: 0, y: bottom });
            }
            _ => {}
        }
        None
    }
}

/// Cached bubble heights at one content width.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Running sums of `heights`; entry i is the bottom edge of bubble i.
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            content_width: 0,
        }
    }

    /// How many cached heights are still valid for `message_count` bubbles
    /// at `content_width`.
    pub fn reusable_count(&self, message_count: usize, content_width: u16) -> usize {
        if self.content_width != content_width || message_count < self.message_count {
            return 0;
        }
        self.heights.len().min(message_count)
    }

    pub fn update_metadata(&mut self, message_count: usize, content_width: u16) {
        self.message_count = message_count;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Bubbles overlapping the viewport, plus half a viewport either side.
    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn cache_with(heights: &[u16], width: u16) -> LayoutCache {
        let mut cache = LayoutCache::new();
        cache.heights = heights.to_vec();
        cache.rebuild_prefix_heights();
        cache.update_metadata(heights.len(), width);
        cache
    }

    #[test]
    fn test_layout_cache_reusable() {
        let cache = cache_with(&[3, 3, 3], 80);

        // Same everything → all reusable
        assert_eq!(cache.reusable_count(3, 80), 3);
        // New bubble appended → cached ones stay valid
        assert_eq!(cache.reusable_count(4, 80), 3);
        // Width changed → remeasure everything
        assert_eq!(cache.reusable_count(3, 40), 0);
        // Fewer bubbles than cached → history was replaced
        assert_eq!(cache.reusable_count(1, 80), 0);
    }

    #[test]
    fn test_prefix_heights_and_total() {
        let cache = cache_with(&[3, 5, 2], 80);
        assert_eq!(cache.prefix_heights, vec![3, 8, 10]);
        assert_eq!(cache.total_height(), 10);
        assert_eq!(LayoutCache::new().total_height(), 0);
    }

    #[test]
    fn test_visible_range_skips_far_bubbles() {
        let cache = cache_with(&[10; 10], 80); // 100 rows
        // Viewport rows 50..60, buffer 5 either side → rows 45..65
        let range = cache.visible_range(50, 10);
        assert_eq!(range, 4..7);
    }

    #[test]
    fn test_scroll_up_unpins_and_end_repins() {
        let mut state = MessageListState::new();
        state.layout = cache_with(&[10; 5], 80);
        state.viewport_height = 10;
        state.scroll_state.set_offset(Position { x: 0, y: 40 });

        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        assert!(state.has_unseen_content());

        state.handle_event(&TuiEvent::End);
        assert!(state.stick_to_bottom);
        assert!(!state.has_unseen_content());
    }

    #[test]
    fn test_scroll_down_to_end_repins() {
        let mut state = MessageListState::new();
        state.layout = cache_with(&[10; 5], 80);
        state.viewport_height = 10;
        state.stick_to_bottom = false;
        state.scroll_state.set_offset(Position { x: 0, y: 39 });

        state.handle_event(&TuiEvent::ScrollDown);
        assert!(state.stick_to_bottom);
        assert_eq!(state.scroll_state.offset().y, 40);
    }

    #[test]
    fn test_render_shows_latest_bubble() {
        let bubbles: Vec<Bubble> = (0..20).map(|i| Bubble::bot(format!("reply {i}"))).collect();
        let mut state = MessageListState::new();
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();

        terminal
            .draw(|f| MessageList::new(&mut state, &bubbles).render(f, f.area()))
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("reply 19"));
        assert!(!text.contains("reply 0 "));
        assert_eq!(state.layout.heights.len(), 20);
    }

    #[test]
    fn test_render_empty_shows_hint() {
        let mut state = MessageListState::new();
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal
            .draw(|f| MessageList::new(&mut state, &[]).render(f, f.area()))
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Type a message"));
    }
}
