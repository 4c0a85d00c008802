use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::event::TuiEvent;

/// A UI slot of the chat screen.
///
/// Components receive their data as props (struct fields), may borrow
/// persistent state mutably, and draw into the `Rect` they are given.
/// `render` takes `&mut self` so a component can refresh caches such as
/// layout heights or scroll offsets during the render pass.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that reacts to terminal events.
pub trait EventHandler {
    /// The higher-level event this component emits, if any.
    type Event;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
