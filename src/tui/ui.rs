use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, TitleBar, TypingIndicator};

use ratatui::Frame;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;

/// Draws one frame: title bar, bubbles, typing indicator, input box.
///
/// The indicator row only exists while a reply is pending, so the list
/// reclaims it when idle.
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let indicator_height = if app.loading.is_waiting() { 1 } else { 0 };
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let layout = Layout::vertical([
        Length(1),
        Min(0),
        Length(indicator_height),
        Length(input_height),
    ]);
    let [title_area, main_area, indicator_area, input_area] = layout.areas(frame.area());

    MessageList::new(&mut tui.message_list, &app.messages).render(frame, main_area);

    TitleBar::new(
        app.status,
        app.status_text(),
        tui.message_list.has_unseen_content(),
    )
    .render(frame, title_area);

    if app.loading.is_waiting() {
        TypingIndicator::new(&app.model_label, spinner_frame, app.queued.len())
            .render(frame, indicator_area);
    }

    tui.input_box.render(frame, input_area);
}
