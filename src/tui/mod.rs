//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm. The
//! headless subcommands in main.rs drive the same core through
//! `core::client::ChatClient` instead.
//!
//! ## Requests
//!
//! Every `Effect` that needs the backend runs on its own tokio task through
//! `core::client::perform`, and the settling `Action` comes back over a std
//! channel. The loop never awaits, so typing and scrolling stay live while a
//! reply is pending.
//!
//! ## Redraw Strategy
//!
//! - **Waiting** for a reply: draws every ~80ms so the spinner turns.
//! - **Idle**: sleeps up to 500ms, only redraws on events or background
//!   actions.

mod component;
mod components;
mod event;
pub mod markup;
mod ui;

use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use tokio::task::AbortHandle;

use crate::backend::ChatBackend;
use crate::core::action::{Action, Effect, update};
use crate::core::client::perform;
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,                        // Show cursor for input editing
            SetCursorStyle::SteadyBlock, // Non-blinking: redraws reset the blink timer
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste, Hide);
    }
}

/// Chat sends started by the loop and not yet settled, by request id.
/// Status and clear requests are never aborted, so they aren't tracked.
struct InFlight {
    sends: HashMap<u64, AbortHandle>,
}

impl InFlight {
    fn new() -> Self {
        Self {
            sends: HashMap::new(),
        }
    }

    fn abort(&mut self, request_id: u64) {
        if let Some(handle) = self.sends.remove(&request_id) {
            info!("Aborting superseded request {}", request_id);
            handle.abort();
        }
    }

    fn abort_all(&mut self) {
        for (_, handle) in self.sends.drain() {
            handle.abort();
        }
    }
}

/// Runs an effect on a background task; the settling action arrives on `tx`.
fn spawn_effect(
    backend: &Arc<dyn ChatBackend>,
    effect: Effect,
    tx: &mpsc::Sender<Action>,
) -> AbortHandle {
    let backend = backend.clone();
    let tx = tx.clone();
    let handle = tokio::spawn(async move {
        if let Some(action) = perform(backend.as_ref(), effect).await
            && tx.send(action).is_err()
        {
            warn!("Failed to deliver backend result: receiver dropped");
        }
    });
    handle.abort_handle()
}

/// Starts whatever I/O `effect` asks for. Returns true on `Effect::Quit`.
fn apply_effect(
    effect: Effect,
    backend: &Arc<dyn ChatBackend>,
    tx: &mpsc::Sender<Action>,
    in_flight: &mut InFlight,
) -> bool {
    match effect {
        Effect::None => false,
        Effect::Quit => true,
        Effect::SendMessage {
            request_id,
            supersedes,
            ..
        } => {
            if let Some(old) = supersedes {
                in_flight.abort(old);
            }
            info!("Spawning request {}", request_id);
            let handle = spawn_effect(backend, effect, tx);
            in_flight.sends.insert(request_id, handle);
            false
        }
        Effect::CheckStatus | Effect::Clear => {
            spawn_effect(backend, effect, tx);
            false
        }
    }
}

pub fn run(mut app: App, backend: Arc<dyn ChatBackend>) -> std::io::Result<()> {
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut in_flight = InFlight::new();

    info!("Starting TUI against backend '{}'", backend.name());
    let effect = update(&mut app, Action::CheckStatus);
    apply_effect(effect, &backend, &tx, &mut in_flight);

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    loop {
        // Sync InputBox props with App state
        tui.input_box.disabled = !app.can_send();

        let animating = app.loading.is_waiting();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let action = match event {
                TuiEvent::Resize => None,
                TuiEvent::Quit => Some(Action::Quit),
                TuiEvent::ClearChat => Some(Action::Clear),
                TuiEvent::RecheckStatus => Some(Action::CheckStatus),
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.message_list.handle_event(&event);
                    None
                }
                _ => {
                    // End also jumps the list back to the newest bubble
                    if event == TuiEvent::End {
                        tui.message_list.handle_event(&event);
                    }
                    match tui.input_box.handle_event(&event) {
                        Some(InputEvent::Submit(text)) => Some(Action::Submit(text)),
                        Some(InputEvent::ContentChanged) | None => None,
                    }
                }
            };

            if let Some(action) = action {
                let effect = update(&mut app, action);
                if apply_effect(effect, &backend, &tx, &mut in_flight) {
                    should_quit = true;
                    break;
                }
                tui.input_box.disabled = !app.can_send();
            }
        }

        if should_quit {
            break;
        }

        // Handle actions settled by background tasks
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);

            let cleared = matches!(action, Action::ClearFinished(Ok(())));
            if let Action::ReplyReceived { request_id, .. } = &action {
                in_flight.sends.remove(request_id);
            }

            let effect = update(&mut app, action);
            if cleared {
                // History was replaced; cached bubble heights no longer apply
                tui.message_list = MessageListState::new();
            }
            if apply_effect(effect, &backend, &tx, &mut in_flight) {
                should_quit = true;
                break;
            }
        }

        if should_quit {
            break;
        }
    }

    in_flight.abort_all();
    ratatui::restore();
    Ok(())
}
