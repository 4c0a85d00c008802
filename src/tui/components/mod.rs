//! # TUI Components
//!
//! UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as parameters:
//! - `TitleBar`: app name, backend status, unseen-content marker
//! - `Message`: a single chat bubble
//! - `TypingIndicator`: spinner shown while a reply is pending
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that keep local state and emit events:
//! - `InputBox`: text input, emits `Submit`
//! - `MessageList`: scrollable bubble view with layout caching
//!
//! Components receive external data as props, never by reaching into `App`.
//! `MessageList` renders many `Message`s; `ui::draw_ui` composes the rest.
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── message.rs
//! ├── message_list.rs
//! ├── typing_indicator.rs
//! └── input_box.rs
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod typing_indicator;
pub use typing_indicator::TypingIndicator;
