//! # Core Application Logic
//!
//! This module contains the chat client's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • App (state)          │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • perform() (I/O)      │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │    TUI     │                          │ ChatClient │
//!     │  Adapter   │                          │ (headless) │
//!     │ (ratatui)  │                          │            │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct and the loading state machine
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`client`]: Effect execution and the headless `ChatClient`
//! - [`message`]: Bubbles and their fixed texts
//! - [`status`]: Status check → status label
//! - [`markup`]: Tokenizing and sanitizing server HTML
//! - [`config`]: Config file, env and CLI resolution

pub mod action;
pub mod client;
pub mod config;
pub mod markup;
pub mod message;
pub mod state;
pub mod status;
