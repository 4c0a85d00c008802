//! Status label shown in the title bar.
//!
//! The check either reaches the backend or it doesn't. A backend that says
//! Ollama is down and a backend that can't be reached both land on
//! `Offline`: the user can't chat in either case, and the difference is only
//! worth a log line.

use log::{info, warn};

use crate::backend::{BackendError, ServiceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLabel {
    /// Probe not answered yet.
    #[default]
    Checking,
    Online {
        model_available: Option<bool>,
    },
    Offline,
}

impl StatusLabel {
    /// Maps a check result to a label. `model_available` is ignored when the
    /// backend reports that it is not running.
    pub fn from_check(result: &Result<ServiceStatus, BackendError>) -> Self {
        match result {
            Ok(status) if status.running => {
                info!(
                    "Backend online, model available: {:?}, models: {:?}",
                    status.model_available, status.models
                );
                StatusLabel::Online {
                    model_available: status.model_available,
                }
            }
            Ok(_) => {
                info!("Backend reports Ollama is not running");
                StatusLabel::Offline
            }
            Err(e) => {
                warn!("Status check failed: {}", e);
                StatusLabel::Offline
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, StatusLabel::Offline)
    }

    pub fn text(&self, model_label: &str) -> String {
        match self {
            StatusLabel::Checking => "Checking backend...".to_string(),
            StatusLabel::Online {
                model_available: Some(true),
            } => format!("{model_label} model available"),
            StatusLabel::Online {
                model_available: Some(false),
            } => format!("{model_label} model not found"),
            StatusLabel::Online {
                model_available: None,
            } => format!("{model_label} model status unknown"),
            StatusLabel::Offline => "Ollama is not running".to_string(),
        }
    }
}
