//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.gemma-chat/config.toml` unless `--config` points
//! elsewhere. If the default file is missing on first run, a commented-out
//! default is generated so users can discover all options.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::state::OverlapPolicy;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model_label: Option<String>,
    pub overlap_policy: Option<OverlapPolicy>,
    pub trust_markup: Option<bool>,
    pub log_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_MODEL_LABEL: &str = "Gemma3";
pub const DEFAULT_LOG_FILE: &str = "gemma-chat.log";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    /// `None` leaves timing entirely to the transport.
    pub request_timeout: Option<Duration>,
    pub model_label: String,
    pub overlap_policy: OverlapPolicy,
    pub trust_markup: bool,
    pub log_file: PathBuf,
}

/// Values taken from CLI flags (None = flag not given).
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides<'a> {
    pub base_url: Option<&'a str>,
    pub overlap_policy: Option<OverlapPolicy>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::InvalidPolicy(value) => write!(
                f,
                "invalid overlap policy '{value}' (expected ignore, queue or replace)"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.gemma-chat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".gemma-chat").join("config.toml"))
}

/// Where the loaded config came from.
///
/// Config is read before the logger exists (the log path is a config value),
/// so loading records what happened here and `log` reports it afterwards.
#[derive(Debug)]
pub enum ConfigSource {
    /// Read from this file.
    File(PathBuf),
    /// No file yet; a commented default was written here.
    Generated(PathBuf),
    /// No file yet and writing the default failed.
    GenerateFailed { path: PathBuf, error: std::io::Error },
    /// No home directory to look in.
    NoHomeDir,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Generated(path) => {
                info!("No config file found, generated default at {}", path.display())
            }
            ConfigSource::GenerateFailed { path, error } => warn!(
                "No config file found and failed to write default at {}: {}",
                path.display(),
                error
            ),
            ConfigSource::NoHomeDir => {
                warn!("Could not determine home directory, using default config")
            }
        }
    }
}

/// Load config from `explicit` if given, otherwise from the default path.
///
/// A missing default file is generated and treated as empty. A missing
/// explicit file is an error: the user asked for that file specifically.
pub fn load_config(explicit: Option<&Path>) -> Result<(ChatConfig, ConfigSource), ConfigError> {
    match explicit {
        Some(path) => read_config(path),
        None => load_default(config_path()),
    }
}

fn load_default(path: Option<PathBuf>) -> Result<(ChatConfig, ConfigSource), ConfigError> {
    let Some(path) = path else {
        return Ok((ChatConfig::default(), ConfigSource::NoHomeDir));
    };

    if path.exists() {
        return read_config(&path);
    }

    let source = match generate_default_config(&path) {
        Ok(()) => ConfigSource::Generated(path),
        Err(error) => ConfigSource::GenerateFailed { path, error },
    };
    Ok((ChatConfig::default(), source))
}

fn read_config(path: &Path) -> Result<(ChatConfig, ConfigSource), ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ChatConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    Ok((config, ConfigSource::File(path.to_path_buf())))
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) -> std::io::Result<()> {
    let default_content = r#"# gemma-chat configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model_label = "Gemma3"              # Name shown in the status bar
# overlap_policy = "ignore"           # "ignore", "queue" or "replace" (GEMMA_CHAT_OVERLAP)
# trust_markup = false                # true renders server HTML unsanitized (only for backends you control)
# log_file = "gemma-chat.log"         # Or set GEMMA_CHAT_LOG_FILE

# [backend]
# base_url = "http://localhost:5000"  # Or set GEMMA_CHAT_BASE_URL
# request_timeout_secs = 120          # Unset = no client-side timeout
"#;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, default_content)
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ChatConfig, cli: CliOverrides<'_>) -> Result<ResolvedConfig, ConfigError> {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("GEMMA_CHAT_BASE_URL").ok())
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Overlap policy: CLI → env → config → default
    let overlap_policy = match cli.overlap_policy {
        Some(policy) => policy,
        None => match std::env::var("GEMMA_CHAT_OVERLAP") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPolicy(value))?,
            Err(_) => config.general.overlap_policy.unwrap_or_default(),
        },
    };

    // Log file: env → config → default
    let log_file = std::env::var("GEMMA_CHAT_LOG_FILE")
        .ok()
        .or_else(|| config.general.log_file.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    Ok(ResolvedConfig {
        base_url,
        request_timeout: config
            .backend
            .request_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs),
        model_label: config
            .general
            .model_label
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_string()),
        overlap_policy,
        trust_markup: config.general.trust_markup.unwrap_or(false),
        log_file: PathBuf::from(log_file),
    })
}
