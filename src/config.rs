//! Runtime configuration
//!
//! Everything is read from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "CALFLASH_MODEL";
pub const API_BASE_ENV: &str = "CALFLASH_API_BASE";
pub const FRAME_PATH_ENV: &str = "CALFLASH_FRAME_PATH";
pub const DICTATION_ENV: &str = "CALFLASH_DICTATION";
pub const TIMEOUT_ENV: &str = "CALFLASH_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which dictation backend to install at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationMode {
    /// Transcripts are produced by the client and submitted through the server
    External,
    /// Dictation is unsupported; toggling is a no-op
    Off,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub frame_path: PathBuf,
    pub dictation: DictationMode,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dictation = match non_empty(DICTATION_ENV) {
            None => DictationMode::External,
            Some(value) => match value.to_lowercase().as_str() {
                "external" | "on" => DictationMode::External,
                "off" | "none" | "disabled" => DictationMode::Off,
                _ => return Err(ConfigError::InvalidValue { key: DICTATION_ENV, value }),
            },
        };

        let request_timeout = match non_empty(TIMEOUT_ENV) {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidValue { key: TIMEOUT_ENV, value }),
            },
        };

        Ok(Self {
            gemini_api_key: non_empty(GEMINI_API_KEY_ENV),
            model: non_empty(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: non_empty(API_BASE_ENV)
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            frame_path: non_empty(FRAME_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(default_frame_path),
            dictation,
            request_timeout,
        })
    }
}

/// `<project>/data/frame.jpg`, found relative to the executable
fn default_frame_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("frame.jpg");
    path
}
