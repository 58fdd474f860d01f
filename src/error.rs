//! Error types. None of these reach `resolve` or `set_language` callers;
//! fetch failures are classified only so they can be logged and counted.

use thiserror::Error;

/// Outcome of a failed group fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The load's cancellation handle fired before the fetch settled.
    #[error("fetch cancelled")]
    Cancelled,

    /// Transport-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    /// The fetch future panicked.
    #[error("fetch panicked")]
    Panicked,

    /// Body was not a flat JSON object.
    #[error("invalid translation group body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Failure to build a translation session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no tokio runtime available to drive group loads")]
    NoRuntime,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid config field {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}
