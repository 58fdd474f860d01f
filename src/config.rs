//! Session configuration: fetch host, initial language, request timeout.
//! Supplied once at construction; only the language changes afterwards,
//! and only through `set_language`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL groups are fetched from, as `{host}/{language}/{path}`.
    pub host: String,
    /// Language active when the session starts.
    pub language: String,
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            language: language.into(),
            ..Self::default()
        }
    }

    /// Read `LINGO_HOST`, `LINGO_LANGUAGE` and `LINGO_TIMEOUT_SECS`, falling
    /// back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(host) = lookup("LINGO_HOST") {
            config.host = host;
        }
        if let Some(language) = lookup("LINGO_LANGUAGE") {
            config.language = language;
        }
        if let Some(raw) = lookup("LINGO_TIMEOUT_SECS") {
            config.request_timeout_secs = raw
                .trim()
                .parse()
                .ok()
                .filter(|&secs: &u64| secs > 0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    name: "LINGO_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
        }
        Ok(config)
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        if config.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidField {
                field: "request_timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Host with any trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }
}

/// Compose the fetch target for one group.
pub fn group_url(host: &str, language: &str, path: &str) -> String {
    format!("{}/{}/{}", host.trim_end_matches('/'), language, path)
}
