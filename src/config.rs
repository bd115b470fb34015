//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const APP_DIR_NAME: &str = "paymybuddy";
const SESSION_DIR_NAME: &str = "paymybuddy-session";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL: {0} (expected http:// or https://)")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without trailing slash.
    pub base_url: String,
    pub timeouts: Timeouts,
    /// Overrides the parent directory of both storage tiers.
    pub state_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PAYMYBUDDY_BASE_URL`: default `http://localhost:8080`
    /// - `PAYMYBUDDY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PAYMYBUDDY_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PAYMYBUDDY_STATE_DIR`: where identity snapshots are kept
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an http(s) URL.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            lookup("PAYMYBUDDY_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
        )?;
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("PAYMYBUDDY_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("PAYMYBUDDY_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let state_dir = lookup("PAYMYBUDDY_STATE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { base_url, timeouts, state_dir })
    }

    /// Replace the base URL, validating it the same way as the env var.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    /// Directory for identities saved with `remember = true`.
    #[must_use]
    pub fn persistent_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => dir.join("persistent"),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME),
        }
    }

    /// Directory for identities saved with `remember = false`. Lives under
    /// the OS temp dir so it does not outlive the machine session.
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        match &self.state_dir {
            Some(dir) => dir.join("session"),
            None => std::env::temp_dir().join(SESSION_DIR_NAME),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_owned(), timeouts: Timeouts::default(), state_dir: None }
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
