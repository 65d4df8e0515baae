//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STATE_DIR: &str = ".vidshare";
pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const DEFAULT_COMMENT_POLL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
    #[error("{var} is empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub state_dir: PathBuf,
    pub page_size: u32,
    pub comment_poll_secs: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            page_size: DEFAULT_PAGE_SIZE,
            comment_poll_secs: DEFAULT_COMMENT_POLL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Build typed config from the process environment (after `.env` is loaded).
    ///
    /// Optional:
    /// - `VIDSHARE_BASE_URL`: default `http://localhost:8080/api`
    /// - `VIDSHARE_STATE_DIR`: default `.vidshare`
    /// - `VIDSHARE_PAGE_SIZE`: default 12
    /// - `VIDSHARE_COMMENT_POLL_SECS`: default 30
    /// - `VIDSHARE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `VIDSHARE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is blank or a count is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("VIDSHARE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned();
        if base_url.is_empty() {
            return Err(ConfigError::Empty { var: "VIDSHARE_BASE_URL" });
        }

        let state_dir = lookup("VIDSHARE_STATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_DIR), PathBuf::from);

        let page_size = parse_or(&lookup, "VIDSHARE_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::Zero { var: "VIDSHARE_PAGE_SIZE" });
        }
        let comment_poll_secs = parse_or(&lookup, "VIDSHARE_COMMENT_POLL_SECS", DEFAULT_COMMENT_POLL_SECS);
        if comment_poll_secs == 0 {
            return Err(ConfigError::Zero { var: "VIDSHARE_COMMENT_POLL_SECS" });
        }

        Ok(Self {
            base_url,
            state_dir,
            page_size,
            comment_poll_secs,
            request_timeout_secs: parse_or(&lookup, "VIDSHARE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: parse_or(&lookup, "VIDSHARE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn comment_poll_period(&self) -> Duration {
        Duration::from_secs(self.comment_poll_secs)
    }

    /// Location of the persisted key-value store.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.state_dir.join("storage.json")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
