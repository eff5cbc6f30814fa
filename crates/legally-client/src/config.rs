//! Client configuration

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default backend address
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Backend endpoints and timing
///
/// Deserializes from the `[client]` table of `legally.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Analysis, auth and history backend
    pub api_url: String,
    /// Chat backend
    pub chat_url: String,
    /// Path prefix of the task status endpoint
    pub status_path: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay between task status requests in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            chat_url: DEFAULT_API_URL.to_string(),
            status_path: "/api/status".to_string(),
            timeout_ms: 120_000,
            poll_interval_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// With chat base URL
    #[inline]
    #[must_use]
    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = url.into();
        self
    }

    /// With status path prefix
    #[inline]
    #[must_use]
    pub fn with_status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = path.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With poll interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check the URLs and timings
    pub fn validate(&self) -> Result<(), ClientError> {
        for (name, url) in [("api_url", &self.api_url), ("chat_url", &self.chat_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ClientError::Config(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if !self.status_path.starts_with('/') {
            return Err(ClientError::Config(format!(
                "status_path must start with '/', got {:?}",
                self.status_path
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::Config("timeout_ms must be positive".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ClientError::Config("poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}
