//! `legally.toml` loading

use anyhow::{Context, Result};
use legally_client::ClientConfig;
use legally_content::ContentConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "legally.toml";

/// Overrides `client.api_url`
pub const API_URL_ENV: &str = "LEGALLY_API_URL";

/// Overrides `client.chat_url`
pub const CHAT_URL_ENV: &str = "LEGALLY_CHAT_URL";

/// Whole application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[content]` table
    pub content: ContentConfig,
    /// `[client]` table
    pub client: ClientConfig,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid legally.toml")
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, `legally.toml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply environment overrides from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.client.api_url = url;
        }
        if let Some(url) = lookup(CHAT_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.client.chat_url = url;
        }
    }

    /// Check both tables
    pub fn validate(&self) -> Result<()> {
        self.content.validate().context("invalid [content] table")?;
        self.client.validate().context("invalid [client] table")?;
        Ok(())
    }
}
