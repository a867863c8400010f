//! Configuration loading and management
//!
//! Handles parsing of the `sprintsync.toml` configuration file from the
//! user's config directory, with environment-variable overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding the API base URL.
pub const ENV_BASE_URL: &str = "SPRINTSYNC_URL";
/// Environment variable overriding the static API key.
pub const ENV_API_KEY: &str = "SPRINTSYNC_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the SprintSync API, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static API key sent as `x-api-key` on every request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default page size for task and user listings
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_page_size() -> u32 {
    10
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists. Environment overrides are applied last.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = match path {
            Some(ref path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|err| Error::InvalidConfig(format!("{}: {err}", path.display())))?;
        if config.page_size == 0 {
            return Err(Error::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Default config file path (`<config dir>/sprintsync/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sprintsync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            let key = key.trim();
            if !key.is_empty() {
                self.api_key = Some(key.to_string());
            }
        }
    }
}
