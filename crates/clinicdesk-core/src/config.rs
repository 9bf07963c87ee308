//! Client configuration.
//!
//! Two layers feed the API client:
//! - `Settings`: persisted user settings at `~/.config/clinicdesk/config.json`
//!   (API origin override, last used email)
//! - `ClientConfig`: the resolved base origin and request timeout
//!
//! The environment beats persisted settings, which beat the built-in
//! local development origin.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "clinicdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Local development backend origin
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding the backend origin
pub const API_URL_ENV: &str = "CLINICDESK_API_URL";

/// Environment variable overriding the request timeout; `0` disables it
pub const REQUEST_TIMEOUT_ENV: &str = "CLINICDESK_REQUEST_TIMEOUT_SECS";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not find a platform config or cache directory")]
    NoPlatformDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build config from the process environment alone.
    pub fn from_env() -> Self {
        Self::resolve(&Settings::default())
    }

    /// Build config from the environment, falling back to persisted settings.
    pub fn resolve(settings: &Settings) -> Self {
        Self::resolve_with(settings, |key| std::env::var(key).ok())
    }

    fn resolve_with(settings: &Settings, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| settings.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = lookup(REQUEST_TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        let request_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Self::new(&base_url).with_timeout(request_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub last_email: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoPlatformDir)?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf, ConfigError> {
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::NoPlatformDir)?;
        Ok(cache_dir.join(APP_NAME))
    }
}
