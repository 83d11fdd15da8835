//! Client configuration.
//!
//! The backend host is deployment configuration, not part of the design:
//! it is read from `config.toml` in the Parley config directory, with the
//! `PARLEY_BASE_URL` environment variable as a fallback for ad hoc use.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParleyError, Result};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Configuration for the HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat service, e.g. `https://chat.example.com/api`.
    pub base_url: String,
    /// Whole-request timeout. A hung send must terminate so the controller
    /// can roll back and return to idle.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Loads configuration with the usual priority:
    ///
    /// 1. `config.toml` at the given path
    /// 2. `PARLEY_BASE_URL` environment variable
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            return Ok(config);
        }

        if let Ok(base_url) = env::var("PARLEY_BASE_URL") {
            return Ok(Self::new(base_url));
        }

        Err(ParleyError::config(format!(
            "No configuration found: create {} with a base_url, or set PARLEY_BASE_URL",
            config_path.display()
        )))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
