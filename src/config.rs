//! Application configuration
//!
//! Ships with working defaults; an optional `config.toml` in the platform
//! config directory (and the `COACH_SERVER_URL` environment variable) can
//! override them. The frame size and reconnect delay are exposed mostly so
//! tests can shrink them.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_SERVER_URL, FRAME_SAMPLES, RECONNECT_DELAY};
use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the analysis server (`ws://host:port`)
    pub server_url: String,
    /// Seconds between reconnection attempts
    pub reconnect_delay_secs: u64,
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Samples per outbound frame
    pub frame_samples: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            reconnect_delay_secs: RECONNECT_DELAY.as_secs(),
            capture: CaptureSettings::default(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            frame_samples: FRAME_SAMPLES,
        }
    }
}

impl AppConfig {
    /// Load from the platform config file if present, else defaults.
    /// `COACH_SERVER_URL` overrides the server URL either way.
    pub fn load() -> Result<Self, Error> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        if let Ok(url) = std::env::var("COACH_SERVER_URL") {
            config.server_url = url;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "speech-coach").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
