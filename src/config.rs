//! Driver configuration.
//!
//! Every section has defaults matching the reference driver timings, so an
//! empty JSON object is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default port for the HTTP surface
pub const DEFAULT_PORT: u16 = 4445;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    pub supervisor: SupervisorConfig,
    pub webview_lookup: RetryConfig,
    pub implicit_wait: ImplicitWaitConfig,
    pub tap: TapConfig,
    pub server: ServerConfig,
}

impl DriverConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.webview_lookup.attempts == 0 {
            return Err(Error::Config(
                "webviewLookup.attempts must be at least 1".to_string(),
            ));
        }
        if self.implicit_wait.poll_interval_ms == 0 {
            return Err(Error::Config(
                "implicitWait.pollIntervalMs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Watchdog and alert-polling timings for atom execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SupervisorConfig {
    pub watchdog_ms: u64,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            watchdog_ms: 1000,
            poll_interval_ms: 500,
            max_polls: 10,
        }
    }
}

impl SupervisorConfig {
    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval_ms: 100,
        }
    }
}

impl RetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImplicitWaitConfig {
    /// Implicit wait a new session starts with
    pub default_ms: u64,
    /// Spacing between native lookups while the implicit wait runs
    pub poll_interval_ms: u64,
}

impl Default for ImplicitWaitConfig {
    fn default() -> Self {
        Self {
            default_ms: 0,
            poll_interval_ms: 500,
        }
    }
}

impl ImplicitWaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TapConfig {
    /// Static offset added to translated points while in landscape
    pub landscape_offset: OffsetConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetConfig {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}
