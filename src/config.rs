//! Shutdown timing configuration.
//!
//! Values are read once, when the [`GracefulShutdown`](crate::shutdown::GracefulShutdown)
//! is built. They can come from a TOML document:
//!
//! ```toml
//! lb_recognition_period_seconds = 3
//! grace_period_seconds = 1
//! drain_progress_interval_seconds = 1
//! ```
//!
//! or from the environment (`NODE_LB_RECOGNITION_PERIOD_SECONDS`,
//! `NODE_SHUTDOWN_GRACE_SECONDS`, `NODE_DRAIN_PROGRESS_INTERVAL_SECONDS`).
//! Missing keys keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const ENV_LB_RECOGNITION_PERIOD: &str = "NODE_LB_RECOGNITION_PERIOD_SECONDS";
pub const ENV_GRACE_PERIOD: &str = "NODE_SHUTDOWN_GRACE_SECONDS";
pub const ENV_DRAIN_PROGRESS_INTERVAL: &str = "NODE_DRAIN_PROGRESS_INTERVAL_SECONDS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid value {value:?} for {key}: expected whole seconds")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShutdownConfig {
    /// How long the node presents as HALTING before it starts stopping inputs.
    pub lb_recognition_period_seconds: u64,
    /// Pause after the activity record so an in-flight admin request can
    /// still receive its response.
    pub grace_period_seconds: u64,
    /// How often drain waits log that they are still waiting.
    pub drain_progress_interval_seconds: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            lb_recognition_period_seconds: 3,
            grace_period_seconds: 1,
            drain_progress_interval_seconds: 1,
        }
    }
}

impl ShutdownConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by whatever the environment sets.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`, keyed by the `ENV_*` names.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let parse = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidEnv { key, value }),
            }
        };

        if let Some(secs) = parse(ENV_LB_RECOGNITION_PERIOD)? {
            self.lb_recognition_period_seconds = secs;
        }
        if let Some(secs) = parse(ENV_GRACE_PERIOD)? {
            self.grace_period_seconds = secs;
        }
        if let Some(secs) = parse(ENV_DRAIN_PROGRESS_INTERVAL)? {
            self.drain_progress_interval_seconds = secs;
        }
        Ok(self)
    }

    pub fn lb_recognition_period(&self) -> Duration {
        Duration::from_secs(self.lb_recognition_period_seconds)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_seconds)
    }

    pub fn drain_progress_interval(&self) -> Duration {
        Duration::from_secs(self.drain_progress_interval_seconds)
    }
}
