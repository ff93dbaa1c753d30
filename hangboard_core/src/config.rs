//! Configuration file support for Hangboard.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/hangboard/config.toml`.

use crate::session::DEFAULT_PREP_SECONDS;
use crate::{Error, Result, SessionConfig, SessionKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Session timing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_prep_seconds")]
    pub prep_seconds: u32,

    /// Run a selected warm-up before the workout
    #[serde(default = "default_warmup")]
    pub warmup: bool,

    /// Length of one clock tick in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            prep_seconds: default_prep_seconds(),
            warmup: default_warmup(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl SessionSettings {
    pub fn session_config(&self, kind: SessionKind) -> SessionConfig {
        SessionConfig {
            kind,
            prep_seconds: self.prep_seconds,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

/// Exercise dataset configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Dataset file to use instead of the built-in catalog
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_prep_seconds() -> u32 {
    DEFAULT_PREP_SECONDS
}

fn default_warmup() -> bool {
    true
}

fn default_tick_millis() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => {
                let home = std::env::var("HOME").map_err(|_| {
                    Error::Config("HOME environment variable not set".into())
                })?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(base.join("hangboard").join("config.toml"))
    }

    /// Reject settings the session clock cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.session.tick_millis == 0 {
            return Err(Error::Config("session.tick_millis must be positive".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
