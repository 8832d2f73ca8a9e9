//! Configuration for the presence agent.

use crate::core::filter::DEFAULT_ALPHA;
use crate::core::presence::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Base threshold values selectable at runtime, in dBm.
pub const THRESHOLD_OPTIONS: [i32; 9] = [-20, -30, -40, -50, -60, -70, -80, -90, -100];

/// Main configuration for the presence agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tracked device: name fragment or hardware address
    pub target: String,

    /// Base RSSI threshold in dBm; below this the device counts as far
    pub base_threshold_dbm: i32,

    /// Hysteresis gap in dB between going far and coming back near
    pub hysteresis_db: i32,

    /// EMA smoothing factor in (0, 1]
    pub smoothing_alpha: f64,

    /// Seconds without an accepted observation before the device is lost
    pub loss_timeout_secs: u64,

    /// Seconds between repeated notifications while far or lost
    pub alert_interval_secs: u64,

    /// Seconds between audible cues, independent of notifications
    pub audible_interval_secs: u64,

    /// Whether periodic alerts (notifications + audible) fire at all
    pub alerts_enabled: bool,

    /// Whether losing the signal raises the full-screen warning
    pub fullscreen_warning: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: String::new(),
            base_threshold_dbm: -90,
            hysteresis_db: 5,
            smoothing_alpha: DEFAULT_ALPHA,
            loss_timeout_secs: 8,
            alert_interval_secs: 5,
            audible_interval_secs: 15,
            alerts_enabled: true,
            fullscreen_warning: true,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration, falling back to defaults on any failure.
    ///
    /// A missing or corrupt config file is never fatal; the failure is
    /// logged and built-in defaults apply.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("could not load config, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-agent")
            .join("config.json")
    }

    /// Derived far/near threshold pair.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.base_threshold_dbm, self.hysteresis_db)
    }

    pub fn loss_timeout(&self) -> Duration {
        Duration::from_secs(self.loss_timeout_secs)
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_secs(self.alert_interval_secs)
    }

    pub fn audible_interval(&self) -> Duration {
        Duration::from_secs(self.audible_interval_secs)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
