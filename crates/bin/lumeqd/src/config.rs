//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `lumeq.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values. The button mapping is part of this file and
//! is loaded once into an immutable table — no runtime mutation.

use std::time::Duration;

use serde::Deserialize;

use lumeq_adapter_govee::GoveeConfig;
use lumeq_adapter_hue::HueConfig;
use lumeq_app::services::{ProcessorConfig, ResolverConfig};
use lumeq_domain::command::AbstractCommand;
use lumeq_domain::id::{DeviceId, GroupId};
use lumeq_domain::mapping::{ButtonMap, ButtonTarget};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Per-brand polling worker settings.
    pub processor: ProcessorSettings,
    /// Button resolver settings.
    pub resolver: ResolverSettings,
    /// Hue bridge connection; the Hue worker starts only when present.
    pub hue: Option<HueConfig>,
    /// Govee cloud connection; the Govee worker starts only when present.
    pub govee: Option<GoveeConfig>,
    /// Button bindings, `(remote, button)` → device or group command.
    pub buttons: Vec<ButtonBinding>,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:lumeq.db?mode=rwc".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Polling worker settings (one worker per configured brand).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProcessorSettings {
    /// Maximum records claimed per cycle.
    pub batch_size: u32,
    /// Pause between cycles, in milliseconds.
    pub poll_interval_ms: u64,
    /// Backoff after a cycle-level error, in seconds.
    pub error_backoff_secs: u64,
    /// Staleness window after which an abandoned claim is reclaimed, in
    /// seconds.
    pub stale_after_secs: i64,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval_ms: 100,
            error_backoff_secs: 5,
            stale_after_secs: 300,
        }
    }
}

impl ProcessorSettings {
    /// Convert into the app-layer worker config.
    #[must_use]
    pub fn to_processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            batch_size: self.batch_size,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
        }
    }
}

/// Button resolver settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Maximum events fetched per cycle.
    pub fetch_limit: u32,
    /// Pause between cycles, in milliseconds.
    pub poll_interval_ms: u64,
    /// Backoff after a cycle-level error, in seconds.
    pub error_backoff_secs: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            fetch_limit: 16,
            poll_interval_ms: 250,
            error_backoff_secs: 5,
        }
    }
}

impl ResolverSettings {
    /// Convert into the app-layer resolver config.
    #[must_use]
    pub fn to_resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            fetch_limit: self.fetch_limit,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
        }
    }
}

/// One `[[buttons]]` entry: a press bound to a device or group command.
#[derive(Debug, Deserialize)]
pub struct ButtonBinding {
    /// Remote name as reported by the listener.
    pub remote: String,
    /// Button number on that remote.
    pub button: u8,
    /// Target device id (mutually exclusive with `group`).
    pub device: Option<String>,
    /// Target group id (mutually exclusive with `device`).
    pub group: Option<i64>,
    /// Abstract command or toggle template, e.g. `{ name = "toggle", value = 50 }`.
    pub command: AbstractCommand,
}

impl Config {
    /// Load configuration from `lumeq.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// button binding is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("lumeq.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LUMEQ_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("LUMEQ_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.processor.batch_size == 0 {
            return Err(ConfigError::Validation(
                "processor.batch_size must be non-zero".to_string(),
            ));
        }
        for binding in &self.buttons {
            if binding.device.is_some() == binding.group.is_some() {
                return Err(ConfigError::Validation(format!(
                    "button ({}, {}) must target exactly one device or group",
                    binding.remote, binding.button
                )));
            }
            if binding.command.validate().is_err() {
                return Err(ConfigError::Validation(format!(
                    "button ({}, {}) carries an out-of-range command value",
                    binding.remote, binding.button
                )));
            }
        }
        Ok(())
    }

    /// Build the immutable button map out of the `[[buttons]]` entries.
    #[must_use]
    pub fn button_map(&self) -> ButtonMap {
        ButtonMap::from_entries(self.buttons.iter().map(|binding| {
            let target = match (&binding.device, binding.group) {
                (Some(device), None) => ButtonTarget::Device {
                    device: DeviceId::from(device.as_str()),
                    command: binding.command,
                },
                // validate() already rejected every other combination.
                _ => ButtonTarget::Group {
                    group: GroupId::new(binding.group.unwrap_or_default()),
                    command: binding.command,
                },
            };
            (binding.remote.clone(), binding.button, target)
        }))
    }
}

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid TOML.
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range or a binding is inconsistent.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
