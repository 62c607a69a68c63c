//! Configuration management for Pockit
//!
//! Layered the usual way: built-in defaults, then an optional TOML file, then
//! `POCKIT_<SECTION>_<KEY>` environment overrides. Every loader validates
//! before handing the config out.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

pub const ENV_SHIELD_COOLDOWN_SECS: &str = "POCKIT_SHIELD_COOLDOWN_SECS";
pub const ENV_SHIELD_TICK_INTERVAL_MS: &str = "POCKIT_SHIELD_TICK_INTERVAL_MS";
pub const ENV_SHIELD_QUOTE_INTERVAL_MS: &str = "POCKIT_SHIELD_QUOTE_INTERVAL_MS";
pub const ENV_SHIELD_LOCKED_AMOUNT_CENTS: &str = "POCKIT_SHIELD_LOCKED_AMOUNT_CENTS";
pub const ENV_STORE_DATA_DIR: &str = "POCKIT_STORE_DATA_DIR";
pub const ENV_STORE_PERSIST: &str = "POCKIT_STORE_PERSIST";
pub const ENV_LOGGING_LEVEL: &str = "POCKIT_LOGGING_LEVEL";
pub const ENV_LOGGING_JSON_FORMAT: &str = "POCKIT_LOGGING_JSON_FORMAT";
pub const ENV_METRICS_ENABLED: &str = "POCKIT_METRICS_ENABLED";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Impulse Shield configuration
    pub shield: ShieldConfig,

    /// Persistence configuration
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Impulse Shield configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Cooling-off period re-applied on every lock
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,

    /// Period between countdown ticks
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Period between motivational quote rotations
    #[serde(with = "humantime_serde")]
    pub quote_interval: Duration,

    /// Amount under protection, in cents
    pub locked_amount_cents: u64,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding persisted records
    pub data_dir: PathBuf,

    /// Persist shield state between sessions
    pub persist: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register metric descriptions at startup
    pub enabled: bool,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(48 * 60 * 60),
            tick_interval: Duration::from_secs(1),
            quote_interval: Duration::from_secs(10),
            locked_amount_cents: 50_000,
        }
    }
}

impl ShieldConfig {
    /// Cooldown as whole seconds
    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown.as_secs()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            persist: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: POCKIT_<SECTION>_<KEY>
    /// Example: POCKIT_SHIELD_COOLDOWN_SECS=3600
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise defaults, then apply environment
    /// overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `POCKIT_*` overrides resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secs) = lookup(ENV_SHIELD_COOLDOWN_SECS) {
            self.shield.cooldown =
                Duration::from_secs(parse_value(ENV_SHIELD_COOLDOWN_SECS, &secs)?);
        }
        if let Some(ms) = lookup(ENV_SHIELD_TICK_INTERVAL_MS) {
            self.shield.tick_interval =
                Duration::from_millis(parse_value(ENV_SHIELD_TICK_INTERVAL_MS, &ms)?);
        }
        if let Some(ms) = lookup(ENV_SHIELD_QUOTE_INTERVAL_MS) {
            self.shield.quote_interval =
                Duration::from_millis(parse_value(ENV_SHIELD_QUOTE_INTERVAL_MS, &ms)?);
        }
        if let Some(cents) = lookup(ENV_SHIELD_LOCKED_AMOUNT_CENTS) {
            self.shield.locked_amount_cents = parse_value(ENV_SHIELD_LOCKED_AMOUNT_CENTS, &cents)?;
        }

        if let Some(data_dir) = lookup(ENV_STORE_DATA_DIR) {
            self.store.data_dir = PathBuf::from(data_dir);
        }
        if let Some(persist) = lookup(ENV_STORE_PERSIST) {
            self.store.persist = parse_value(ENV_STORE_PERSIST, &persist)?;
        }

        if let Some(level) = lookup(ENV_LOGGING_LEVEL) {
            self.logging.level = level.trim().to_lowercase();
        }
        if let Some(json) = lookup(ENV_LOGGING_JSON_FORMAT) {
            self.logging.json_format = parse_value(ENV_LOGGING_JSON_FORMAT, &json)?;
        }

        if let Some(enabled) = lookup(ENV_METRICS_ENABLED) {
            self.metrics.enabled = parse_value(ENV_METRICS_ENABLED, &enabled)?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shield.cooldown.as_secs() == 0 {
            return Err(ConfigError::Invalid(
                "cooldown must be at least one second".to_string(),
            ));
        }
        if self.shield.cooldown.subsec_nanos() != 0 {
            return Err(ConfigError::Invalid(
                "cooldown must be a whole number of seconds".to_string(),
            ));
        }
        if self.shield.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be greater than 0".to_string(),
            ));
        }
        if self.shield.quote_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "quote_interval must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;

        std::fs::write(path, contents).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidOverride {
            key,
            reason: e.to_string(),
        })
}
