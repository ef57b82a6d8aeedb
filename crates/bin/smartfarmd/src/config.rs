//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `smartfarm.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use smartfarm_adapter_simulator::SimulatorConfig;
use smartfarm_app::fabric::FabricSettings;
use smartfarm_domain::topic::TopicScheme;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Topic router settings.
    pub router: RouterConfig,
    /// Command history settings.
    pub history: HistoryConfig,
    /// Telemetry scheduler settings.
    pub telemetry: TelemetryConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated installation.
    pub simulator: SimulatorConfig,
}

/// Topic router configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of published messages kept for inspection.
    pub log_capacity: usize,
}

/// Command history configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of command records kept before the oldest are evicted.
    pub capacity: usize,
}

/// Telemetry scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Publish period in milliseconds.
    pub interval_ms: u64,
    /// Topic scheme readings are published under.
    pub scheme: TopicScheme,
    /// Start the scheduler at boot.
    pub enabled: bool,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `smartfarm.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("smartfarm.toml")?;
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
        if let Ok(val) = std::env::var("SMARTFARM_TELEMETRY_INTERVAL_MS")
            && let Ok(interval_ms) = val.parse()
        {
            self.telemetry.interval_ms = interval_ms;
        }
        if let Ok(val) = std::env::var("SMARTFARM_SEED")
            && let Ok(seed) = val.parse()
        {
            self.simulator.seed = Some(seed);
        }
        if let Ok(val) = std::env::var("SMARTFARM_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "telemetry interval must be non-zero".to_string(),
            ));
        }
        if self.router.log_capacity == 0 {
            return Err(ConfigError::Validation(
                "router log capacity must be non-zero".to_string(),
            ));
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::Validation(
                "history capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Sizing and timing for the fabric.
    #[must_use]
    pub fn fabric_settings(&self) -> FabricSettings {
        FabricSettings {
            log_capacity: self.router.log_capacity,
            history_capacity: self.history.capacity,
            telemetry_interval: Duration::from_millis(self.telemetry.interval_ms),
            telemetry_scheme: self.telemetry.scheme,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { log_capacity: 1000 }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            scheme: TopicScheme::Legacy,
            enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "smartfarmd=info,smartfarm=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
