//! Configuration management for mx4j-collector
//!
//! Handles loading and validating configuration from YAML files. The
//! collector only reads this configuration; the polling interval is consumed
//! by the host scheduler that drives the collection cycle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Management endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Polling interval in seconds (consumed by the host scheduler)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Metric-name prefix overrides, keyed by bean query pattern.
    ///
    /// An entry replaces the derived prefix for every bean matched by that
    /// pattern in the query plan.
    #[serde(default)]
    pub prefix_overrides: HashMap<String, String>,
}

/// Management endpoint configuration
///
/// Identifies the MX4J HTTP adaptor of the target JVM process. Read-only for
/// the lifetime of a collector instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Target host
    #[serde(default = "default_host")]
    pub host: String,

    /// Target port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base path prepended to every request path (empty or "/..")
    #[serde(default)]
    pub base_path: String,

    /// Optional username for basic auth
    pub username: Option<String>,

    /// Optional password for basic auth
    pub password: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_timeout() -> u64 {
    5000
}

fn default_interval() -> u64 {
    30
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: String::new(),
            username: None,
            password: None,
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            interval_secs: default_interval(),
            prefix_overrides: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    ///
    /// # Note
    /// - If the file doesn't exist, returns `ConfigError::ReadError`
    /// - Use `Config::load_or_default()` if you want fallback to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    ///
    /// Use this for optional configuration files (e.g., when running without explicit config)
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Polling interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.port == 0 {
            return Err(ConfigError::ValidationError(
                "Endpoint port must be greater than 0".to_string(),
            ));
        }

        if self.endpoint.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "Endpoint host must not be empty".to_string(),
            ));
        }

        if !self.endpoint.base_path.is_empty() && !self.endpoint.base_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "Endpoint base path must start with '/'".to_string(),
            ));
        }

        if self.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Polling interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
