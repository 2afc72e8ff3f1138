//! # Configuration Management
//!
//! Wire constants and runtime configuration for the codec.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Limits
//! - Remaining Length is bounded by the 4-byte varint (268,435,455)
//! - `max_packet_size` lets a deployment reject large frames before buffering them

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Protocol level written by a freshly constructed CONNECT (MQTT 3.1.1)
pub const PROTOCOL_VERSION: u8 = 4;

/// Supported protocol levels and the protocol name each one requires
pub const SUPPORTED_VERSIONS: [(u8, &str); 2] = [(3, "MQIsdp"), (4, "MQTT")];

/// Largest value a Remaining Length varint can carry
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// Remaining Length occupies at most this many bytes on the wire
pub const MAX_VARINT_BYTES: usize = 4;

/// Largest possible frame: type byte + 4 varint bytes + body
pub const MAX_PACKET_SIZE: usize = 1 + MAX_VARINT_BYTES + MAX_REMAINING_LENGTH;

/// Look up the protocol name for a protocol level.
pub fn protocol_name(version: u8) -> Option<&'static str> {
    SUPPORTED_VERSIONS
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, name)| *name)
}

/// Top-level codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Largest frame (header + body) accepted by decoders
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_packet_size() -> usize {
    MAX_PACKET_SIZE
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("MQTT_CODEC_MAX_PACKET_SIZE") {
            config.max_packet_size = size.parse::<usize>().map_err(|e| {
                CodecError::ConfigError(format!("Invalid MQTT_CODEC_MAX_PACKET_SIZE: {e}"))
            })?;
        }

        if let Ok(level) = std::env::var("MQTT_CODEC_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                CodecError::ConfigError(format!("Invalid MQTT_CODEC_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // Smallest legal frame is a type byte plus a one-byte zero length
        if self.max_packet_size < 2 {
            errors.push(format!(
                "Max packet size too small: {} (minimum: 2 bytes)",
                self.max_packet_size
            ));
        } else if self.max_packet_size > MAX_PACKET_SIZE {
            errors.push(format!(
                "Max packet size too large: {} (protocol maximum: {MAX_PACKET_SIZE})",
                self.max_packet_size
            ));
        }

        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to include event targets in log lines
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("mqtt-codec"),
            log_level: Level::INFO,
            log_to_console: true,
            show_target: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
