//! Host configuration
//!
//! Loads `reactor.toml` from disk. Falls back to the embedded default when
//! the file does not exist.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reactor_protocol::UnitId;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Embedded default configuration (compiled into the binary)
pub const EMBEDDED_CONFIG: &str = include_str!("../../reactor.toml");

/// Port name that selects the simulated thermostat
pub const SIM_PORT: &str = "sim";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File exists but could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// TOML syntax or schema error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Value parsed but cannot be used
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Unit selection as written in the config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Unit {
    A,
    B,
}

impl From<Unit> for UnitId {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::A => UnitId::A,
            Unit::B => UnitId::B,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, or "sim"
    pub port: String,
    pub baudrate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: SIM_PORT.to_string(),
            baudrate: 9600,
        }
    }
}

impl SerialConfig {
    pub fn is_simulated(&self) -> bool {
        self.port.eq_ignore_ascii_case(SIM_PORT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub unit: Unit,
    /// Recipe settings file
    pub settings: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            unit: Unit::A,
            settings: PathBuf::from("recipe.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub serial: SerialConfig,
    pub session: SessionConfig,
    pub log: LogConfig,
}

impl HostConfig {
    /// Parse and validate a TOML document
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the embedded default if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                info!(path = %path.display(), "Loaded configuration");
                Self::parse(&text)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No configuration file, using embedded defaults");
                Self::parse(EMBEDDED_CONFIG)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::Invalid("serial.port is empty"));
        }
        if self.serial.baudrate == 0 {
            return Err(ConfigError::Invalid("serial.baudrate must be positive"));
        }
        if self.session.settings.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("session.settings is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_parses() {
        let config = HostConfig::parse(EMBEDDED_CONFIG).unwrap();
        assert!(config.serial.is_simulated());
        assert_eq!(config.session.unit, Unit::A);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = HostConfig::parse(
            r#"
            [serial]
            port = "/dev/ttyUSB0"

            [session]
            unit = "B"
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baudrate, 9600);
        assert!(!config.serial.is_simulated());
        assert_eq!(UnitId::from(config.session.unit), UnitId::B);
        assert_eq!(config.session.settings, PathBuf::from("recipe.toml"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            HostConfig::parse("[serial]\nbaudrate = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            HostConfig::parse("[session]\nunit = \"C\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            HostConfig::parse("[serial"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HostConfig::parse(EMBEDDED_CONFIG).unwrap());
    }
}
