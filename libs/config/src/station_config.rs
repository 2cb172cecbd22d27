//! Station Configuration Module
//!
//! Loads and saves the station's TOML configuration file. Every key has a
//! default, so a partial file (or one written by an older station) is
//! completed rather than rejected. Unknown keys are ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::defaults;

/// Configuration file failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main station configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    /// Realtime link to the robot runtime
    pub runtime: RuntimeConfig,

    /// Student code upload and download
    pub transfer: TransferConfig,

    /// Field controller connection
    pub field: FieldConfig,

    pub logging: LoggingConfig,
}

/// Robot runtime link settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `host[:port]` of the robot runtime
    pub address: String,
    pub udp_port: u16,
    pub reconnect_delay_ms: u64,
    pub probe_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_outbound_bytes: usize,
}

/// SSH settings for student code transfer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    pub ssh_address: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    pub ssh_password: String,
    pub remote_code_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldConfig {
    pub address: String,
    pub station_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            address: defaults::runtime::ADDRESS.to_string(),
            udp_port: defaults::runtime::UDP_PORT,
            reconnect_delay_ms: defaults::runtime::RECONNECT_DELAY_MS,
            probe_interval_ms: defaults::runtime::PROBE_INTERVAL_MS,
            connect_timeout_ms: defaults::runtime::CONNECT_TIMEOUT_MS,
            max_outbound_bytes: defaults::runtime::MAX_OUTBOUND_BYTES,
        }
    }
}

impl RuntimeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            ssh_address: defaults::transfer::SSH_ADDRESS.to_string(),
            ssh_port: defaults::transfer::SSH_PORT,
            ssh_user: defaults::transfer::SSH_USER.to_string(),
            ssh_password: defaults::transfer::SSH_PASSWORD.to_string(),
            remote_code_path: defaults::transfer::REMOTE_CODE_PATH.to_string(),
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            address: defaults::field::ADDRESS.to_string(),
            station_number: defaults::field::STATION_NUMBER,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

impl StationConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded station config");
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write configuration as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Saved station config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_partial_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("dawn.toml");

        let config_content = r#"
[runtime]
address = "10.0.0.7:8200"
reconnect_delay_ms = 500

[field]
station_number = 2

[logging]
level = "debug"
unknown_key = "ignored"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = StationConfig::load(&config_path).unwrap();

        assert_eq!(config.runtime.address, "10.0.0.7:8200");
        assert_eq!(config.runtime.reconnect_delay(), Duration::from_millis(500));
        assert_eq!(config.runtime.udp_port, defaults::runtime::UDP_PORT);
        assert_eq!(config.runtime.probe_interval(), Duration::from_secs(5));
        assert_eq!(config.field.station_number, 2);
        assert_eq!(config.field.address, "localhost");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
        assert_eq!(config.transfer, TransferConfig::default());
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: StationConfig = toml::from_str("").unwrap();
        assert_eq!(config, StationConfig::default());
        assert_eq!(config.runtime.address, "192.168.0.100");
        assert_eq!(config.runtime.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            StationConfig::load(&path),
            Err(ConfigError::Read { .. })
        ));
        assert_eq!(
            StationConfig::load_or_default(&path).unwrap(),
            StationConfig::default()
        );
    }

    #[test]
    fn test_invalid_toml_is_not_masked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[runtime\naddress = ").unwrap();

        let err = StationConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typed.toml");
        fs::write(&path, "[runtime]\nudp_port = \"nine thousand\"\n").unwrap();

        assert!(matches!(
            StationConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dawn.toml");

        let mut config = StationConfig::default();
        config.runtime.address = "192.168.1.42".to_string();
        config.transfer.ssh_user = "student".to_string();
        config.logging.json = true;

        config.save(&path).unwrap();
        let loaded = StationConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[runtime]"));
        assert!(text.contains("192.168.1.42"));
    }
}
