//! # Dawn Station Configuration
//!
//! Persistent settings for the control station and the default values
//! shared with the binary.
//!
//! ## Features
//!
//! - **Runtime link**: robot address, UDP telemetry port, reconnect and probe timing
//! - **Code transfer**: SSH address and credentials for student code upload
//! - **Field**: field controller address and station number
//! - **Logging**: level and output format
//!
//! ## Usage
//!
//! ```rust
//! use config::StationConfig;
//!
//! // Partial files are completed with defaults
//! let config: StationConfig = toml::from_str("[runtime]\naddress = \"10.0.0.5\"").unwrap();
//! assert_eq!(config.runtime.address, "10.0.0.5");
//! assert_eq!(config.runtime.udp_port, config::defaults::runtime::UDP_PORT);
//! ```

pub mod defaults;
pub mod station_config;

pub use station_config::{
    ConfigError, FieldConfig, LoggingConfig, RuntimeConfig, StationConfig, TransferConfig,
};
