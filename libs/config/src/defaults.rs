//! Default configuration values
//!
//! Values used when a key is missing from the station configuration file.

/// Robot runtime link defaults
pub mod runtime {
    /// Robot address on the field network
    pub const ADDRESS: &str = "192.168.0.100";

    /// Local port for device telemetry datagrams
    pub const UDP_PORT: u16 = 9001;

    /// Delay before reconnecting after the link drops (milliseconds)
    pub const RECONNECT_DELAY_MS: u64 = 2_000;

    /// Latency probe period while connected (milliseconds)
    pub const PROBE_INTERVAL_MS: u64 = 5_000;

    /// Connect attempt timeout (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 5_000;

    /// Unread outbound bytes tolerated before the link is dropped
    pub const MAX_OUTBOUND_BYTES: usize = 1024 * 1024;
}

/// Student code transfer defaults
pub mod transfer {
    pub const SSH_ADDRESS: &str = "192.168.0.100";
    pub const SSH_PORT: u16 = 22;
    pub const SSH_USER: &str = "pi";
    pub const SSH_PASSWORD: &str = "raspberry";
    pub const REMOTE_CODE_PATH: &str = "/home/pi/runtime/executor/studentcode.py";
}

/// Field controller defaults
pub mod field {
    pub const ADDRESS: &str = "localhost";
    pub const STATION_NUMBER: u32 = 4;
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}
