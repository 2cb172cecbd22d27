//! # Dawn Network - Runtime Link
//!
//! ## Purpose
//!
//! The realtime link between the control station and the robot runtime:
//! one reconnecting TCP stream for commands, logs and latency probes, and one
//! UDP socket for device telemetry, multiplexed into a single session.
//!
//! ## Modules
//!
//! - [`transports`]: socket ownership, TCP framing, UDP datagrams
//! - [`controller`]: session state machine, reconnect and probe timers,
//!   dispatch to a [`RuntimeListener`]
//! - [`address`]: operator-entered target parsing
//! - [`transfer`]: code upload/download contract
//!
//! ## Example
//!
//! ```no_run
//! use network::{ConnectionController, ControllerConfig, RuntimeListener};
//! # use network::TransportError;
//! # use codec::{DeviceSnapshot, ProtocolError};
//! # use std::time::Duration;
//! # struct Quiet;
//! # impl RuntimeListener for Quiet {
//! #     fn on_receive_robot_logs(&mut self, _: Vec<String>) {}
//! #     fn on_receive_latency(&mut self, _: Duration) {}
//! #     fn on_receive_devices(&mut self, _: DeviceSnapshot) {}
//! #     fn on_tcp_error(&mut self, _: &TransportError) {}
//! #     fn on_udp_error(&mut self, _: &TransportError) {}
//! #     fn on_protocol_error(&mut self, _: &ProtocolError) {}
//! #     fn on_disconnect(&mut self) {}
//! # }
//! # async fn example() -> network::Result<()> {
//! let (controller, handle) = ConnectionController::new(ControllerConfig::default(), Quiet);
//! tokio::spawn(controller.run());
//! handle.set_target("192.168.0.100")?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod controller;
pub mod error;
pub mod time;
pub mod transfer;
pub mod transports;

pub use address::parse_runtime_address;
pub use controller::{
    ConnectionController, ConnectionHandle, ConnectionState, ControllerConfig, RuntimeListener,
};
pub use error::{Result, TransferError, TransportError};
pub use time::{latency_from_echo, system_timestamp_ms};
pub use transfer::{CodeTransfer, TransferTarget};
pub use transports::{TransportEvent, TransportManager};
