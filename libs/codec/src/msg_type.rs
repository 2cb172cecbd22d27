//! # Message Type Registry
//!
//! Closed set of packet types understood by the station. Wire values are
//! fixed; unknown values are still legal at the framing layer and are only
//! rejected when a packet is decoded.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Packet type tag carried in the first header byte
///
/// Value `4` belongs to the field controller protocol and is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MsgType {
    /// Run mode command (idle, auto, teleop, ...)
    RunMode = 0,
    /// Robot starting position command
    StartPos = 1,
    /// Batch of robot log lines
    Log = 2,
    /// Device telemetry snapshot, or device preferences when sent by the station
    DeviceData = 3,
    /// Control input vector (gamepads, keyboard)
    Inputs = 5,
    /// Timestamp echo used for latency probing
    TimeStamps = 6,
}

impl MsgType {
    /// Every assigned message type, in wire-value order
    pub const ALL: [MsgType; 6] = [
        MsgType::RunMode,
        MsgType::StartPos,
        MsgType::Log,
        MsgType::DeviceData,
        MsgType::Inputs,
        MsgType::TimeStamps,
    ];

    /// Look up a raw wire value
    pub fn from_wire(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Wire value of this type
    pub fn as_u8(self) -> u8 {
        self.into()
    }

    /// Human readable name for logs and error messages
    pub fn name(self) -> &'static str {
        match self {
            MsgType::RunMode => "run-mode",
            MsgType::StartPos => "start-position",
            MsgType::Log => "log",
            MsgType::DeviceData => "device-data",
            MsgType::Inputs => "control-inputs",
            MsgType::TimeStamps => "timestamp-echo",
        }
    }

    /// Whether the station ever produces this type.
    ///
    /// Logs only flow from the runtime to the station.
    pub fn is_encodable(self) -> bool {
        !matches!(self, MsgType::Log)
    }

    /// Whether an inbound packet of this type is routed to a listener callback
    pub fn is_dispatched(self) -> bool {
        matches!(
            self,
            MsgType::Log | MsgType::DeviceData | MsgType::TimeStamps
        )
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}
