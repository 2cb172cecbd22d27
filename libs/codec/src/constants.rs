//! # Protocol Constants
//!
//! Values fixed by the runtime wire protocol. These must stay stable for
//! compatibility with every deployed robot runtime.
//!
//! ```text
//! ┌──────────────┬───────────────────────────┬─────────────────────┐
//! │ Type (1 byte)│ Length (2 bytes, LE u16)  │ Payload (Length)    │
//! └──────────────┴───────────────────────────┴─────────────────────┘
//! ```

/// Packet header size: 1 byte type + 2 byte little-endian payload length
pub const HEADER_LENGTH: usize = 3;

/// Largest payload a packet header can describe
pub const MAX_PAYLOAD_LENGTH: usize = u16::MAX as usize;

/// TCP port the runtime listens on when the target address omits one
pub const DEFAULT_RUNTIME_PORT: u16 = 8101;

/// Local UDP port device telemetry datagrams are delivered to
pub const UDP_BIND_PORT: u16 = 9001;

/// Identification byte sent right after TCP connect.
///
/// Tells the runtime this peer is the control station and not the field
/// controller, which shares the same listening socket.
pub const CLIENT_IDENTITY_BYTE: u8 = 1;

/// Packet type value owned by the field controller protocol
pub const RESERVED_MSG_TYPE: u8 = 4;
