//! # Dawn Runtime Codec - Wire Protocol Rules
//!
//! ## Purpose
//!
//! The "Rules" layer of the station/runtime link. Everything here is pure and
//! synchronous: no sockets, no timers, no tasks.
//!
//! - Length-prefixed packet framing over arbitrarily chunked streams
//! - Message type registry (closed enum, one reserved value)
//! - Protobuf payload schemas and per-type encode/decode
//! - Device telemetry projection for display
//!
//! ## Architecture Role
//!
//! ```text
//! [codec] → network/ → services/station
//!    ↓          ↓             ↓
//! Packets   Sockets,      Operator console
//! Schemas   Controller    and logging
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket management or reconnection (belongs in network/)
//! - Configuration loading (belongs in config/)
//!
//! ## Example
//!
//! ```
//! use codec::{decode, encode_frame, Message, PacketFramer};
//! use codec::proto::Mode;
//!
//! let frame = encode_frame(&Message::run_mode(Mode::Teleop)).unwrap();
//! let mut framer = PacketFramer::new();
//! let packets = framer.feed_collect(&frame);
//! assert_eq!(decode(&packets[0]).unwrap(), Message::run_mode(Mode::Teleop));
//! ```

pub mod constants;
pub mod device;
pub mod error;
pub mod framer;
pub mod message;
pub mod msg_type;
pub mod packet;
pub mod proto;

pub use constants::*;
pub use device::{device_type_name, DeviceRecord, DeviceSnapshot};
pub use error::{ProtocolError, ProtocolResult};
pub use framer::PacketFramer;
pub use message::{decode, decode_device_datagram, decode_payload, encode, encode_frame, Message};
pub use msg_type::MsgType;
pub use packet::Packet;
