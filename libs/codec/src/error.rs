//! Protocol-level errors for packet encoding and decoding
//!
//! Every variant is non-fatal for a session: the controller reports it and
//! keeps the connection open. Each variant carries enough context (raw type
//! value, payload size, schema failure) to diagnose a misbehaving runtime.

use bytes::Bytes;
use thiserror::Error;

use crate::msg_type::MsgType;

/// Encoding and decoding failures with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Packet type value is not assigned in this protocol version
    #[error("Unknown message type {packet_type} ({} byte payload): assigned types are 0-3, 5, 6", payload.len())]
    UnknownMessageType { packet_type: u8, payload: Bytes },

    /// Message type exists but the station never sends it
    #[error("Cannot create packet with type {msg_type}: type is receive-only")]
    UnsupportedEncode { msg_type: MsgType },

    /// Payload does not match the schema registered for its type
    #[error("Malformed {msg_type} payload ({payload_len} bytes): {source}")]
    Malformed {
        msg_type: MsgType,
        payload_len: usize,
        #[source]
        source: prost::DecodeError,
    },

    /// Well-formed packet of a type the station only sends
    #[error("Unexpected inbound {msg_type} packet: type is send-only")]
    Unexpected { msg_type: MsgType },

    /// Encoded payload does not fit in the 16-bit length field
    #[error("Payload too large for {msg_type}: {size} bytes exceeds limit {limit}")]
    PayloadTooLarge {
        msg_type: u8,
        size: usize,
        limit: usize,
    },
}

/// Result type alias for codec operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

impl ProtocolError {
    /// Create an unknown type error, keeping the raw payload for diagnostics
    pub fn unknown_message_type(packet_type: u8, payload: Bytes) -> Self {
        Self::UnknownMessageType {
            packet_type,
            payload,
        }
    }

    /// Create a malformed payload error
    pub fn malformed(msg_type: MsgType, payload_len: usize, source: prost::DecodeError) -> Self {
        Self::Malformed {
            msg_type,
            payload_len,
            source,
        }
    }

    /// Create a payload size error
    pub fn payload_too_large(msg_type: u8, size: usize, limit: usize) -> Self {
        Self::PayloadTooLarge {
            msg_type,
            size,
            limit,
        }
    }

    /// Raw packet type the error refers to
    pub fn packet_type(&self) -> u8 {
        match self {
            ProtocolError::UnknownMessageType { packet_type, .. } => *packet_type,
            ProtocolError::UnsupportedEncode { msg_type } => msg_type.as_u8(),
            ProtocolError::Malformed { msg_type, .. } => msg_type.as_u8(),
            ProtocolError::Unexpected { msg_type } => msg_type.as_u8(),
            ProtocolError::PayloadTooLarge { msg_type, .. } => *msg_type,
        }
    }

    /// Get error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ProtocolError::UnknownMessageType { .. } => "unknown_type",
            ProtocolError::UnsupportedEncode { .. } => "unsupported_encode",
            ProtocolError::Malformed { .. } => "malformed",
            ProtocolError::Unexpected { .. } => "unexpected",
            ProtocolError::PayloadTooLarge { .. } => "payload_too_large",
        }
    }
}
