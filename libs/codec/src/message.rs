//! # Protocol Codec - Message Encoding and Decoding
//!
//! Bidirectional mapping between [`Message`] values and [`Packet`]s. Every
//! message type is one variant of a closed enum, so encoding and decoding are
//! exhaustive matches: adding a type to the protocol is a compile-checked
//! change in exactly this file.
//!
//! ## Direction Rules
//!
//! - **Encode**: all types except `Log` (logs only flow robot → station)
//! - **Decode**: all assigned types; unassigned type values fail with
//!   [`ProtocolError::UnknownMessageType`] carrying the raw packet
//! - **UDP**: a datagram is a bare device-data body with no header

use bytes::{Bytes, BytesMut};
use prost::Message as ProstMessage;

use crate::error::{ProtocolError, ProtocolResult};
use crate::msg_type::MsgType;
use crate::packet::Packet;
use crate::proto::{
    DevData, Input, Mode, Pos, RunMode, StartPos, Text, TimeStamps, UserInputs,
};

/// A decoded or to-be-encoded payload, tagged by message type
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    RunMode(RunMode),
    StartPos(StartPos),
    Log(Text),
    DeviceData(DevData),
    Inputs(UserInputs),
    TimeStamps(TimeStamps),
}

impl Message {
    pub fn run_mode(mode: Mode) -> Self {
        Message::RunMode(RunMode::new(mode))
    }

    pub fn start_pos(pos: Pos) -> Self {
        Message::StartPos(StartPos::new(pos))
    }

    pub fn inputs(inputs: Vec<Input>) -> Self {
        Message::Inputs(UserInputs { inputs })
    }

    /// Timestamp echo request stamped with the station send time
    pub fn latency_probe(sent_at_ms: u64) -> Self {
        Message::TimeStamps(TimeStamps {
            dawn_timestamp: sent_at_ms,
            runtime_timestamp: 0,
        })
    }

    /// Wire type of this message
    pub fn msg_type(&self) -> MsgType {
        match self {
            Message::RunMode(_) => MsgType::RunMode,
            Message::StartPos(_) => MsgType::StartPos,
            Message::Log(_) => MsgType::Log,
            Message::DeviceData(_) => MsgType::DeviceData,
            Message::Inputs(_) => MsgType::Inputs,
            Message::TimeStamps(_) => MsgType::TimeStamps,
        }
    }
}

/// Encode a message into a packet
///
/// Fails for receive-only types and for payloads over 65535 bytes; never
/// produces a malformed packet.
pub fn encode(message: &Message) -> ProtocolResult<Packet> {
    let msg_type = message.msg_type();
    if !msg_type.is_encodable() {
        return Err(ProtocolError::UnsupportedEncode { msg_type });
    }
    let payload = match message {
        Message::RunMode(m) => m.encode_to_vec(),
        Message::StartPos(m) => m.encode_to_vec(),
        Message::Log(m) => m.encode_to_vec(),
        Message::DeviceData(m) => m.encode_to_vec(),
        Message::Inputs(m) => m.encode_to_vec(),
        Message::TimeStamps(m) => m.encode_to_vec(),
    };
    Packet::new(msg_type.as_u8(), payload)
}

/// Encode a message with its header, ready for a stream write
pub fn encode_frame(message: &Message) -> ProtocolResult<Bytes> {
    let packet = encode(message)?;
    let mut buf = BytesMut::with_capacity(packet.wire_len());
    packet.write_to(&mut buf);
    Ok(buf.freeze())
}

/// Decode a packet by its type tag
pub fn decode(packet: &Packet) -> ProtocolResult<Message> {
    let msg_type = packet.msg_type().ok_or_else(|| {
        ProtocolError::unknown_message_type(packet.packet_type, packet.payload.clone())
    })?;
    decode_payload(msg_type, &packet.payload)
}

/// Decode a payload whose type is already known
pub fn decode_payload(msg_type: MsgType, payload: &[u8]) -> ProtocolResult<Message> {
    let malformed = |e| ProtocolError::malformed(msg_type, payload.len(), e);
    let message = match msg_type {
        MsgType::RunMode => Message::RunMode(RunMode::decode(payload).map_err(malformed)?),
        MsgType::StartPos => Message::StartPos(StartPos::decode(payload).map_err(malformed)?),
        MsgType::Log => Message::Log(Text::decode(payload).map_err(malformed)?),
        MsgType::DeviceData => Message::DeviceData(DevData::decode(payload).map_err(malformed)?),
        MsgType::Inputs => Message::Inputs(UserInputs::decode(payload).map_err(malformed)?),
        MsgType::TimeStamps => {
            Message::TimeStamps(TimeStamps::decode(payload).map_err(malformed)?)
        }
    };
    Ok(message)
}

/// Decode a UDP datagram, which is always a bare device-data body
pub fn decode_device_datagram(datagram: &[u8]) -> ProtocolResult<DevData> {
    DevData::decode(datagram)
        .map_err(|e| ProtocolError::malformed(MsgType::DeviceData, datagram.len(), e))
}
