//! Packet value and header encoding

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{HEADER_LENGTH, MAX_PAYLOAD_LENGTH};
use crate::error::{ProtocolError, ProtocolResult};
use crate::msg_type::MsgType;

/// One framed unit on either transport: a type tag plus a byte payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw type value. Might not be an assigned [`MsgType`].
    pub packet_type: u8,
    /// Payload bytes, at most 65535 of them
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet, rejecting payloads the length field cannot describe
    pub fn new(packet_type: u8, payload: impl Into<Bytes>) -> ProtocolResult<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LENGTH {
            return Err(ProtocolError::payload_too_large(
                packet_type,
                payload.len(),
                MAX_PAYLOAD_LENGTH,
            ));
        }
        Ok(Self {
            packet_type,
            payload,
        })
    }

    /// Assigned message type, if the raw value is known
    pub fn msg_type(&self) -> Option<MsgType> {
        MsgType::from_wire(self.packet_type)
    }

    /// Bytes this packet occupies on a stream, header included
    pub fn wire_len(&self) -> usize {
        HEADER_LENGTH + self.payload.len()
    }

    /// Append header and payload to `buf`
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.reserve(self.wire_len());
        let mut header = [0u8; HEADER_LENGTH];
        header[0] = self.packet_type;
        // Length was bounds-checked in `new`
        LittleEndian::write_u16(&mut header[1..], self.payload.len() as u16);
        buf.put_slice(&header);
        buf.put_slice(&self.payload);
    }

    /// Header plus payload in one contiguous buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.write_to(&mut buf);
        buf.freeze()
    }
}
