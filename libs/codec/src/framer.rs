//! # Packet Framer - Stream to Packet Conversion
//!
//! ## Purpose
//!
//! Turns an arbitrarily chunked byte stream (a TCP socket) into discrete
//! [`Packet`]s. The framer is transport-agnostic and never fails: every type
//! value and every length up to 65535 is structurally valid here, semantic
//! rejection happens in the codec.
//!
//! ## Buffer Discipline
//!
//! - One contiguous `BytesMut` holds only bytes not yet delivered
//! - A header is decoded exactly once per packet and cached until its body
//!   completes, so header bytes split across chunks are never re-parsed
//! - Payloads are split off the buffer (`split_to`) and handed out without
//!   copying; consumed bytes are never seen again
//!
//! A framer cannot be reset mid-stream. Reconnecting builds a fresh one.

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::constants::HEADER_LENGTH;
use crate::packet::Packet;

/// Initial buffer capacity, enough for a typical device snapshot
const INITIAL_CAPACITY: usize = 4 * 1024;

/// Header of a packet whose body has not fully arrived yet
#[derive(Debug, Clone, Copy)]
struct PendingHeader {
    packet_type: u8,
    length: usize,
}

/// Incremental length-prefixed packet parser
#[derive(Debug)]
pub struct PacketFramer {
    buf: BytesMut,
    pending: Option<PendingHeader>,
    packets_emitted: u64,
}

impl Default for PacketFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketFramer {
    /// Create a framer with empty state
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
            pending: None,
            packets_emitted: 0,
        }
    }

    /// Buffer a chunk and push every packet it completes to `sink`.
    ///
    /// Accepts any raw byte or string chunk; text is taken as its UTF-8
    /// bytes. Returns how many packets were produced by this call, which may
    /// include a packet whose header arrived in an earlier call.
    pub fn feed<F>(&mut self, chunk: impl AsRef<[u8]>, mut sink: F) -> usize
    where
        F: FnMut(Packet),
    {
        let chunk = chunk.as_ref();
        self.buf.extend_from_slice(chunk);

        let mut produced = 0;
        while let Some(packet) = self.try_read_packet() {
            sink(packet);
            produced += 1;
        }

        trace!(
            chunk_len = chunk.len(),
            produced,
            buffered = self.buffered_len(),
            "Framer consumed chunk"
        );
        produced
    }

    /// Feed a chunk and collect the completed packets
    pub fn feed_collect(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Packet> {
        let mut packets = Vec::new();
        self.feed(chunk, |packet| packets.push(packet));
        packets
    }

    /// Bytes received but not yet delivered, including a parsed header
    pub fn buffered_len(&self) -> usize {
        let header = if self.pending.is_some() {
            HEADER_LENGTH
        } else {
            0
        };
        header + self.buf.len()
    }

    /// True when no partial packet is buffered
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.buf.is_empty()
    }

    /// Total packets delivered since construction
    pub fn packets_emitted(&self) -> u64 {
        self.packets_emitted
    }

    fn try_read_packet(&mut self) -> Option<Packet> {
        let header = match self.pending {
            Some(header) => header,
            None => {
                if self.buf.len() < HEADER_LENGTH {
                    // Wait for complete header
                    return None;
                }
                let header = PendingHeader {
                    packet_type: self.buf[0],
                    length: LittleEndian::read_u16(&self.buf[1..HEADER_LENGTH]) as usize,
                };
                self.buf.advance(HEADER_LENGTH);
                self.pending = Some(header);
                header
            }
        };

        if self.buf.len() < header.length {
            // Wait for complete packet data
            return None;
        }

        self.pending = None;
        self.packets_emitted += 1;
        Some(Packet {
            packet_type: header.packet_type,
            payload: self.buf.split_to(header.length).freeze(),
        })
    }
}
