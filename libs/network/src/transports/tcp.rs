//! TCP Link to the Robot Runtime
//!
//! One connection attempt and, once established, one stream. A link is never
//! reused after it closes: reconnecting builds a new link.
//!
//! Outbound frames are queued, never written inline. [`TcpLink::drive`]
//! flushes the queue with non-blocking writes while it waits for inbound
//! bytes, so a runtime that stops reading fills the queue instead of
//! stalling the caller.

use crate::{Result, TransportError};
use bytes::{Buf, BytesMut};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::Interest;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Read buffer reserve per socket read
const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Established TCP stream with byte counters
#[derive(Debug)]
pub struct TcpLink {
    stream: TcpStream,
    peer_addr: SocketAddr,
    connected_at: Instant,
    /// Reusable read buffer, cleared before every read
    read_buffer: BytesMut,
    /// Framed bytes not yet accepted by the kernel
    outbound: BytesMut,
    bytes_sent: u64,
    bytes_received: u64,
}

/// TCP link statistics
#[derive(Debug, Clone)]
struct TcpLinkStats {
    peer_addr: SocketAddr,
    connected_duration: Duration,
    bytes_sent: u64,
    bytes_received: u64,
    bytes_queued: usize,
}

enum ReadOutcome {
    Data(usize),
    Closed,
    WouldBlock,
}

impl TcpLink {
    /// Connect to the runtime, failing after `connect_timeout`
    pub async fn connect(addr: SocketAddr, connect_timeout: Duration) -> Result<Self> {
        debug!(peer = %addr, "Connecting to runtime");

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::timeout("TCP connect", connect_timeout.as_millis() as u64))?
            .map_err(|e| {
                TransportError::connection_with_source("Failed to connect to runtime", Some(addr), e)
            })?;

        // Commands and probes are tiny; do not let Nagle hold them back
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        info!(peer = %addr, "Connected to runtime");
        Ok(Self {
            stream,
            peer_addr: addr,
            connected_at: Instant::now(),
            read_buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            outbound: BytesMut::new(),
            bytes_sent: 0,
            bytes_received: 0,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Append framed bytes to the outbound queue
    pub fn queue_frame(&mut self, frame: &[u8]) {
        self.outbound.extend_from_slice(frame);
    }

    /// Bytes queued but not yet written to the socket
    pub fn queued_len(&self) -> usize {
        self.outbound.len()
    }

    /// Flush queued bytes and wait for inbound bytes.
    ///
    /// Returns the next chunk read, or `None` when the runtime closed the
    /// stream. Cancel safe: socket I/O only happens through non-blocking
    /// `try_*` calls after readiness resolves, so dropping the future loses
    /// neither queued nor received bytes.
    pub async fn drive(&mut self) -> Result<Option<&[u8]>> {
        loop {
            let interest = if self.outbound.is_empty() {
                Interest::READABLE
            } else {
                Interest::READABLE | Interest::WRITABLE
            };
            let ready = self
                .stream
                .ready(interest)
                .await
                .map_err(|e| TransportError::network_with_source("Runtime socket failed", e))?;

            if ready.is_writable() && !self.outbound.is_empty() {
                self.flush_some()?;
            }
            if ready.is_readable() {
                match self.read_some()? {
                    ReadOutcome::Data(n) => return Ok(Some(&self.read_buffer[..n])),
                    ReadOutcome::Closed => return Ok(None),
                    ReadOutcome::WouldBlock => {}
                }
            }
        }
    }

    fn flush_some(&mut self) -> Result<()> {
        match self.stream.try_write(&self.outbound) {
            Ok(n) => {
                self.outbound.advance(n);
                self.bytes_sent += n as u64;
                debug!(
                    peer = %self.peer_addr,
                    bytes = n,
                    queued = self.outbound.len(),
                    "Sent TCP bytes"
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(TransportError::network_with_source(
                "Failed to write to runtime",
                e,
            )),
        }
    }

    fn read_some(&mut self) -> Result<ReadOutcome> {
        self.read_buffer.clear();
        self.read_buffer.reserve(READ_CHUNK_SIZE);

        match self.stream.try_read_buf(&mut self.read_buffer) {
            Ok(0) => {
                debug!(peer = %self.peer_addr, "Runtime closed the stream");
                Ok(ReadOutcome::Closed)
            }
            Ok(n) => {
                self.bytes_received += n as u64;
                debug!(peer = %self.peer_addr, bytes = n, "Received TCP chunk");
                Ok(ReadOutcome::Data(n))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(ReadOutcome::WouldBlock),
            Err(e) => Err(TransportError::network_with_source(
                "Failed to read from runtime",
                e,
            )),
        }
    }

    /// Close abortively: zero linger, so dropping the socket sends a reset
    pub fn abort(self) {
        if let Err(e) = self.stream.set_linger(Some(Duration::ZERO)) {
            warn!("Failed to set SO_LINGER before close: {}", e);
        }
        self.close();
    }

    /// Drop the stream, discarding anything still queued
    pub fn close(self) {
        let stats = self.stats();
        info!(
            peer = %stats.peer_addr,
            connected_ms = stats.connected_duration.as_millis() as u64,
            bytes_sent = stats.bytes_sent,
            bytes_received = stats.bytes_received,
            discarded = stats.bytes_queued,
            "Closed TCP link"
        );
    }

    fn stats(&self) -> TcpLinkStats {
        TcpLinkStats {
            peer_addr: self.peer_addr,
            connected_duration: self.connected_at.elapsed(),
            bytes_sent: self.bytes_sent,
            bytes_received: self.bytes_received,
            bytes_queued: self.outbound.len(),
        }
    }
}
