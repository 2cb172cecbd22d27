//! UDP Telemetry Socket
//!
//! Receive-only socket bound once on a fixed local port. The runtime pushes
//! device data here as bare protobuf bodies, one per datagram, so datagram
//! boundaries are packet boundaries and no framing is involved.

use crate::{Result, TransportError};
use bytes::Bytes;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, info};

/// Largest UDP payload over IPv4
const MAX_DATAGRAM_SIZE: usize = 65_507;

/// UDP link counters, logged on close
#[derive(Debug, Clone, Default)]
struct UdpLinkStats {
    datagrams_received: u64,
    bytes_received: u64,
}

/// Bound telemetry socket
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buffer: Vec<u8>,
    stats: UdpLinkStats,
}

impl UdpLink {
    /// Bind on all interfaces at `port`. Port 0 picks an ephemeral port.
    pub async fn bind(port: u16) -> Result<Self> {
        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            TransportError::network_with_source(
                format!("Failed to bind UDP socket on {}", bind_addr),
                e,
            )
        })?;
        let local_addr = socket.local_addr()?;

        info!(local = %local_addr, "UDP telemetry socket listening");
        Ok(Self {
            socket,
            local_addr,
            recv_buffer: vec![0u8; MAX_DATAGRAM_SIZE],
            stats: UdpLinkStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive one datagram. Cancel safe.
    pub async fn recv_datagram(&mut self) -> Result<(Bytes, SocketAddr)> {
        let (n, sender) = self
            .socket
            .recv_from(&mut self.recv_buffer)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to receive UDP datagram", e))?;

        self.stats.datagrams_received += 1;
        self.stats.bytes_received += n as u64;
        debug!(from = %sender, bytes = n, "Received UDP datagram");

        Ok((Bytes::copy_from_slice(&self.recv_buffer[..n]), sender))
    }

    pub fn close(self) {
        info!(
            local = %self.local_addr,
            datagrams = self.stats.datagrams_received,
            bytes_received = self.stats.bytes_received,
            "Closed UDP telemetry socket"
        );
    }
}
