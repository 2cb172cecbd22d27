//! Transport Layer
//!
//! [`TransportManager`] is the single owner of the runtime TCP link and the
//! UDP telemetry socket. It turns socket readiness into [`TransportEvent`]s
//! and never makes policy decisions: reconnecting, probing and dispatch
//! belong to the controller.
//!
//! ## TCP Lifecycle
//!
//! ```text
//! Idle ──start_connect──▶ Connecting ──ok──▶ Connected
//!  ▲                          │                  │
//!  └───── failed / closed ────┴──────────────────┘
//! ```
//!
//! Every transition out of `Connecting` or `Connected` drops the previous
//! handle first, so a superseded socket can never deliver a late event.
//!
//! ## Outbound Backpressure
//!
//! [`TransportManager::queue_frame`] never waits on the socket. Queued bytes
//! drain while [`TransportManager::next_event`] is polled. A runtime that
//! stops reading lets the queue grow to `max_outbound_bytes`; the next frame
//! past that limit drops the link with a connection error.

use crate::{Result, TransportError};
use bytes::Bytes;
use codec::{Packet, PacketFramer};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

pub mod tcp;
pub mod udp;

#[cfg(test)]
mod tests;

pub use tcp::TcpLink;
pub use udp::UdpLink;

type ConnectFuture = Pin<Box<dyn Future<Output = Result<TcpLink>> + Send>>;

/// Something happened on one of the sockets
#[derive(Debug)]
pub enum TransportEvent {
    /// TCP connect completed
    TcpConnected(SocketAddr),
    /// TCP connect failed or timed out; the attempt is gone
    TcpConnectFailed(TransportError),
    /// Complete packets framed from the TCP stream, in arrival order
    TcpPackets(Vec<Packet>),
    /// TCP stream ended; `None` for an orderly close by the runtime
    TcpClosed(Option<TransportError>),
    /// One UDP datagram and its sender
    UdpDatagram(Bytes, SocketAddr),
    /// UDP receive failed; the socket stays open
    UdpFailed(TransportError),
}

/// Coarse TCP state, reported when a link or attempt is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpPhase {
    Idle,
    Connecting,
    Connected,
}

struct TcpConnection {
    link: TcpLink,
    framer: PacketFramer,
}

enum TcpState {
    Idle,
    Connecting {
        addr: SocketAddr,
        attempt: ConnectFuture,
    },
    Connected(TcpConnection),
}

/// Owner of the runtime sockets
pub struct TransportManager {
    tcp: TcpState,
    udp: Option<UdpLink>,
    connect_timeout: Duration,
    max_outbound_bytes: usize,
}

impl TransportManager {
    pub fn new(connect_timeout: Duration, max_outbound_bytes: usize) -> Self {
        Self {
            tcp: TcpState::Idle,
            udp: None,
            connect_timeout,
            max_outbound_bytes,
        }
    }

    /// Bind the telemetry socket unless it is already bound
    pub async fn bind_udp(&mut self, port: u16) -> Result<SocketAddr> {
        if let Some(udp) = &self.udp {
            return Ok(udp.local_addr());
        }
        let link = UdpLink::bind(port).await?;
        let local = link.local_addr();
        self.udp = Some(link);
        Ok(local)
    }

    pub fn udp_local_addr(&self) -> Option<SocketAddr> {
        self.udp.as_ref().map(UdpLink::local_addr)
    }

    pub fn close_udp(&mut self) {
        if let Some(udp) = self.udp.take() {
            udp.close();
        }
    }

    /// Begin a connection attempt, closing any previous link or attempt first
    pub fn start_connect(&mut self, addr: SocketAddr) {
        self.close_tcp();
        let connect_timeout = self.connect_timeout;
        self.tcp = TcpState::Connecting {
            addr,
            attempt: Box::pin(TcpLink::connect(addr, connect_timeout)),
        };
    }

    /// Drop the TCP link or pending attempt. Returns the phase it was in.
    pub fn close_tcp(&mut self) -> TcpPhase {
        match std::mem::replace(&mut self.tcp, TcpState::Idle) {
            TcpState::Idle => TcpPhase::Idle,
            TcpState::Connecting { addr, .. } => {
                debug!(peer = %addr, "Cancelled TCP connect attempt");
                TcpPhase::Connecting
            }
            TcpState::Connected(connection) => {
                if !connection.framer.is_idle() {
                    debug!(
                        buffered = connection.framer.buffered_len(),
                        "Discarding partial packet on close"
                    );
                }
                connection.link.abort();
                TcpPhase::Connected
            }
        }
    }

    /// Queue a framed packet for the runtime.
    ///
    /// Fails when there is no link, or when the runtime has left more than
    /// `max_outbound_bytes` unread; the latter also drops the link.
    pub fn queue_frame(&mut self, frame: &[u8]) -> Result<()> {
        let TcpState::Connected(connection) = &mut self.tcp else {
            return Err(TransportError::connection("Not connected to runtime", None));
        };
        let queued = connection.link.queued_len();
        if queued + frame.len() > self.max_outbound_bytes {
            let peer = connection.link.peer_addr();
            warn!(
                peer = %peer,
                queued,
                limit = self.max_outbound_bytes,
                "Runtime is not reading, dropping link"
            );
            self.close_tcp();
            return Err(TransportError::connection(
                format!(
                    "Outbound backlog over {} bytes: runtime is not reading",
                    self.max_outbound_bytes
                ),
                Some(peer),
            ));
        }
        connection.link.queue_frame(frame);
        Ok(())
    }

    /// Wait for the next socket event. Cancel safe.
    ///
    /// Pending forever while there is neither a TCP link or attempt nor a
    /// UDP socket.
    pub async fn next_event(&mut self) -> TransportEvent {
        tokio::select! {
            event = poll_tcp(&mut self.tcp) => event,
            event = poll_udp(&mut self.udp) => event,
        }
    }
}

async fn poll_tcp(tcp: &mut TcpState) -> TransportEvent {
    match tcp {
        TcpState::Idle => std::future::pending().await,
        TcpState::Connecting { attempt, .. } => {
            let result = attempt.as_mut().await;
            match result {
                Ok(link) => {
                    let peer = link.peer_addr();
                    *tcp = TcpState::Connected(TcpConnection {
                        link,
                        framer: PacketFramer::new(),
                    });
                    TransportEvent::TcpConnected(peer)
                }
                Err(e) => {
                    *tcp = TcpState::Idle;
                    TransportEvent::TcpConnectFailed(e)
                }
            }
        }
        TcpState::Connected(connection) => {
            let TcpConnection { link, framer } = connection;
            let error = loop {
                match link.drive().await {
                    Ok(Some(chunk)) => {
                        let packets = framer.feed_collect(chunk);
                        if !packets.is_empty() {
                            return TransportEvent::TcpPackets(packets);
                        }
                    }
                    Ok(None) => break None,
                    Err(e) => break Some(e),
                }
            };
            if let TcpState::Connected(connection) = std::mem::replace(tcp, TcpState::Idle) {
                connection.link.close();
            }
            TransportEvent::TcpClosed(error)
        }
    }
}

async fn poll_udp(udp: &mut Option<UdpLink>) -> TransportEvent {
    let Some(link) = udp else {
        return std::future::pending().await;
    };
    match link.recv_datagram().await {
        Ok((datagram, sender)) => TransportEvent::UdpDatagram(datagram, sender),
        Err(e) => TransportEvent::UdpFailed(e),
    }
}
