//! # Connection Controller - Runtime Session State Machine
//!
//! ## Purpose
//!
//! Owns the runtime session: connect lifecycle, reconnection policy, latency
//! probing and dispatch of decoded packets to a [`RuntimeListener`].
//!
//! ## Execution Model
//!
//! The controller is an actor. [`ConnectionController::run`] is one task
//! that reacts to four event sources in a single `tokio::select!` loop:
//!
//! ```text
//! ConnectionHandle ──commands──┐
//! TransportManager ──events────┤
//! probe interval ──ticks───────┼──▶ handler ──▶ RuntimeListener
//! reconnect timer ──fires──────┘
//! ```
//!
//! Handlers run one at a time to completion, so controller state needs no
//! locks. No handler waits on the TCP socket: outbound frames are queued and
//! drain while the loop polls the transports. Timers are plain owned values:
//! clearing or replacing one cancels it, and a superseded socket is dropped
//! before its replacement exists.
//!
//! ## State Transitions
//!
//! ```text
//! Disconnected ──set_target──▶ Connecting ──connected──▶ Connected
//!      ▲                        ▲      │                     │
//!      │                        │      └─failed─┐   lost ────┘
//!      │                        └──reconnect delay◀──────────┘
//!      └──────────── disconnect (from any state) ────────────
//! ```

use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use codec::{
    decode, decode_device_datagram, encode_frame, DeviceSnapshot, Message, Packet, ProtocolError,
    CLIENT_IDENTITY_BYTE, DEFAULT_RUNTIME_PORT, UDP_BIND_PORT,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::time::{latency_from_echo, system_timestamp_ms};
use crate::transports::{TcpPhase, TransportEvent, TransportManager};
use crate::TransportError;

mod handle;
mod listener;

pub use handle::ConnectionHandle;
pub use listener::RuntimeListener;

use handle::Command;

/// Delay before reconnecting after an unexpected loss
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Period of the latency probe while connected
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(5000);

/// Upper bound on a single TCP connect attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Unwritten outbound bytes tolerated before the link is dropped
pub const DEFAULT_MAX_OUTBOUND_BYTES: usize = 1024 * 1024;

/// Session state published to handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session: never targeted, or explicitly disconnected
    Disconnected,
    /// Connect attempt in flight or reconnect scheduled
    Connecting,
    /// TCP link up
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Controller timing and port settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port used when a target omits one
    pub default_port: u16,
    /// Local UDP telemetry port; 0 picks an ephemeral port
    pub udp_port: u16,
    pub reconnect_delay: Duration,
    pub probe_interval: Duration,
    pub connect_timeout: Duration,
    /// Outbound queue limit while the runtime is not reading
    pub max_outbound_bytes: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_RUNTIME_PORT,
            udp_port: UDP_BIND_PORT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_outbound_bytes: DEFAULT_MAX_OUTBOUND_BYTES,
        }
    }
}

/// Runtime session actor
pub struct ConnectionController<L: RuntimeListener> {
    config: ControllerConfig,
    listener: L,
    transports: TransportManager,
    commands: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    state: ConnectionState,
    target: Option<SocketAddr>,
    /// Set by `disconnect`, cleared by the next `set_target`
    explicitly_disconnected: bool,
    reconnect: Option<Pin<Box<Sleep>>>,
    probe: Option<Interval>,
    /// Send time of the latest probe; overwritten on every tick
    pending_probe_ms: Option<u64>,
}

impl<L: RuntimeListener> ConnectionController<L> {
    /// Build a controller and the handle that drives it
    pub fn new(config: ControllerConfig, listener: L) -> (Self, ConnectionHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let handle = ConnectionHandle::new(command_tx, state_rx, config.default_port);

        let controller = Self {
            transports: TransportManager::new(config.connect_timeout, config.max_outbound_bytes),
            config,
            listener,
            commands: command_rx,
            state_tx,
            state: ConnectionState::Disconnected,
            target: None,
            explicitly_disconnected: false,
            reconnect: None,
            probe: None,
            pending_probe_ms: None,
        };
        (controller, handle)
    }

    /// Run the session until shutdown is requested or every handle is gone.
    ///
    /// Binds the UDP socket first, then reacts to events. Returns the
    /// listener after tearing down both sockets.
    pub async fn run(mut self) -> L {
        info!(udp_port = self.config.udp_port, "Connection controller started");
        self.bind_udp().await;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                event = self.transports.next_event() => self.handle_transport_event(event),
                _ = probe_tick(&mut self.probe) => self.send_probe(),
                _ = reconnect_fired(&mut self.reconnect) => self.handle_reconnect_timer(),
            }
        }

        self.teardown();
        info!("Connection controller stopped");
        self.listener
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetTarget(addr) => self.set_target(addr).await,
            Command::Disconnect => self.disconnect(),
            Command::Send(message) => self.send_message(message),
            // Handled by the run loop
            Command::Shutdown => {}
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::TcpConnected(peer) => self.on_tcp_connected(peer),
            TransportEvent::TcpConnectFailed(err) => {
                self.report_tcp_error("Runtime connect attempt failed", &err);
                self.connection_lost();
            }
            TransportEvent::TcpPackets(packets) => {
                for packet in packets {
                    self.dispatch(packet);
                }
            }
            TransportEvent::TcpClosed(err) => {
                match &err {
                    Some(err) => self.report_tcp_error("Runtime link failed", err),
                    None => info!("Runtime closed the connection"),
                }
                self.connection_lost();
            }
            TransportEvent::UdpDatagram(datagram, sender) => match decode_device_datagram(&datagram)
            {
                Ok(data) => self
                    .listener
                    .on_receive_devices(DeviceSnapshot::from_dev_data(&data)),
                Err(err) => {
                    debug!(from = %sender, error = %err, "Dropping undecodable datagram");
                    self.listener.on_udp_error(&TransportError::from(err));
                }
            },
            TransportEvent::UdpFailed(err) => {
                warn!(error = %err, "UDP receive failed");
                self.listener.on_udp_error(&err);
            }
        }
    }

    async fn set_target(&mut self, addr: SocketAddr) {
        info!(target = %addr, "Runtime target set");
        self.explicitly_disconnected = false;
        self.target = Some(addr);
        self.reconnect = None;
        self.stop_probe();

        if self.transports.close_tcp() == TcpPhase::Connected {
            self.listener.on_disconnect();
        }
        if self.transports.udp_local_addr().is_none() {
            self.bind_udp().await;
        }
        self.begin_connect(addr);
    }

    fn disconnect(&mut self) {
        info!("Disconnecting from runtime");
        self.explicitly_disconnected = true;
        self.teardown();
    }

    /// Close both sockets and cancel every timer
    fn teardown(&mut self) {
        self.reconnect = None;
        self.stop_probe();
        let phase = self.transports.close_tcp();
        self.transports.close_udp();
        self.set_state(ConnectionState::Disconnected);
        if phase == TcpPhase::Connected {
            self.listener.on_disconnect();
        }
    }

    fn on_tcp_connected(&mut self, peer: SocketAddr) {
        // Identify as the station before anything else goes out
        if let Err(err) = self.transports.queue_frame(&[CLIENT_IDENTITY_BYTE]) {
            self.report_tcp_error("Handshake write failed", &err);
            self.connection_lost();
            return;
        }

        self.set_state(ConnectionState::Connected);
        let period = self.config.probe_interval;
        let mut probe = interval_at(Instant::now() + period, period);
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.probe = Some(probe);
        self.listener.on_connect(peer);
    }

    /// TCP link or attempt is gone without an explicit disconnect
    fn connection_lost(&mut self) {
        self.stop_probe();

        // State is final before the listener hears about the loss
        if self.explicitly_disconnected {
            self.set_state(ConnectionState::Disconnected);
        } else {
            debug!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Scheduling reconnect"
            );
            self.reconnect = Some(Box::pin(sleep(self.config.reconnect_delay)));
            self.set_state(ConnectionState::Connecting);
        }
        self.listener.on_disconnect();
    }

    fn handle_reconnect_timer(&mut self) {
        self.reconnect = None;
        if self.explicitly_disconnected {
            return;
        }
        if let Some(addr) = self.target {
            info!(target = %addr, "Reconnecting to runtime");
            self.begin_connect(addr);
        }
    }

    fn begin_connect(&mut self, addr: SocketAddr) {
        self.transports.start_connect(addr);
        self.set_state(ConnectionState::Connecting);
    }

    fn send_probe(&mut self) {
        let now = system_timestamp_ms();
        self.pending_probe_ms = Some(now);
        self.send_message(Message::latency_probe(now));
    }

    fn stop_probe(&mut self) {
        self.probe = None;
        self.pending_probe_ms = None;
    }

    fn send_message(&mut self, message: Message) {
        if self.state != ConnectionState::Connected {
            debug!(msg_type = %message.msg_type(), state = %self.state, "Dropping send while not connected");
            return;
        }
        let frame = match encode_frame(&message) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "Cannot encode outbound message");
                self.listener.on_protocol_error(&err);
                return;
            }
        };
        if let Err(err) = self.transports.queue_frame(&frame) {
            self.report_tcp_error("Runtime write failed", &err);
            self.connection_lost();
        }
    }

    fn report_tcp_error(&mut self, context: &str, err: &TransportError) {
        warn!(
            error = %err,
            category = err.category(),
            retryable = err.is_retryable(),
            "{}",
            context
        );
        self.listener.on_tcp_error(err);
    }

    fn dispatch(&mut self, packet: Packet) {
        let message = match decode(&packet) {
            Ok(message) => message,
            Err(err) => {
                warn!(packet_type = packet.packet_type, error = %err, "Protocol error");
                self.listener.on_protocol_error(&err);
                return;
            }
        };

        let msg_type = message.msg_type();
        if !msg_type.is_dispatched() {
            let err = ProtocolError::Unexpected { msg_type };
            warn!(error = %err, "Protocol error");
            self.listener.on_protocol_error(&err);
            return;
        }

        match message {
            Message::Log(text) => self.listener.on_receive_robot_logs(text.payload),
            Message::DeviceData(data) => self
                .listener
                .on_receive_devices(DeviceSnapshot::from_dev_data(&data)),
            Message::TimeStamps(stamps) => {
                if self.pending_probe_ms != Some(stamps.dawn_timestamp) {
                    debug!(sent_ms = stamps.dawn_timestamp, "Echo does not match latest probe");
                }
                let latency = latency_from_echo(stamps.dawn_timestamp, system_timestamp_ms());
                debug!(latency_ms = latency.as_millis() as u64, "Latency probe echoed");
                self.listener.on_receive_latency(latency);
            }
            // Rejected above
            Message::RunMode(_) | Message::StartPos(_) | Message::Inputs(_) => {}
        }
    }

    async fn bind_udp(&mut self) {
        if let Err(err) = self.transports.bind_udp(self.config.udp_port).await {
            warn!(error = %err, "Continuing without UDP telemetry");
            self.listener.on_udp_error(&err);
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Connection state changed");
            self.state = state;
            self.state_tx.send_replace(state);
        }
    }
}

/// Next probe tick, or never when probing is stopped
async fn probe_tick(probe: &mut Option<Interval>) {
    match probe {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Reconnect deadline, or never when none is scheduled
async fn reconnect_fired(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
