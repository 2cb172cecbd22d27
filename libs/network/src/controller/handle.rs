//! Clone-able handle for driving a running controller

use std::net::SocketAddr;

use codec::proto::{DevData, Input, Mode, Pos};
use codec::Message;
use tokio::sync::{mpsc, watch};

use super::ConnectionState;
use crate::address::parse_runtime_address;
use crate::{Result, TransportError};

/// Requests from the application to the controller task
#[derive(Debug)]
pub(crate) enum Command {
    SetTarget(SocketAddr),
    Disconnect,
    Send(Message),
    Shutdown,
}

/// Application side of a [`ConnectionController`](super::ConnectionController).
///
/// Every method only enqueues a request. Sends are best effort: the
/// controller drops them unless it is connected at the moment it processes
/// them. Errors are returned only when the controller task has stopped.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    default_port: u16,
}

impl ConnectionHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        state: watch::Receiver<ConnectionState>,
        default_port: u16,
    ) -> Self {
        Self {
            commands,
            state,
            default_port,
        }
    }

    /// Validate `host[:port]` and retarget the session.
    ///
    /// An invalid address is rejected here, before anything reaches the
    /// controller, and leaves the session untouched.
    pub fn set_target(&self, address: &str) -> Result<SocketAddr> {
        let addr = parse_runtime_address(address, self.default_port)?;
        self.submit(Command::SetTarget(addr))?;
        Ok(addr)
    }

    /// Close the session and stay disconnected until the next target is set
    pub fn disconnect(&self) -> Result<()> {
        self.submit(Command::Disconnect)
    }

    pub fn send_run_mode(&self, mode: Mode) -> Result<()> {
        self.send(Message::run_mode(mode))
    }

    pub fn send_device_preferences(&self, preferences: DevData) -> Result<()> {
        self.send(Message::DeviceData(preferences))
    }

    pub fn send_start_position(&self, pos: Pos) -> Result<()> {
        self.send(Message::start_pos(pos))
    }

    pub fn send_inputs(&self, inputs: Vec<Input>) -> Result<()> {
        self.send(Message::inputs(inputs))
    }

    /// Enqueue any encodable message
    pub fn send(&self, message: Message) -> Result<()> {
        self.submit(Command::Send(message))
    }

    /// Stop the controller task after tearing down both sockets
    pub fn shutdown(&self) -> Result<()> {
        self.submit(Command::Shutdown)
    }

    /// Last published connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    fn submit(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TransportError::connection("Connection controller has stopped", None))
    }
}
