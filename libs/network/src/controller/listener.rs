//! Application callbacks for runtime events

use std::net::SocketAddr;
use std::time::Duration;

use codec::{DeviceSnapshot, ProtocolError};

use crate::TransportError;

/// Receiver of everything the runtime link reports.
///
/// Called synchronously on the controller task, in dispatch order. A slow
/// callback delays every other event, so implementations should hand work
/// off rather than block.
pub trait RuntimeListener: Send + 'static {
    /// TCP link established and handshake byte sent
    fn on_connect(&mut self, _peer: SocketAddr) {}

    /// Batch of robot log lines
    fn on_receive_robot_logs(&mut self, lines: Vec<String>);

    /// One-way latency estimate from the latest probe echo
    fn on_receive_latency(&mut self, latency: Duration);

    /// Latest device telemetry, from either transport
    fn on_receive_devices(&mut self, snapshot: DeviceSnapshot);

    /// TCP connect, read or write failure. The link is already closed.
    fn on_tcp_error(&mut self, err: &TransportError);

    /// UDP receive failure or undecodable datagram. The socket stays open.
    fn on_udp_error(&mut self, err: &TransportError);

    /// Non-fatal protocol failure. The connection stays open.
    fn on_protocol_error(&mut self, err: &ProtocolError);

    /// TCP session lost or closed
    fn on_disconnect(&mut self);
}

impl<L: RuntimeListener + ?Sized> RuntimeListener for Box<L> {
    fn on_connect(&mut self, peer: SocketAddr) {
        (**self).on_connect(peer)
    }

    fn on_receive_robot_logs(&mut self, lines: Vec<String>) {
        (**self).on_receive_robot_logs(lines)
    }

    fn on_receive_latency(&mut self, latency: Duration) {
        (**self).on_receive_latency(latency)
    }

    fn on_receive_devices(&mut self, snapshot: DeviceSnapshot) {
        (**self).on_receive_devices(snapshot)
    }

    fn on_tcp_error(&mut self, err: &TransportError) {
        (**self).on_tcp_error(err)
    }

    fn on_udp_error(&mut self, err: &TransportError) {
        (**self).on_udp_error(err)
    }

    fn on_protocol_error(&mut self, err: &ProtocolError) {
        (**self).on_protocol_error(err)
    }

    fn on_disconnect(&mut self) {
        (**self).on_disconnect()
    }
}
