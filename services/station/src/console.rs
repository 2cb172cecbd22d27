//! Console rendering of runtime events

use std::net::SocketAddr;
use std::time::Duration;

use codec::{DeviceSnapshot, ProtocolError};
use network::{RuntimeListener, TransportError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Latest telemetry, readable by the command loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    pub peer: Option<SocketAddr>,
    pub latency: Option<Duration>,
    pub devices: DeviceSnapshot,
    pub log_lines: u64,
}

/// Writes runtime events to the log and keeps the latest telemetry
pub struct ConsoleListener {
    telemetry: watch::Sender<Telemetry>,
}

impl ConsoleListener {
    pub fn new() -> (Self, watch::Receiver<Telemetry>) {
        let (telemetry, rx) = watch::channel(Telemetry::default());
        (Self { telemetry }, rx)
    }
}

impl RuntimeListener for ConsoleListener {
    fn on_connect(&mut self, peer: SocketAddr) {
        info!(peer = %peer, "Connected to robot runtime");
        self.telemetry.send_modify(|t| t.peer = Some(peer));
    }

    fn on_receive_robot_logs(&mut self, lines: Vec<String>) {
        let count = lines.len() as u64;
        for line in lines {
            info!(target: "robot", "{}", line);
        }
        self.telemetry.send_modify(|t| t.log_lines += count);
    }

    fn on_receive_latency(&mut self, latency: Duration) {
        debug!(latency_ms = latency.as_millis() as u64, "Latency");
        self.telemetry.send_modify(|t| t.latency = Some(latency));
    }

    fn on_receive_devices(&mut self, snapshot: DeviceSnapshot) {
        let changed = {
            let previous = &self.telemetry.borrow().devices;
            previous.len() != snapshot.len()
                || previous
                    .devices
                    .iter()
                    .zip(&snapshot.devices)
                    .any(|(old, new)| old.id != new.id)
        };
        if changed {
            info!(devices = snapshot.len(), "Device set changed");
            for device in &snapshot.devices {
                info!(
                    id = %device.id,
                    kind = device.type_name().unwrap_or("Unknown device"),
                    params = device.params.len(),
                    "Device"
                );
            }
        }
        self.telemetry.send_modify(|t| t.devices = snapshot);
    }

    fn on_tcp_error(&mut self, err: &TransportError) {
        warn!(error = %err, category = err.category(), "Runtime link error");
    }

    fn on_udp_error(&mut self, err: &TransportError) {
        warn!(error = %err, category = err.category(), "Telemetry error");
    }

    fn on_protocol_error(&mut self, err: &ProtocolError) {
        error!(error = %err, category = err.category(), "Protocol error");
    }

    fn on_disconnect(&mut self) {
        info!("Disconnected from robot runtime");
        self.telemetry.send_modify(|t| {
            t.peer = None;
            t.latency = None;
        });
    }
}

/// One-line status summary for the `status` command
pub fn describe_status(state: impl std::fmt::Display, telemetry: &Telemetry) -> String {
    let peer = telemetry
        .peer
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let latency = telemetry
        .latency
        .map(|l| format!("{}ms", l.as_millis()))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "state={} peer={} latency={} devices={} log_lines={}",
        state,
        peer,
        latency,
        telemetry.devices.len(),
        telemetry.log_lines
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::proto::{param, DevData, Device, Param};

    fn snapshot(uids: &[u64]) -> DeviceSnapshot {
        DeviceSnapshot::from_dev_data(&DevData {
            devices: uids
                .iter()
                .map(|&uid| Device {
                    name: "LimitSwitch".to_string(),
                    uid,
                    r#type: 1,
                    params: vec![Param {
                        name: "switch0".to_string(),
                        val: Some(param::Val::Bval(true)),
                        readonly: true,
                    }],
                })
                .collect(),
        })
    }

    #[test]
    fn test_listener_tracks_telemetry() {
        let (mut listener, rx) = ConsoleListener::new();
        let peer: SocketAddr = "192.168.0.100:8101".parse().unwrap();

        listener.on_connect(peer);
        listener.on_receive_robot_logs(vec!["a".to_string(), "b".to_string()]);
        listener.on_receive_latency(Duration::from_millis(12));
        listener.on_receive_devices(snapshot(&[1, 2]));

        let telemetry = rx.borrow().clone();
        assert_eq!(telemetry.peer, Some(peer));
        assert_eq!(telemetry.log_lines, 2);
        assert_eq!(telemetry.latency, Some(Duration::from_millis(12)));
        assert_eq!(telemetry.devices.len(), 2);
        assert_eq!(telemetry.devices.devices[0].get("switch0"), Some("true"));

        listener.on_disconnect();
        let telemetry = rx.borrow().clone();
        assert_eq!(telemetry.peer, None);
        assert_eq!(telemetry.latency, None);
        assert_eq!(telemetry.log_lines, 2);
    }

    #[test]
    fn test_status_line() {
        let telemetry = Telemetry {
            latency: Some(Duration::from_millis(7)),
            devices: snapshot(&[9]),
            log_lines: 3,
            ..Telemetry::default()
        };
        assert_eq!(
            describe_status("connecting", &telemetry),
            "state=connecting peer=- latency=7ms devices=1 log_lines=3"
        );
    }
}
