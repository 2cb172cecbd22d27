//! Wire schemas for packet payloads
//!
//! Protobuf messages shared with the robot runtime, declared with `prost`
//! derives instead of generated code. Field numbers and enum values are part
//! of the wire contract.

/// Robot execution mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Mode {
    Idle = 0,
    Auto = 1,
    Teleop = 2,
    Estop = 3,
    Challenge = 4,
}

impl Mode {
    /// Parse an operator-facing mode name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "idle" => Some(Mode::Idle),
            "auto" | "autonomous" => Some(Mode::Auto),
            "teleop" => Some(Mode::Teleop),
            "estop" => Some(Mode::Estop),
            "challenge" => Some(Mode::Challenge),
            _ => None,
        }
    }
}

/// Run mode command payload
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunMode {
    #[prost(enumeration = "Mode", tag = "1")]
    pub mode: i32,
}

impl RunMode {
    pub fn new(mode: Mode) -> Self {
        Self { mode: mode as i32 }
    }
}

/// Robot starting position on the field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Pos {
    Left = 0,
    Right = 1,
}

impl Pos {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(Pos::Left),
            "right" => Some(Pos::Right),
            _ => None,
        }
    }
}

/// Start position command payload
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartPos {
    #[prost(enumeration = "Pos", tag = "1")]
    pub pos: i32,
}

impl StartPos {
    pub fn new(pos: Pos) -> Self {
        Self { pos: pos as i32 }
    }
}

/// Batch of text lines, used for robot logs
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Text {
    #[prost(string, repeated, tag = "1")]
    pub payload: Vec<String>,
}

pub mod param {
    /// Value of a device parameter; at most one is set
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Val {
        #[prost(float, tag = "2")]
        Fval(f32),
        #[prost(int32, tag = "3")]
        Ival(i32),
        #[prost(bool, tag = "4")]
        Bval(bool),
    }
}

/// One named device parameter
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Param {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(oneof = "param::Val", tags = "2, 3, 4")]
    pub val: Option<param::Val>,
    #[prost(bool, tag = "5")]
    pub readonly: bool,
}

/// One lowcar device and its parameters
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Device {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint64, tag = "2")]
    pub uid: u64,
    #[prost(uint32, tag = "3")]
    pub r#type: u32,
    #[prost(message, repeated, tag = "4")]
    pub params: Vec<Param>,
}

/// Device telemetry (runtime to station) or device preferences (station to runtime)
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DevData {
    #[prost(message, repeated, tag = "1")]
    pub devices: Vec<Device>,
}

/// Input device kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Source {
    Gamepad = 0,
    Keyboard = 1,
}

/// State of one input device
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Input {
    #[prost(bool, tag = "1")]
    pub connected: bool,
    /// Button bitmask
    #[prost(fixed64, tag = "2")]
    pub buttons: u64,
    #[prost(float, repeated, tag = "3")]
    pub axes: Vec<f32>,
    #[prost(enumeration = "Source", tag = "4")]
    pub source: i32,
}

/// Control input vector payload
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserInputs {
    #[prost(message, repeated, tag = "1")]
    pub inputs: Vec<Input>,
}

/// Latency probe payload, echoed back by the runtime
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeStamps {
    /// Station send time, milliseconds since the UNIX epoch
    #[prost(uint64, tag = "1")]
    pub dawn_timestamp: u64,
    #[prost(uint64, tag = "2")]
    pub runtime_timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::from_name("TELEOP"), Some(Mode::Teleop));
        assert_eq!(Mode::from_name("autonomous"), Some(Mode::Auto));
        assert_eq!(Mode::from_name("sprint"), None);
        assert_eq!(RunMode::new(Mode::Estop).mode(), Mode::Estop);
    }

    #[test]
    fn test_pos_names() {
        assert_eq!(Pos::from_name("Left"), Some(Pos::Left));
        assert_eq!(StartPos::new(Pos::Right).pos(), Pos::Right);
        assert_eq!(Pos::from_name("center"), None);
    }
}
