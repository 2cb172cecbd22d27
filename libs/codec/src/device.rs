//! Device snapshot projection
//!
//! The runtime reports devices as nested protobuf records. The station shows
//! them as flat records: a composite `type_uid` id plus a map of parameter
//! names to display strings.

use std::collections::BTreeMap;

use crate::proto::{param, DevData, Device, Param};

/// Friendly names for lowcar device types, indexed by type id
const DEVICE_TYPE_NAMES: [&str; 9] = [
    "Dummy device",
    "Limit switch",
    "Line follower",
    "Battery buzzer",
    "Servo controller",
    "Polar bear motor controller",
    "KoalaBear motor controller",
    "Power distribution board",
    "Distance sensor",
];

/// Human readable name of a lowcar device type
pub fn device_type_name(device_type: u32) -> Option<&'static str> {
    DEVICE_TYPE_NAMES.get(device_type as usize).copied()
}

/// One reporting device, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceRecord {
    /// Device type and uid joined by an underscore
    pub id: String,
    /// Parameter name to stringified value
    pub params: BTreeMap<String, String>,
}

impl DeviceRecord {
    /// Flatten a decoded device. Parameters with no value set are skipped.
    pub fn from_device(device: &Device) -> Self {
        let params = device
            .params
            .iter()
            .filter_map(|p| param_display(p).map(|value| (p.name.clone(), value)))
            .collect();
        Self {
            id: format!("{}_{}", device.r#type, device.uid),
            params,
        }
    }

    /// Device type parsed back out of the id
    pub fn type_id(&self) -> Option<u32> {
        self.id.split_once('_')?.0.parse().ok()
    }

    /// Device uid parsed back out of the id
    pub fn uid(&self) -> Option<u64> {
        self.id.split_once('_')?.1.parse().ok()
    }

    /// Friendly device type name, when the type is known
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_id().and_then(device_type_name)
    }

    pub fn get(&self, param: &str) -> Option<&str> {
        self.params.get(param).map(String::as_str)
    }
}

/// Every device currently reporting to the runtime, in report order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceSnapshot {
    pub devices: Vec<DeviceRecord>,
}

impl DeviceSnapshot {
    pub fn from_dev_data(data: &DevData) -> Self {
        Self {
            devices: data.devices.iter().map(DeviceRecord::from_device).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find a device by composite id
    pub fn find(&self, id: &str) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.id == id)
    }
}

impl From<&DevData> for DeviceSnapshot {
    fn from(data: &DevData) -> Self {
        Self::from_dev_data(data)
    }
}

fn param_display(param: &Param) -> Option<String> {
    match param.val? {
        param::Val::Fval(v) => Some(v.to_string()),
        param::Val::Ival(v) => Some(v.to_string()),
        param::Val::Bval(v) => Some(v.to_string()),
    }
}
