// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceLocation {
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    Office,
    Garage,
    Garden,
    Hallway,
    DiningRoom,
    Basement,
}

impl DeviceLocation {
    /// Climate-controlled rooms that count toward the house comfort averages.
    pub const INDOOR: [DeviceLocation; 7] = [
        DeviceLocation::LivingRoom,
        DeviceLocation::Bedroom,
        DeviceLocation::Kitchen,
        DeviceLocation::Bathroom,
        DeviceLocation::Office,
        DeviceLocation::Hallway,
        DeviceLocation::DiningRoom,
    ];

    pub fn is_indoor(self) -> bool {
        Self::INDOOR.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceLocation::LivingRoom => "living_room",
            DeviceLocation::Bedroom => "bedroom",
            DeviceLocation::Kitchen => "kitchen",
            DeviceLocation::Bathroom => "bathroom",
            DeviceLocation::Office => "office",
            DeviceLocation::Garage => "garage",
            DeviceLocation::Garden => "garden",
            DeviceLocation::Hallway => "hallway",
            DeviceLocation::DiningRoom => "dining_room",
            DeviceLocation::Basement => "basement",
        }
    }
}

impl fmt::Display for DeviceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Thermostat,
    Bulb,
    Camera,
}

impl DeviceType {
    /// Resolves the wire discriminator. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "THERMOSTAT" => Some(DeviceType::Thermostat),
            "BULB" => Some(DeviceType::Bulb),
            "CAMERA" => Some(DeviceType::Camera),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Thermostat => "THERMOSTAT",
            DeviceType::Bulb => "BULB",
            DeviceType::Camera => "CAMERA",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a device is. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub id: Uuid,
    pub name: String,
    pub location: DeviceLocation,
    pub device_type: DeviceType,
}

impl DeviceIdentity {
    pub fn new(name: impl Into<String>, location: DeviceLocation, device_type: DeviceType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location,
            device_type,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] in {}", self.name, self.id, self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatReading {
    pub current_temp: f64,
    pub target_temp: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulbReading {
    pub is_on: bool,
    #[serde(deserialize_with = "utils::deserialize_brightness")]
    pub brightness: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraReading {
    pub motion_detected: bool,
    pub battery_level: f64,
    #[serde(deserialize_with = "utils::deserialize_optional_timestamp")]
    pub last_snapshot: Option<DateTime<Utc>>,
    pub is_on: bool,
}

/// Variant-specific part of a payload, tagged on the wire by `device_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reading {
    Thermostat(ThermostatReading),
    Bulb(BulbReading),
    Camera(CameraReading),
}

impl Reading {
    pub fn device_type(&self) -> DeviceType {
        match self {
            Reading::Thermostat(_) => DeviceType::Thermostat,
            Reading::Bulb(_) => DeviceType::Bulb,
            Reading::Camera(_) => DeviceType::Camera,
        }
    }
}

/// A decoded status snapshot of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePayload {
    pub device_id: Uuid,
    pub name: String,
    pub location: DeviceLocation,
    #[serde(flatten)]
    pub reading: Reading,
}

impl DevicePayload {
    pub fn new(identity: &DeviceIdentity, reading: Reading) -> Self {
        Self {
            device_id: identity.id,
            name: identity.name.clone(),
            location: identity.location,
            reading,
        }
    }

    pub fn device_type(&self) -> DeviceType {
        self.reading.device_type()
    }
}

/// The `payload` object of a packet: a payload without the envelope's device id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub name: String,
    pub location: DeviceLocation,
    #[serde(flatten)]
    pub reading: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub device_id: Uuid,
    #[serde(deserialize_with = "utils::deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub payload: StatusReport,
}

impl Packet {
    pub fn new(payload: DevicePayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id: payload.device_id,
            timestamp,
            payload: StatusReport {
                name: payload.name,
                location: payload.location,
                reading: payload.reading,
            },
        }
    }

    pub fn into_payload(self) -> DevicePayload {
        DevicePayload {
            device_id: self.device_id,
            name: self.payload.name,
            location: self.payload.location,
            reading: self.payload.reading,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalEventKind {
    LowTemperature,
    HighTemperature,
    LowHumidity,
    HighHumidity,
    MotionDetected,
    LowBattery,
}

impl CriticalEventKind {
    #[cfg(test)]
    pub const ALL: [CriticalEventKind; 6] = [
        CriticalEventKind::LowTemperature,
        CriticalEventKind::HighTemperature,
        CriticalEventKind::LowHumidity,
        CriticalEventKind::HighHumidity,
        CriticalEventKind::MotionDetected,
        CriticalEventKind::LowBattery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CriticalEventKind::LowTemperature => "low_temperature",
            CriticalEventKind::HighTemperature => "high_temperature",
            CriticalEventKind::LowHumidity => "low_humidity",
            CriticalEventKind::HighHumidity => "high_humidity",
            CriticalEventKind::MotionDetected => "motion_detected",
            CriticalEventKind::LowBattery => "low_battery",
        }
    }
}

impl fmt::Display for CriticalEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
