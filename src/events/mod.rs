// events/mod.rs
mod bus;

pub use bus::{Alert, AlertKind, EventBus};

use crate::models::{CameraReading, CriticalEventKind, DevicePayload, Reading, ThermostatReading};

pub const MIN_TEMPERATURE: f64 = 15.0;
pub const MAX_TEMPERATURE: f64 = 30.0;
pub const MIN_HUMIDITY: f64 = 15.0;
pub const MAX_HUMIDITY: f64 = 80.0;
pub const MIN_BATTERY: f64 = 15.0;

/// Returns the first critical condition a payload reports, if any.
///
/// Checks run in a fixed order per device type and only the first one that
/// fires is reported, so a camera seeing motion on a flat battery reports
/// `MotionDetected`.
pub fn classify(payload: &DevicePayload) -> Option<CriticalEventKind> {
    match &payload.reading {
        Reading::Thermostat(reading) => classify_thermostat(reading),
        Reading::Camera(reading) => classify_camera(reading),
        Reading::Bulb(_) => None,
    }
}

fn classify_thermostat(reading: &ThermostatReading) -> Option<CriticalEventKind> {
    if reading.current_temp < MIN_TEMPERATURE {
        Some(CriticalEventKind::LowTemperature)
    } else if reading.current_temp > MAX_TEMPERATURE {
        Some(CriticalEventKind::HighTemperature)
    } else if reading.humidity < MIN_HUMIDITY {
        Some(CriticalEventKind::LowHumidity)
    } else if reading.humidity > MAX_HUMIDITY {
        Some(CriticalEventKind::HighHumidity)
    } else {
        None
    }
}

fn classify_camera(reading: &CameraReading) -> Option<CriticalEventKind> {
    if reading.motion_detected {
        Some(CriticalEventKind::MotionDetected)
    } else if reading.battery_level < MIN_BATTERY {
        Some(CriticalEventKind::LowBattery)
    } else {
        None
    }
}
