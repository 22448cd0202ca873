// config/mod.rs
use config::Config;
use serde::Deserialize;
use validator::Validate;

use crate::{error::SettingsError, models::DeviceLocation};

#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub controller: ControllerSettings,
    #[validate(nested)]
    pub simulation: SimulationSettings,
    #[validate(nested)]
    pub storage: StorageSettings,
    #[validate(nested)]
    pub metrics: MetricsSettings,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceSettings>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ControllerSettings {
    /// Upper bound on packets taken from the inbox per iteration.
    #[validate(range(min = 1))]
    pub batch_limit: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SimulationSettings {
    #[validate(range(min = 1))]
    pub emit_interval_secs: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StorageSettings {
    #[validate(length(min = 1))]
    pub path: String,
    pub sync: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MetricsSettings {
    pub enabled: bool,
    #[validate(range(min = 1))]
    pub port: u16,
}

/// A simulated device to start with the controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "device_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceSettings {
    Thermostat {
        name: String,
        location: DeviceLocation,
        current_temp: f64,
        target_temp: f64,
        humidity: f64,
    },
    Bulb {
        name: String,
        location: DeviceLocation,
        brightness: u8,
    },
    Camera {
        name: String,
        location: DeviceLocation,
        battery_level: f64,
    },
}

fn default_devices() -> Vec<DeviceSettings> {
    vec![
        DeviceSettings::Camera {
            name: "Garage Camera".into(),
            location: DeviceLocation::Garage,
            battery_level: 20.0,
        },
        DeviceSettings::Bulb {
            name: "Bedroom Light".into(),
            location: DeviceLocation::Bedroom,
            brightness: 100,
        },
        DeviceSettings::Thermostat {
            name: "Living Room Thermostat".into(),
            location: DeviceLocation::LivingRoom,
            current_temp: 12.0,
            target_temp: 23.0,
            humidity: 30.0,
        },
    ]
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        Self::load("config/config")
    }

    /// Defaults, then the optional file at `path`, then `APP_*` environment variables.
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("controller.batch_limit", 1024_i64)?
            .set_default("simulation.emit_interval_secs", 5_i64)?
            .set_default("storage.path", "data/telemetry.log")?
            .set_default("storage.sync", false)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.port", 9000_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}
