// thermostat.rs
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    commands::Command,
    error::CommandError,
    models::{
        DeviceIdentity, DeviceLocation, DevicePayload, DeviceType, Reading, ThermostatReading,
    },
};

const HEATING_STEP: f64 = 0.10;
const COOLING_STEP: f64 = 0.05;
const HEATING_HUMIDITY_STEP: f64 = 0.02;
const COOLING_HUMIDITY_STEP: f64 = 0.01;

pub struct SmartThermostat {
    identity: DeviceIdentity,
    state: RwLock<ThermostatReading>,
}

impl SmartThermostat {
    pub fn new(
        name: impl Into<String>,
        location: DeviceLocation,
        current_temp: f64,
        target_temp: f64,
        humidity: f64,
    ) -> Self {
        Self {
            identity: DeviceIdentity::new(name, location, DeviceType::Thermostat),
            state: RwLock::new(ThermostatReading {
                current_temp,
                target_temp,
                humidity,
            }),
        }
    }
}

#[async_trait]
impl super::Device for SmartThermostat {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn get_status(&self) -> DevicePayload {
        let reading = self.state.read().await.clone();
        DevicePayload::new(&self.identity, Reading::Thermostat(reading))
    }

    async fn execute_command(&self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::SetTargetTemp(target) => {
                self.state.write().await.target_temp = target;
                Ok(())
            }
            other => Err(CommandError::Unsupported {
                command: other.to_string(),
                device_type: DeviceType::Thermostat,
            }),
        }
    }

    async fn update_state(&self) {
        let mut state = self.state.write().await;
        if state.current_temp < state.target_temp {
            state.current_temp += HEATING_STEP;
            if state.humidity < 100.0 {
                state.humidity += HEATING_HUMIDITY_STEP;
            }
        } else if state.current_temp > state.target_temp {
            state.current_temp -= COOLING_STEP;
            if state.humidity > 0.0 {
                state.humidity -= COOLING_HUMIDITY_STEP;
            }
        }
    }
}
