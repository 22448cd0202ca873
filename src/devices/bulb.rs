// bulb.rs
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    commands::Command,
    error::CommandError,
    models::{BulbReading, DeviceIdentity, DeviceLocation, DevicePayload, DeviceType, Reading},
};

pub struct SmartBulb {
    identity: DeviceIdentity,
    is_on: RwLock<bool>,
    brightness: RwLock<u8>,
}

impl SmartBulb {
    pub fn new(name: impl Into<String>, location: DeviceLocation, brightness: u8) -> Self {
        let brightness = brightness.min(100);
        Self {
            identity: DeviceIdentity::new(name, location, DeviceType::Bulb),
            is_on: RwLock::new(brightness > 0),
            brightness: RwLock::new(brightness),
        }
    }
}

#[async_trait]
impl super::Device for SmartBulb {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn get_status(&self) -> DevicePayload {
        DevicePayload::new(
            &self.identity,
            Reading::Bulb(BulbReading {
                is_on: *self.is_on.read().await,
                brightness: *self.brightness.read().await,
            }),
        )
    }

    async fn execute_command(&self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::TurnOn => {
                *self.is_on.write().await = true;
                *self.brightness.write().await = 100;
                Ok(())
            }
            Command::TurnOff => {
                *self.is_on.write().await = false;
                *self.brightness.write().await = 0;
                Ok(())
            }
            Command::SetBrightness(brightness) => {
                *self.is_on.write().await = brightness > 0;
                *self.brightness.write().await = brightness;
                Ok(())
            }
            other => Err(CommandError::Unsupported {
                command: other.to_string(),
                device_type: DeviceType::Bulb,
            }),
        }
    }

    // Bulbs only change on command.
    async fn update_state(&self) {}
}
