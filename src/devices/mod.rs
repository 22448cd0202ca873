// devices/mod.rs
mod bulb;
mod camera;
mod thermostat;

pub use bulb::SmartBulb;
pub use camera::SmartCamera;
pub use thermostat::SmartThermostat;

use async_trait::async_trait;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

use crate::{
    commands::Command,
    config::DeviceSettings,
    controller::Inbox,
    error::CommandError,
    models::{DeviceIdentity, DevicePayload, Packet},
};

/// Capability to receive commands, held by the registry for each device.
pub type DeviceHandle = Arc<dyn Device>;

#[async_trait]
pub trait Device: Send + Sync {
    fn identity(&self) -> &DeviceIdentity;

    async fn get_status(&self) -> DevicePayload;

    async fn execute_command(&self, command: Command) -> Result<(), CommandError>;

    /// Advances the simulated state by one emit period.
    async fn update_state(&self);

    /// Accepts a raw command line. Anything the device cannot apply is logged and ignored.
    async fn receive(&self, line: &str) {
        let result = match line.parse::<Command>() {
            Ok(command) => self.execute_command(command).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!(device = %self.identity(), command = line, "Command applied"),
            Err(e) => warn!(device = %self.identity(), command = line, "Command ignored: {}", e),
        }
    }
}

pub fn build(settings: &DeviceSettings) -> DeviceHandle {
    match settings {
        DeviceSettings::Thermostat {
            name,
            location,
            current_temp,
            target_temp,
            humidity,
        } => Arc::new(SmartThermostat::new(
            name.clone(),
            *location,
            *current_temp,
            *target_temp,
            *humidity,
        )),
        DeviceSettings::Bulb {
            name,
            location,
            brightness,
        } => Arc::new(SmartBulb::new(name.clone(), *location, *brightness)),
        DeviceSettings::Camera {
            name,
            location,
            battery_level,
        } => Arc::new(SmartCamera::new(name.clone(), *location, *battery_level)),
    }
}

/// Emit loop of one device: every period, advance state and submit a status packet.
pub async fn run(device: DeviceHandle, inbox: Inbox, period: Duration) {
    info!(device = %device.identity(), "Device connected");
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;
        device.update_state().await;

        let packet = Packet::new(device.get_status().await, Utc::now());
        let raw = match serde_json::to_string(&packet) {
            Ok(raw) => raw,
            Err(e) => {
                error!(device = %device.identity(), "Failed to encode packet: {}", e);
                continue;
            }
        };

        if inbox.send(raw).is_err() {
            info!(device = %device.identity(), "Inbox closed, device stopping");
            break;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::inbox;
    use crate::decoder::decode;
    use crate::models::DeviceLocation;

    #[tokio::test]
    async fn run_emits_decodable_packets() {
        let device = build(&DeviceSettings::Bulb {
            name: "Porch Light".into(),
            location: DeviceLocation::Garden,
            brightness: 60,
        });
        let (tx, mut rx) = inbox();
        let task = tokio::spawn(run(device.clone(), tx, Duration::from_millis(10)));

        let first = rx.recv().await.expect("first packet");
        let second = rx.recv().await.expect("second packet");
        task.abort();

        for raw in [first, second] {
            let payload = decode(&raw).expect("decodes");
            assert_eq!(payload.device_id, device.identity().id);
            assert_eq!(payload.location, DeviceLocation::Garden);
        }
    }

    #[tokio::test]
    async fn run_stops_when_inbox_closes() {
        let device = build(&DeviceSettings::Bulb {
            name: "Porch Light".into(),
            location: DeviceLocation::Garden,
            brightness: 60,
        });
        let (tx, rx) = inbox();
        drop(rx);
        run(device, tx, Duration::from_millis(1)).await;
    }
}
