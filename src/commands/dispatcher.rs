// dispatcher.rs
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::Command;
use crate::{
    error::DispatchError,
    events::{Alert, EventBus},
    models::{CriticalEventKind, DeviceIdentity},
    registry::DeviceRegistry,
};

/// Corrective command for each critical event.
pub fn corrective_command(kind: CriticalEventKind) -> Command {
    match kind {
        CriticalEventKind::LowTemperature => Command::SetTargetTemp(20.0),
        CriticalEventKind::HighTemperature => Command::SetTargetTemp(17.0),
        CriticalEventKind::LowHumidity => Command::SetTargetTemp(22.0),
        CriticalEventKind::HighHumidity => Command::SetTargetTemp(18.0),
        CriticalEventKind::MotionDetected => Command::TakeSnapshot,
        CriticalEventKind::LowBattery => Command::TurnOff,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub device_id: Uuid,
    pub kind: CriticalEventKind,
    pub command: Command,
}

/// Sends corrective commands back to the device that raised the event.
///
/// Whether a command has any effect is up to the device; the dispatcher does
/// not look at device state.
pub struct CommandDispatcher {
    bus: Arc<EventBus>,
}

impl CommandDispatcher {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    pub async fn dispatch(
        &self,
        registry: &DeviceRegistry,
        identity: &DeviceIdentity,
        kind: CriticalEventKind,
    ) -> Result<CommandOutcome, DispatchError> {
        let connection = registry
            .connection(identity)
            .ok_or(DispatchError::DeviceNotFound(identity.id))?;

        let command = corrective_command(kind);
        let line = command.to_string();
        let alert = Alert::corrective_action(identity, kind, &line);
        warn!(device_id = %identity.id, event = %kind, command = %line, "{}", alert);
        self.bus.publish(&alert);

        connection.receive(&line).await;

        Ok(CommandOutcome {
            device_id: identity.id,
            kind,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::testing::RecordingDevice;
    use crate::devices::Device;
    use crate::events::AlertKind;
    use crate::models::{DeviceLocation, DeviceType};
    use std::sync::Mutex;

    const TABLE: [(CriticalEventKind, &str); 6] = [
        (CriticalEventKind::LowTemperature, "set_target_temp 20.0"),
        (CriticalEventKind::HighTemperature, "set_target_temp 17.0"),
        (CriticalEventKind::LowHumidity, "set_target_temp 22.0"),
        (CriticalEventKind::HighHumidity, "set_target_temp 18.0"),
        (CriticalEventKind::MotionDetected, "take_snapshot"),
        (CriticalEventKind::LowBattery, "turn_off"),
    ];

    async fn register(
        registry: &mut DeviceRegistry,
        name: &str,
        device_type: DeviceType,
    ) -> Arc<RecordingDevice> {
        let identity = DeviceIdentity::new(name, DeviceLocation::Office, device_type);
        let device = Arc::new(RecordingDevice::new(identity.clone()));
        let declared = device.get_status().await;
        registry
            .register(identity, declared, device.clone())
            .expect("registers");
        device
    }

    #[test]
    fn table_covers_every_kind() {
        for kind in CriticalEventKind::ALL {
            let (_, expected) = TABLE.iter().find(|(k, _)| *k == kind).unwrap();
            assert_eq!(corrective_command(kind).to_string(), *expected);
        }
    }

    #[tokio::test]
    async fn sends_exactly_the_table_command_to_the_source_device() {
        for (kind, expected) in TABLE {
            let mut registry = DeviceRegistry::new();
            let target = register(&mut registry, "Target", DeviceType::Thermostat).await;
            let bystander = register(&mut registry, "Bystander", DeviceType::Camera).await;
            let dispatcher = CommandDispatcher::new(Arc::new(EventBus::new()));

            let outcome = dispatcher
                .dispatch(&registry, target.identity(), kind)
                .await
                .expect("dispatches");

            assert_eq!(outcome.device_id, target.identity().id);
            assert_eq!(outcome.command.to_string(), expected);
            let received: Vec<String> =
                target.received().iter().map(ToString::to_string).collect();
            assert_eq!(received, [expected]);
            assert!(bystander.received().is_empty());
        }
    }

    #[tokio::test]
    async fn publishes_a_corrective_action_alert() {
        let mut registry = DeviceRegistry::new();
        let camera = register(&mut registry, "Porch Camera", DeviceType::Camera).await;
        let bus = Arc::new(EventBus::new());
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let sink = alerts.clone();
        bus.subscribe(AlertKind::CorrectiveAction, move |alert| {
            sink.lock().unwrap().push(alert.clone());
        });

        CommandDispatcher::new(bus)
            .dispatch(&registry, camera.identity(), CriticalEventKind::MotionDetected)
            .await
            .unwrap();

        let alerts = alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].device_id, Some(camera.identity().id));
        assert_eq!(alerts[0].event, Some(CriticalEventKind::MotionDetected));
        assert!(alerts[0].message.contains("take_snapshot"));
    }

    #[tokio::test]
    async fn unknown_identity_is_device_not_found() {
        let registry = DeviceRegistry::new();
        let ghost = DeviceIdentity::new("Ghost", DeviceLocation::Basement, DeviceType::Camera);
        let err = CommandDispatcher::new(Arc::new(EventBus::new()))
            .dispatch(&registry, &ghost, CriticalEventKind::LowBattery)
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::DeviceNotFound(ghost.id));
    }
}
