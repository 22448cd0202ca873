// registry.rs
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    devices::DeviceHandle,
    error::RegistryError,
    models::{DeviceIdentity, DevicePayload},
};

/// Point-in-time copy of every registered device and its latest payload.
pub type RegistrySnapshot = HashMap<DeviceIdentity, DevicePayload>;

struct RegistryEntry {
    identity: DeviceIdentity,
    connection: DeviceHandle,
    latest: DevicePayload,
}

/// Devices known to the controller. Owned and mutated by the consume loop only.
#[derive(Default)]
pub struct DeviceRegistry {
    entries: HashMap<Uuid, RegistryEntry>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        identity: DeviceIdentity,
        declared: DevicePayload,
        connection: DeviceHandle,
    ) -> Result<DeviceHandle, RegistryError> {
        if self.entries.contains_key(&identity.id) {
            return Err(RegistryError::AlreadyRegistered(identity.id));
        }
        if declared.device_id != identity.id {
            return Err(RegistryError::UnknownDevice(declared.device_id));
        }
        check_type(&identity, &declared)?;

        let handle = connection.clone();
        self.entries.insert(
            identity.id,
            RegistryEntry {
                identity,
                connection,
                latest: declared,
            },
        );
        Ok(handle)
    }

    /// Replaces the latest payload of a registered device (last write wins).
    pub fn update(&mut self, device_id: Uuid, payload: DevicePayload) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(&device_id)
            .ok_or(RegistryError::UnknownDevice(device_id))?;
        check_type(&entry.identity, &payload)?;
        entry.latest = payload;
        Ok(())
    }

    pub fn identity(&self, device_id: &Uuid) -> Option<&DeviceIdentity> {
        self.entries.get(device_id).map(|entry| &entry.identity)
    }

    pub fn connection(&self, identity: &DeviceIdentity) -> Option<&DeviceHandle> {
        self.entries
            .get(&identity.id)
            .map(|entry| &entry.connection)
    }

    #[cfg(test)]
    pub fn latest(&self, device_id: &Uuid) -> Option<&DevicePayload> {
        self.entries.get(device_id).map(|entry| &entry.latest)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.entries
            .values()
            .map(|entry| (entry.identity.clone(), entry.latest.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_type(identity: &DeviceIdentity, payload: &DevicePayload) -> Result<(), RegistryError> {
    let found = payload.device_type();
    if found != identity.device_type {
        return Err(RegistryError::TypeMismatch {
            device_id: identity.id,
            expected: identity.device_type,
            found,
        });
    }
    Ok(())
}
