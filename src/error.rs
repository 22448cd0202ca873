// error.rs
use thiserror::Error;
use uuid::Uuid;

use crate::models::DeviceType;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed packet: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Packet has no device_type discriminator")]
    MissingDeviceType,
    #[error("Unsupported device type: {0}")]
    UnknownDeviceType(String),
    #[error("Invalid {device_type} payload: {source}")]
    InvalidPayload {
        device_type: DeviceType,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown device: {0}")]
    UnknownDevice(Uuid),
    #[error("Device already registered: {0}")]
    AlreadyRegistered(Uuid),
    #[error("Device {device_id} is a {expected}, got a {found} payload")]
    TypeMismatch {
        device_id: Uuid,
        expected: DeviceType,
        found: DeviceType,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Device not found: {0}")]
    DeviceNotFound(Uuid),
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownVerb(String),
    #[error("Command {0} requires a value")]
    MissingValue(&'static str),
    #[error("Invalid value {value:?} for command {verb}")]
    InvalidValue { verb: &'static str, value: String },
    #[error("Unsupported command {command} for {device_type}")]
    Unsupported {
        command: String,
        device_type: DeviceType,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage worker is no longer accepting records")]
    WorkerStopped,
    #[error("Storage worker panicked")]
    WorkerPanicked,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid config: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
