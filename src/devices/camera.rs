// camera.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    commands::Command,
    error::CommandError,
    models::{CameraReading, DeviceIdentity, DeviceLocation, DevicePayload, DeviceType, Reading},
};

const IDLE_DRAIN: f64 = 1.0;
const RECORDING_DRAIN: f64 = 2.0;
/// Motion shows up on every n-th tick while the camera is powered.
const MOTION_EVERY: u64 = 12;

struct CameraState {
    is_on: bool,
    is_recording: bool,
    motion_detected: bool,
    battery_level: f64,
    last_snapshot: Option<DateTime<Utc>>,
    ticks: u64,
}

pub struct SmartCamera {
    identity: DeviceIdentity,
    state: RwLock<CameraState>,
}

impl SmartCamera {
    pub fn new(name: impl Into<String>, location: DeviceLocation, battery_level: f64) -> Self {
        Self {
            identity: DeviceIdentity::new(name, location, DeviceType::Camera),
            state: RwLock::new(CameraState {
                is_on: true,
                is_recording: false,
                motion_detected: false,
                battery_level,
                last_snapshot: None,
                ticks: 0,
            }),
        }
    }
}

#[async_trait]
impl super::Device for SmartCamera {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    async fn get_status(&self) -> DevicePayload {
        let state = self.state.read().await;
        DevicePayload::new(
            &self.identity,
            Reading::Camera(CameraReading {
                motion_detected: state.motion_detected,
                battery_level: state.battery_level,
                last_snapshot: state.last_snapshot,
                is_on: state.is_on,
            }),
        )
    }

    async fn execute_command(&self, command: Command) -> Result<(), CommandError> {
        let mut state = self.state.write().await;
        match command {
            Command::TakeSnapshot => {
                if state.is_on {
                    state.last_snapshot = Some(Utc::now());
                    state.motion_detected = false;
                } else {
                    debug!(device = %self.identity, "Camera is off, snapshot skipped");
                }
            }
            Command::TurnOn => state.is_on = true,
            Command::TurnOff => {
                state.is_on = false;
                state.is_recording = false;
                state.motion_detected = false;
            }
            Command::StartRecording if state.is_on => state.is_recording = true,
            Command::StartRecording => {
                debug!(device = %self.identity, "Camera is off, recording not started");
            }
            Command::StopRecording => state.is_recording = false,
            other => {
                return Err(CommandError::Unsupported {
                    command: other.to_string(),
                    device_type: DeviceType::Camera,
                });
            }
        }
        Ok(())
    }

    async fn update_state(&self) {
        let mut state = self.state.write().await;
        if !state.is_on {
            return;
        }
        state.ticks += 1;
        state.battery_level -= if state.is_recording {
            RECORDING_DRAIN
        } else {
            IDLE_DRAIN
        };
        if state.ticks % MOTION_EVERY == 0 {
            state.motion_detected = true;
        }
    }
}
