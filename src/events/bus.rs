// bus.rs
use dashmap::DashMap;
use std::fmt;
use uuid::Uuid;

use crate::models::{CriticalEventKind, DeviceIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// A critical event was detected and a corrective command sent.
    CorrectiveAction,
    /// Something structurally wrong: spoofed ids, missing registry entries, storage loss.
    InvariantViolation,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::CorrectiveAction => "corrective_action",
            AlertKind::InvariantViolation => "invariant_violation",
        }
    }
}

/// A human-readable alert line.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub device_id: Option<Uuid>,
    pub event: Option<CriticalEventKind>,
    pub message: String,
}

impl Alert {
    pub fn corrective_action(
        device: &DeviceIdentity,
        event: CriticalEventKind,
        command: &str,
    ) -> Self {
        Self {
            kind: AlertKind::CorrectiveAction,
            device_id: Some(device.id),
            event: Some(event),
            message: format!("{event} on {device}: sending `{command}`"),
        }
    }

    pub fn invariant_violation(device_id: Option<Uuid>, message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::InvariantViolation,
            device_id,
            event: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

type Subscriber = Box<dyn Fn(&Alert) + Send + Sync>;

pub struct EventBus {
    subscribers: DashMap<AlertKind, Vec<Subscriber>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    pub fn publish(&self, alert: &Alert) {
        if let Some(subscribers) = self.subscribers.get(&alert.kind) {
            for callback in subscribers.iter() {
                (callback)(alert);
            }
        }
    }

    pub fn subscribe<F: Fn(&Alert) + Send + Sync + 'static>(&self, kind: AlertKind, callback: F) {
        self.subscribers
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }
}
