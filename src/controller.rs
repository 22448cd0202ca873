// controller.rs
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::{
    commands::{CommandDispatcher, CommandOutcome},
    config::ControllerSettings,
    decoder::decode,
    devices::DeviceHandle,
    error::{DecodeError, RegistryError, StorageError},
    events::{self, Alert, EventBus},
    metrics::{self as house, HouseMetrics},
    models::{DeviceIdentity, DevicePayload},
    registry::DeviceRegistry,
    storage::StorageRelay,
};

/// Producer side of the packet inbox, handed to each connected device.
pub type Inbox = mpsc::UnboundedSender<String>;

pub fn inbox() -> (Inbox, mpsc::UnboundedReceiver<String>) {
    mpsc::unbounded_channel()
}

/// What one consume iteration did.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub received: usize,
    pub dropped: usize,
    pub rejected: usize,
    pub stored: usize,
    pub commands: Vec<CommandOutcome>,
    pub metrics: HouseMetrics,
}

pub struct Controller {
    inbox_tx: Inbox,
    inbox_rx: mpsc::UnboundedReceiver<String>,
    registry: DeviceRegistry,
    dispatcher: CommandDispatcher,
    bus: Arc<EventBus>,
    relay: StorageRelay,
    batch_limit: usize,
}

impl Controller {
    pub fn new(relay: StorageRelay, bus: Arc<EventBus>, settings: &ControllerSettings) -> Self {
        let (inbox_tx, inbox_rx) = inbox();
        Self {
            inbox_tx,
            inbox_rx,
            registry: DeviceRegistry::new(),
            dispatcher: CommandDispatcher::new(bus.clone()),
            bus,
            relay,
            batch_limit: settings.batch_limit.max(1),
        }
    }

    /// Registers a device and returns the inbox it must submit packets to.
    pub fn connect(
        &mut self,
        identity: DeviceIdentity,
        declared: DevicePayload,
        connection: DeviceHandle,
    ) -> Result<Inbox, RegistryError> {
        let device = identity.to_string();
        let device_type = identity.device_type;
        self.registry.register(identity, declared, connection)?;
        info!(%device, %device_type, "Device registered");
        Ok(self.inbox_tx.clone())
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Consumes packets until `shutdown` fires, then drains what is already
    /// queued, stops the storage worker and waits for it to exit.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<u64, StorageError> {
        info!("Controller started");
        let mut buffer = Vec::with_capacity(self.batch_limit);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                // The controller keeps its own sender, so the inbox never closes
                // and only `shutdown` ends the loop.
                _ = self.inbox_rx.recv_many(&mut buffer, self.batch_limit) => {
                    let batch = std::mem::take(&mut buffer);
                    match self.process_batch(batch).await {
                        Ok(report) => debug!(
                            received = report.received,
                            dropped = report.dropped,
                            rejected = report.rejected,
                            stored = report.stored,
                            commands = report.commands.len(),
                            "Batch processed"
                        ),
                        Err(e) => {
                            error!("Storage relay failed, stopping ingestion: {}", e);
                            return self.relay.shutdown().await;
                        }
                    }
                }
            }
        }

        let mut remaining = Vec::new();
        while let Ok(raw) = self.inbox_rx.try_recv() {
            remaining.push(raw);
        }
        if !remaining.is_empty() {
            debug!(packets = remaining.len(), "Draining inbox before shutdown");
            if let Err(e) = self.process_batch(remaining).await {
                error!("Storage relay failed during drain: {}", e);
            }
        }

        info!("Controller stopping, waiting for storage worker");
        self.relay.shutdown().await
    }

    /// Decode, update registry, classify and dispatch, aggregate, relay.
    ///
    /// Failures are isolated per packet. Only a dead storage worker aborts the batch.
    pub async fn process_batch(&mut self, packets: Vec<String>) -> Result<BatchReport, StorageError> {
        let received = packets.len();
        let mut dropped = 0;
        let mut decoded = Vec::with_capacity(received);
        for raw in &packets {
            match decode(raw) {
                Ok(payload) => decoded.push(payload),
                Err(DecodeError::UnknownDeviceType(device_type)) => {
                    dropped += 1;
                    warn!(%device_type, "Dropping packet from unsupported device type");
                }
                Err(e) => {
                    dropped += 1;
                    warn!("Dropping undecodable packet: {}", e);
                }
            }
        }

        let mut accepted = Vec::with_capacity(decoded.len());
        let mut rejected = 0;
        for payload in decoded {
            match self.registry.update(payload.device_id, payload.clone()) {
                Ok(()) => accepted.push(payload),
                Err(e) => {
                    rejected += 1;
                    let alert =
                        Alert::invariant_violation(Some(payload.device_id), format!("Registry rejected payload: {e}"));
                    error!(device_id = %payload.device_id, "{}", alert);
                    self.bus.publish(&alert);
                }
            }
        }

        let mut commands = Vec::new();
        for payload in &accepted {
            let Some(kind) = events::classify(payload) else {
                continue;
            };
            let Some(identity) = self.registry.identity(&payload.device_id).cloned() else {
                let alert = Alert::invariant_violation(
                    Some(payload.device_id),
                    format!("Accepted payload has no registry entry, {kind} not dispatched"),
                );
                error!(device_id = %payload.device_id, "{}", alert);
                self.bus.publish(&alert);
                continue;
            };
            match self.dispatcher.dispatch(&self.registry, &identity, kind).await {
                Ok(outcome) => commands.push(outcome),
                Err(e) => {
                    let alert = Alert::invariant_violation(
                        Some(identity.id),
                        format!("Could not dispatch {kind}: {e}"),
                    );
                    error!(device = %identity, "{}", alert);
                    self.bus.publish(&alert);
                }
            }
        }

        let metrics = house::compute(&self.registry.snapshot());
        house::record(&metrics);
        info!(
            average_temperature = metrics.average_temperature,
            average_humidity = metrics.average_humidity,
            total_connected_devices = metrics.total_connected_devices,
            "House metrics"
        );

        let stored = accepted.len();
        for payload in accepted {
            self.relay.enqueue(payload)?;
        }

        house::count_packets("decoded", stored);
        house::count_packets("dropped", dropped);
        house::count_packets("rejected", rejected);

        Ok(BatchReport {
            received,
            dropped,
            rejected,
            stored,
            commands,
            metrics,
        })
    }
}
