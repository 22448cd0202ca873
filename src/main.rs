// main.rs
mod commands;
mod config;
mod controller;
mod decoder;
mod devices;
mod error;
mod events;
mod metrics;
mod models;
mod registry;
mod storage;
mod utils;

use anyhow::Context;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinSet};
use tracing_subscriber::EnvFilter;

use controller::Controller;
use events::EventBus;
use storage::StorageRelay;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::Settings::new()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    let bus = Arc::new(EventBus::new());
    if settings.metrics.enabled {
        crate::metrics::setup_metrics(settings.metrics.port)
            .context("Failed to install Prometheus exporter")?;
        tracing::info!("Metrics exported on port {}", settings.metrics.port);
    }
    crate::metrics::count_alerts(&bus);

    let relay = StorageRelay::open(&settings.storage).context("Failed to open storage log")?;
    let mut controller = Controller::new(relay, bus, &settings.controller);

    let period = Duration::from_secs(settings.simulation.emit_interval_secs);
    let mut device_tasks = JoinSet::new();
    for device_settings in &settings.devices {
        let device = devices::build(device_settings);
        let declared = device.get_status().await;
        let inbox = controller
            .connect(device.identity().clone(), declared, device.clone())
            .context("Failed to register device")?;
        device_tasks.spawn(devices::run(device, inbox, period));
    }

    if controller.registry().is_empty() {
        tracing::warn!("No devices configured, waiting for shutdown");
    }
    tracing::info!(devices = controller.registry().len(), "Home telemetry started");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = tokio::spawn(controller.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    device_tasks.abort_all();
    while device_tasks.join_next().await.is_some() {}

    // The controller may already have stopped on a storage failure.
    let _ = shutdown_tx.send(true);
    let written = consumer
        .await
        .context("Controller task failed")?
        .context("Storage worker failed")?;

    tracing::info!(written, "Shutdown complete");
    Ok(())
}
