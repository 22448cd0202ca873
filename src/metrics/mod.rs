// metrics/mod.rs
use ::metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use serde::Serialize;
use std::net::SocketAddr;

use crate::{
    events::{AlertKind, EventBus},
    models::Reading,
    registry::RegistrySnapshot,
};

/// House-wide summary derived from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseMetrics {
    pub average_temperature: f64,
    pub average_humidity: f64,
    pub total_connected_devices: usize,
}

/// Averages cover thermostats in indoor rooms only; every device counts toward the total.
pub fn compute(snapshot: &RegistrySnapshot) -> HouseMetrics {
    let (temperature_sum, humidity_sum, thermostats) = snapshot
        .values()
        .filter(|payload| payload.location.is_indoor())
        .filter_map(|payload| match &payload.reading {
            Reading::Thermostat(reading) => Some(reading),
            _ => None,
        })
        .fold((0.0, 0.0, 0usize), |(temp, humidity, count), reading| {
            (temp + reading.current_temp, humidity + reading.humidity, count + 1)
        });

    let average = |sum: f64| {
        if thermostats == 0 {
            0.0
        } else {
            sum / thermostats as f64
        }
    };

    HouseMetrics {
        average_temperature: average(temperature_sum),
        average_humidity: average(humidity_sum),
        total_connected_devices: snapshot.len(),
    }
}

pub fn setup_metrics(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()
}

pub fn record(summary: &HouseMetrics) {
    gauge!("house_average_temperature_celsius").set(summary.average_temperature);
    gauge!("house_average_humidity_percent").set(summary.average_humidity);
    gauge!("house_connected_devices").set(summary.total_connected_devices as f64);
}

pub fn count_packets(outcome: &'static str, count: usize) {
    if count > 0 {
        counter!("telemetry_packets_total", "outcome" => outcome).increment(count as u64);
    }
}

pub fn count_alerts(bus: &EventBus) {
    for kind in [AlertKind::CorrectiveAction, AlertKind::InvariantViolation] {
        bus.subscribe(kind, move |_| {
            counter!("telemetry_alerts_total", "kind" => kind.as_str()).increment(1);
        });
    }
}
