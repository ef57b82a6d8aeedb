//! # smartfarmd — smartfarm daemon
//!
//! Composition root that seeds the simulated installation and runs the
//! messaging fabric until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Build the device registry from the `[simulator]` section
//! - Wire the fabric (router, dispatcher, history, scheduler)
//! - Announce every actuator on its registry topic
//! - Start periodic telemetry
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use smartfarm_adapter_simulator::DeviceRegistry;
use smartfarm_app::fabric::Fabric;
use smartfarm_domain::envelope::Envelope;
use smartfarm_domain::topic::legacy;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .compact()
        .init();

    // Devices
    let registry = Arc::new(DeviceRegistry::from_config(&config.simulator)?);

    // Fabric
    let settings = config.fabric_settings();
    let fabric = Fabric::new(registry, &settings)?;
    fabric.router().subscribe(legacy::CONTROL_ERROR, |_, envelope| {
        if let Envelope::Alert(alert) = envelope {
            tracing::warn!(device_id = ?alert.device_id, message = %alert.message, "control alert");
        }
        Ok(())
    })?;

    let announced = fabric.announce_devices();
    tracing::info!(actuators = announced, "devices announced");

    if config.telemetry.enabled {
        fabric.start();
    }
    tracing::info!(
        interval = ?settings.telemetry_interval,
        scheme = ?settings.telemetry_scheme,
        telemetry = config.telemetry.enabled,
        "smartfarmd running"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    fabric.shutdown().await;

    let status = fabric.dispatcher().system_status();
    tracing::info!(
        commands = fabric.history().total_recorded(),
        messages = fabric.router().status().total_messages,
        health = ?status.system_health,
        "smartfarmd stopped"
    );
    Ok(())
}
