// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of eKartoteka Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! eKartoteka Bridge - entry point.
//!
//! Discovers houses on the configured account, builds one coordinator and
//! sensor set per house, then refreshes every house on a fixed interval and
//! logs the resulting sensor states.

mod config;

use anyhow::Result;
use config::BridgeConfig;
use ekartoteka_client::EkartotekaClient;
use ekartoteka_core::{HouseEntities, Refreshable, Sensor, build_all};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let mut config_path = config::DEFAULT_CONFIG_PATH.to_owned();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("eKartoteka Bridge - utility billing sensors");
                println!("Version: {VERSION}");
                println!();
                println!("Usage: ekartoteka-bridge [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: config.toml)");
                println!("  -h, --help           Print this help message");
                println!("  -v, --version        Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{VERSION}");
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path.clone_from(path),
                    None => anyhow::bail!("--config requires a path"),
                }
            }
            other => anyhow::bail!("Unknown argument: {other}"),
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting eKartoteka Bridge v{VERSION}");

    let config = BridgeConfig::load_or_env(Path::new(&config_path))?;
    info!(
        "Loaded config: user={}, update_interval={}h",
        config.username, config.update_interval_hours
    );

    let client = match &config.api_base_url {
        Some(base_url) => {
            info!("Using custom API base URL: {base_url}");
            EkartotekaClient::with_base_url(base_url, &config.username, &config.password)?
        }
        None => EkartotekaClient::new(&config.username, &config.password)?,
    };
    let client = Arc::new(client);

    // Discovery runs each house's first refresh synchronously.
    let houses = build_all(&client).await?;
    if houses.is_empty() {
        anyhow::bail!("No usable houses found for this account");
    }
    info!(
        "Discovered {} house(s), {} sensor(s) total",
        houses.len(),
        houses.iter().map(|h| h.sensors.len()).sum::<usize>()
    );
    report(&houses);

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.update_interval_hours * 3600));
    // The first tick fires immediately; discovery already refreshed.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = interval.tick() => {
                refresh_all(&houses).await;
                report(&houses);
            }
        }
    }

    Ok(())
}

/// Houses are refreshed sequentially; a failed cycle keeps the previous
/// snapshot and is retried at the next tick.
async fn refresh_all(houses: &[HouseEntities]) {
    for house in houses {
        let coordinator: &dyn Refreshable = house.coordinator.as_ref();
        match coordinator.refresh_cycle().await {
            Ok(()) => {
                if let Some(snapshot) = house.coordinator.snapshot() {
                    info!(
                        "Refreshed {}: {} meters, {} invoice lines, {} summary rows",
                        coordinator.label(),
                        snapshot.meters.len(),
                        snapshot.last_invoice.len(),
                        snapshot.usage_summary.len()
                    );
                }
            }
            Err(err) => error!("{err}"),
        }
    }
}

fn report(houses: &[HouseEntities]) {
    for house in houses {
        info!(
            "House {} ({}):",
            house.coordinator.house_id(),
            house.coordinator.house_name()
        );
        for sensor in &house.sensors {
            let state = sensor
                .state()
                .map_or_else(|| "unknown".to_owned(), |value| value.to_string());
            match sensor.unit_of_measurement() {
                Some(unit) => info!("  {} = {state} {unit}", sensor.unique_id()),
                None => info!("  {} = {state}", sensor.unique_id()),
            }
        }
    }
}
