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

//! House discovery and entity construction.
//!
//! Mirrors the platform setup flow: list houses, build one coordinator per
//! house, force its first refresh, then derive the full sensor set from the
//! resulting snapshot plus the sensor-kind and usage-summary lookups.

use crate::coordinator::{HouseCoordinator, UpdateFailed};
use crate::entities::{InvoiceEntrySensor, InvoiceSummarySensor, MeterCostSensor, MeterSensor, Sensor};
use crate::snapshot::HouseMeta;
use ekartoteka_client::{ClientError, EkartotekaClient, HouseRow};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything built for one house: the coordinator driving its refreshes and
/// the sensors projecting its snapshot.
pub struct HouseEntities {
    pub coordinator: Arc<HouseCoordinator>,
    pub sensors: Vec<Box<dyn Sensor>>,
}

impl std::fmt::Debug for HouseEntities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HouseEntities")
            .field("coordinator", &self.coordinator)
            .field("sensors", &self.sensors.len())
            .finish()
    }
}

/// Enumerate houses and build entities per house. A house whose build fails
/// is logged and skipped without aborting its siblings; a failed house list
/// propagates.
pub async fn build_all(client: &Arc<EkartotekaClient>) -> Result<Vec<HouseEntities>, ClientError> {
    let houses = client.house_list().await?;
    if houses.is_empty() {
        warn!("No houses returned by API");
    }

    let mut built = Vec::new();
    for house in &houses {
        match build_house(client, house).await {
            Ok(Some(entities)) => {
                info!(
                    "Built {} sensors for house {}",
                    entities.sensors.len(),
                    entities.coordinator.house_id()
                );
                built.push(entities);
            }
            Ok(None) => {}
            Err(err) => error!("Failed to build entities for house {:?}: {err}", house.id),
        }
    }
    Ok(built)
}

async fn build_house(
    client: &Arc<EkartotekaClient>,
    house: &HouseRow,
) -> Result<Option<HouseEntities>, UpdateFailed> {
    let Some(coordinator) = HouseCoordinator::new(client.clone(), house) else {
        warn!("Skipping house without IdADo: {house:?}");
        return Ok(None);
    };
    let coordinator = Arc::new(coordinator);
    let house_id = coordinator.house_id();

    // Entities are only created once data is known to be fetchable.
    let snapshot = coordinator.refresh().await?;
    let handle = coordinator.handle();
    let meta = HouseMeta {
        house_id,
        house_name: coordinator.house_name().to_owned(),
    };

    let mut sensors: Vec<Box<dyn Sensor>> = Vec::new();

    // Yearly settlement summary and cost per metered utility.
    let summary_rows = client
        .usage_summary(house_id)
        .await
        .map_err(|source| UpdateFailed { house_id, source })?;
    for row in &summary_rows {
        if let Some(sensor_id) = row.id_el_op {
            let sensor_name = row.nazwa.as_deref().unwrap_or_default();
            sensors.push(Box::new(InvoiceSummarySensor::new(
                handle.clone(),
                meta.clone(),
                sensor_id,
                sensor_name,
            )));
            sensors.push(Box::new(MeterCostSensor::new(
                handle.clone(),
                meta.clone(),
                sensor_id,
                sensor_name,
            )));
        }
    }

    // One sensor per line of each apartment's newest invoice.
    for (entry_name, entry) in &snapshot.last_invoice {
        sensors.push(Box::new(InvoiceEntrySensor::new(
            handle.clone(),
            meta.clone(),
            entry_name,
            entry.apartment_id,
        )));
    }

    // Meter readings need unit and name metadata from the sensor-kind list.
    let sensor_rows = client
        .sensor_list(house_id)
        .await
        .map_err(|source| UpdateFailed { house_id, source })?;
    let mut sensor_meta: HashMap<i64, (i64, String, String)> = HashMap::new();
    for row in sensor_rows {
        if let Some(sensor_id) = row.id_el_op {
            sensor_meta.insert(
                sensor_id,
                (
                    row.id_gru.unwrap_or(0),
                    row.jm.as_deref().unwrap_or_default().trim().to_owned(),
                    row.nazwa.unwrap_or_else(|| sensor_id.to_string()),
                ),
            );
        }
    }

    for key in snapshot.meters.keys() {
        let Some((group_id, unit, name)) = sensor_meta.get(&key.sensor_id) else {
            continue;
        };
        sensors.push(Box::new(MeterSensor::new(
            handle.clone(),
            meta.clone(),
            key.apartment_id,
            key.sensor_id,
            *group_id,
            unit,
            name,
        )));
    }

    Ok(Some(HouseEntities {
        coordinator,
        sensors,
    }))
}
