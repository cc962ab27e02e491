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

use super::{DeviceInfo, Sensor};
use crate::snapshot::{HouseMeta, SnapshotHandle};
use crate::units::{CURRENCY, DeviceClass};
use serde_json::{Map, Value};

/// Yearly cost of one metered utility for the house.
#[derive(Debug)]
pub struct MeterCostSensor {
    handle: SnapshotHandle,
    meta: HouseMeta,
    sensor_id: i64,
    unique_id: String,
    name: String,
}

impl MeterCostSensor {
    pub fn new(handle: SnapshotHandle, meta: HouseMeta, sensor_id: i64, sensor_name: &str) -> Self {
        Self {
            unique_id: format!("ekartoteka_meter_cost_{}_{sensor_id}", meta.house_id),
            name: format!("{sensor_name} ({sensor_id})"),
            sensor_id,
            handle,
            meta,
        }
    }
}

impl Sensor for MeterCostSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: (
                "eKartoteka_meter_sensor_cost".to_owned(),
                self.meta.house_id.to_string(),
            ),
            name: format!("Monthly utility bill for {}", self.meta.house_id),
            manufacturer: "eKartoteka",
            model: format!("Monthly utility bill for {}", self.meta.house_id),
        }
    }

    fn device_class(&self) -> Option<DeviceClass> {
        Some(DeviceClass::Monetary)
    }

    fn unit_of_measurement(&self) -> Option<&str> {
        Some(CURRENCY)
    }

    fn icon(&self) -> &'static str {
        "mdi:cash"
    }

    fn state(&self) -> Option<Value> {
        self.handle.current().and_then(|snapshot| {
            snapshot
                .usage_summary
                .get(&self.sensor_id)
                .and_then(|summary| summary.cost.clone())
        })
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("house_id".to_owned(), self.meta.house_id.into());
        attrs.insert(
            "house_name".to_owned(),
            self.meta.house_name.clone().into(),
        );
        attrs
    }
}
