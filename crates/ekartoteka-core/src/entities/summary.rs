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
use crate::snapshot::{HouseMeta, MeterCostSummary, SnapshotHandle};
use crate::units::{CURRENCY, DeviceClass};
use serde_json::{Map, Value};

/// Yearly settlement result for one metered utility.
#[derive(Debug)]
pub struct InvoiceSummarySensor {
    handle: SnapshotHandle,
    meta: HouseMeta,
    sensor_id: i64,
    unique_id: String,
    name: String,
}

impl InvoiceSummarySensor {
    pub fn new(handle: SnapshotHandle, meta: HouseMeta, sensor_id: i64, sensor_name: &str) -> Self {
        Self {
            unique_id: format!(
                "ekartoteka_meters_invoice_sum_{}_{sensor_id}",
                meta.house_id
            ),
            name: format!("{sensor_name} ({})", meta.house_id),
            sensor_id,
            handle,
            meta,
        }
    }

    fn summary(&self) -> Option<MeterCostSummary> {
        self.handle
            .current()
            .and_then(|snapshot| snapshot.usage_summary.get(&self.sensor_id).cloned())
    }
}

impl Sensor for InvoiceSummarySensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: (
                "eKartoteka_meters_invoice_sensor".to_owned(),
                self.meta.house_id.to_string(),
            ),
            name: format!("Meters invoice yearly sum ({})", self.meta.house_id),
            manufacturer: "eKartoteka",
            model: "meters_invoice_summary".to_owned(),
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
        self.summary().and_then(|summary| summary.settlement)
    }

    fn attributes(&self) -> Map<String, Value> {
        let summary = self.summary().unwrap_or_default();
        let mut attrs = Map::new();
        attrs.insert(
            "name".to_owned(),
            summary.name.map_or(Value::Null, Value::from),
        );
        attrs.insert("house_id".to_owned(), self.meta.house_id.into());
        attrs.insert(
            "house_name".to_owned(),
            self.meta.house_name.clone().into(),
        );
        attrs
    }
}
