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
use crate::snapshot::{HouseMeta, MeterKey, MeterReading, SnapshotHandle};
use crate::units::{DeviceClass, UnitMapping, map_unit};
use serde_json::{Map, Value};

/// Per-apartment utility meter reading (water, heat).
#[derive(Debug)]
pub struct MeterSensor {
    handle: SnapshotHandle,
    meta: HouseMeta,
    key: MeterKey,
    unique_id: String,
    name: String,
    mapping: UnitMapping,
}

impl MeterSensor {
    pub fn new(
        handle: SnapshotHandle,
        meta: HouseMeta,
        apartment_id: i64,
        sensor_id: i64,
        group_id: i64,
        unit: &str,
        sensor_name: &str,
    ) -> Self {
        Self {
            unique_id: format!(
                "ekartoteka_meter_{}_{apartment_id}_{group_id}_{sensor_id}",
                meta.house_id
            ),
            name: format!("{sensor_name} ({sensor_id})"),
            mapping: map_unit(Some(unit)),
            key: MeterKey {
                apartment_id,
                sensor_id,
            },
            handle,
            meta,
        }
    }

    fn reading(&self) -> Option<MeterReading> {
        self.handle
            .current()
            .and_then(|snapshot| snapshot.meters.get(&self.key).cloned())
    }
}

impl Sensor for MeterSensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: (
                "eKartoteka_meter_sensor".to_owned(),
                self.key.sensor_id.to_string(),
            ),
            name: self.name.clone(),
            manufacturer: "eKartoteka",
            model: self.key.sensor_id.to_string(),
        }
    }

    fn device_class(&self) -> Option<DeviceClass> {
        self.mapping.device_class
    }

    fn unit_of_measurement(&self) -> Option<&str> {
        self.mapping.unit.as_deref()
    }

    fn icon(&self) -> &'static str {
        "mdi:file-document"
    }

    fn state(&self) -> Option<Value> {
        self.reading().and_then(|reading| reading.value)
    }

    fn attributes(&self) -> Map<String, Value> {
        let reading = self.reading().unwrap_or_default();
        let mut attrs = Map::new();
        attrs.insert("type".to_owned(), reading.kind.unwrap_or(Value::Null));
        attrs.insert(
            "read_date".to_owned(),
            reading.read_date.unwrap_or(Value::Null),
        );
        attrs.insert("house_id".to_owned(), self.meta.house_id.into());
        attrs.insert(
            "house_name".to_owned(),
            self.meta.house_name.clone().into(),
        );
        attrs.insert("apartment_id".to_owned(), self.key.apartment_id.into());
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use serde_json::json;

    fn meta() -> HouseMeta {
        HouseMeta {
            house_id: 5,
            house_name: "Osiedle A".to_owned(),
        }
    }

    fn sensor(handle: SnapshotHandle) -> MeterSensor {
        MeterSensor::new(handle, meta(), 1, 10, 3, "m3", "Cold water")
    }

    #[test]
    fn test_state_reads_published_snapshot() {
        let handle = SnapshotHandle::new();
        let mut snapshot = Snapshot::empty(meta());
        snapshot.meters.insert(
            MeterKey {
                apartment_id: 1,
                sensor_id: 10,
            },
            MeterReading {
                value: Some(json!("12.5")),
                kind: Some(json!("A")),
                read_date: Some(json!("2024-01-01")),
            },
        );
        handle.publish(snapshot);

        let sensor = sensor(handle);
        assert_eq!(sensor.state(), Some(json!("12.5")));
        assert_eq!(sensor.unit_of_measurement(), Some("m³"));
        assert_eq!(sensor.device_class(), Some(DeviceClass::Water));
        assert_eq!(sensor.unique_id(), "ekartoteka_meter_5_1_3_10");
        assert_eq!(sensor.name(), "Cold water (10)");

        let attrs = sensor.attributes();
        assert_eq!(attrs["type"], json!("A"));
        assert_eq!(attrs["read_date"], json!("2024-01-01"));
        assert_eq!(attrs["house_name"], json!("Osiedle A"));
    }

    #[test]
    fn test_absent_snapshot_renders_unknown() {
        let sensor = sensor(SnapshotHandle::new());
        assert!(sensor.state().is_none());
        let attrs = sensor.attributes();
        assert_eq!(attrs["type"], Value::Null);
        assert_eq!(attrs["read_date"], Value::Null);
    }

    #[test]
    fn test_absent_key_renders_unknown() {
        let handle = SnapshotHandle::new();
        handle.publish(Snapshot::empty(meta()));
        let sensor = sensor(handle);
        assert!(sensor.state().is_none());
    }
}
