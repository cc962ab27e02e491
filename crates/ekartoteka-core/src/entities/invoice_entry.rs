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
use crate::snapshot::{HouseMeta, InvoiceEntry, SnapshotHandle};
use crate::units::{CURRENCY, DeviceClass};
use serde_json::{Map, Value};

/// One line item of the most recent invoice for an apartment.
#[derive(Debug)]
pub struct InvoiceEntrySensor {
    handle: SnapshotHandle,
    meta: HouseMeta,
    entry_name: String,
    apartment_id: i64,
    unique_id: String,
    name: String,
}

impl InvoiceEntrySensor {
    pub fn new(
        handle: SnapshotHandle,
        meta: HouseMeta,
        entry_name: &str,
        apartment_id: i64,
    ) -> Self {
        Self {
            unique_id: format!("ekartoteka_invoice_entry_{}_{entry_name}", meta.house_id),
            name: format!("{entry_name} ({})", meta.house_id),
            entry_name: entry_name.to_owned(),
            apartment_id,
            handle,
            meta,
        }
    }

    fn entry(&self) -> Option<InvoiceEntry> {
        self.handle
            .current()
            .and_then(|snapshot| snapshot.last_invoice.get(&self.entry_name).cloned())
    }
}

impl Sensor for InvoiceEntrySensor {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: (
                "eKartoteka_last_invoice".to_owned(),
                self.apartment_id.to_string(),
            ),
            name: format!(
                "Last invoice ({}.{})",
                self.meta.house_id, self.apartment_id
            ),
            manufacturer: "eKartoteka",
            model: "last_invoice".to_owned(),
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
        self.entry().and_then(|entry| entry.amount)
    }

    fn attributes(&self) -> Map<String, Value> {
        let entry = self.entry().unwrap_or_default();
        let mut attrs = Map::new();
        attrs.insert("count".to_owned(), entry.count.unwrap_or(Value::Null));
        attrs.insert(
            "count_unit".to_owned(),
            entry.count_unit.unwrap_or(Value::Null),
        );
        attrs.insert("price".to_owned(), entry.price.unwrap_or(Value::Null));
        attrs.insert(
            "price_coefficent".to_owned(),
            entry.price_coefficient.unwrap_or(Value::Null),
        );
        attrs.insert("is_sub".to_owned(), entry.is_sub.unwrap_or(Value::Null));
        attrs.insert("size".to_owned(), entry.size.unwrap_or(Value::Null));
        attrs.insert("unit".to_owned(), entry.unit.unwrap_or(Value::Null));
        attrs.insert("period".to_owned(), entry.period.unwrap_or(Value::Null));
        attrs.insert(
            "period_start".to_owned(),
            entry.period_start.unwrap_or(Value::Null),
        );
        attrs.insert(
            "period_end".to_owned(),
            entry.period_end.unwrap_or(Value::Null),
        );
        attrs.insert("paid".to_owned(), entry.paid.unwrap_or(Value::Null));
        attrs.insert(
            "name".to_owned(),
            entry.name.map_or(Value::Null, Value::from),
        );
        attrs.insert("house_id".to_owned(), self.meta.house_id.into());
        attrs.insert("apartment_id".to_owned(), self.apartment_id.into());
        attrs.insert(
            "house_name".to_owned(),
            self.meta.house_name.clone().into(),
        );
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

    #[test]
    fn test_state_and_attributes() {
        let handle = SnapshotHandle::new();
        let mut snapshot = Snapshot::empty(meta());
        snapshot.last_invoice.insert(
            "Woda zimna".to_owned(),
            InvoiceEntry {
                name: Some("Woda zimna".to_owned()),
                amount: Some(json!(45.5)),
                price: Some(json!(9.1)),
                size: Some(json!(5)),
                unit: Some(json!("m3")),
                period_start: Some(json!("2024-01-01")),
                period_end: Some(json!("2024-01-31")),
                paid: Some(json!(1)),
                apartment_id: 1,
                ..InvoiceEntry::default()
            },
        );
        handle.publish(snapshot);

        let sensor = InvoiceEntrySensor::new(handle, meta(), "Woda zimna", 1);
        assert_eq!(sensor.state(), Some(json!(45.5)));
        assert_eq!(sensor.unique_id(), "ekartoteka_invoice_entry_5_Woda zimna");
        assert_eq!(sensor.unit_of_measurement(), Some("zl"));

        let attrs = sensor.attributes();
        assert_eq!(attrs["price"], json!(9.1));
        assert_eq!(attrs["period_start"], json!("2024-01-01"));
        assert_eq!(attrs["paid"], json!(1));
        assert_eq!(attrs["apartment_id"], json!(1));
        // Fields the portal did not send render as null, not as a panic.
        assert_eq!(attrs["count"], Value::Null);
    }

    #[test]
    fn test_absent_entry_renders_unknown() {
        let handle = SnapshotHandle::new();
        handle.publish(Snapshot::empty(meta()));

        let sensor = InvoiceEntrySensor::new(handle, meta(), "Czynsz", 1);
        assert!(sensor.state().is_none());
        assert_eq!(sensor.attributes()["name"], Value::Null);
    }
}
