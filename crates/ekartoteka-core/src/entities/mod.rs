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

//! Read-only sensor projections over the published snapshot.
//!
//! Each projection holds a stable id and looks its value up at read time.
//! An absent snapshot or key renders as unknown (`None` state, null
//! attributes), never as a panic.

mod invoice_entry;
mod meter;
mod meter_cost;
mod summary;

pub use invoice_entry::InvoiceEntrySensor;
pub use meter::MeterSensor;
pub use meter_cost::MeterCostSensor;
pub use summary::InvoiceSummarySensor;

use crate::units::DeviceClass;
use serde_json::{Map, Value};

/// Device grouping metadata in the host's entity-registry shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// (domain, id) identifier pair.
    pub identifiers: (String, String),
    pub name: String,
    pub manufacturer: &'static str,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Total,
}

/// The host platform's entity contract.
pub trait Sensor: Send + Sync {
    fn unique_id(&self) -> &str;
    fn name(&self) -> &str;
    fn device_info(&self) -> DeviceInfo;
    fn device_class(&self) -> Option<DeviceClass>;
    fn state_class(&self) -> StateClass {
        StateClass::Total
    }
    fn unit_of_measurement(&self) -> Option<&str>;
    fn icon(&self) -> &'static str;
    /// Current value from the published snapshot; `None` when the snapshot
    /// or the key is absent.
    fn state(&self) -> Option<Value>;
    fn attributes(&self) -> Map<String, Value>;
}
