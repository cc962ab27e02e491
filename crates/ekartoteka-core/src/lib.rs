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

//! Snapshot model, per-house refresh coordinator and sensor projections for
//! the eKartoteka bridge.

pub mod coordinator;
pub mod entities;
pub mod setup;
pub mod snapshot;
pub mod units;

pub use coordinator::{HouseCoordinator, Refreshable, UpdateFailed};
pub use entities::{
    DeviceInfo, InvoiceEntrySensor, InvoiceSummarySensor, MeterCostSensor, MeterSensor, Sensor,
    StateClass,
};
pub use setup::{HouseEntities, build_all};
pub use snapshot::{
    HouseMeta, InvoiceEntry, MeterCostSummary, MeterKey, MeterReading, Snapshot, SnapshotHandle,
};
pub use units::{DeviceClass, UnitMapping, map_unit};
