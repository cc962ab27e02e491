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

//! The atomic result of one refresh cycle.
//!
//! A snapshot is replaced as a whole, never mutated. Sensors read whatever
//! snapshot is currently published; a failed refresh leaves the previous one
//! in place.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Composite key for meter readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeterKey {
    pub apartment_id: i64,
    pub sensor_id: i64,
}

/// Latest reading of one meter. All fields stay `None` when the portal
/// returned no readings for the pair.
#[derive(Debug, Clone, Default)]
pub struct MeterReading {
    pub value: Option<Value>,
    pub kind: Option<Value>,
    pub read_date: Option<Value>,
}

/// One line of the most recent invoice, annotated with its period.
#[derive(Debug, Clone, Default)]
pub struct InvoiceEntry {
    pub name: Option<String>,
    pub amount: Option<Value>,
    pub price: Option<Value>,
    pub size: Option<Value>,
    pub unit: Option<Value>,
    pub count: Option<Value>,
    pub count_unit: Option<Value>,
    pub price_coefficient: Option<Value>,
    pub is_sub: Option<Value>,
    pub period: Option<Value>,
    pub period_start: Option<Value>,
    pub period_end: Option<Value>,
    pub paid: Option<Value>,
    pub apartment_id: i64,
}

/// Yearly analysis row for one meter, enriched with the cost endpoint's
/// figures when available.
#[derive(Debug, Clone, Default)]
pub struct MeterCostSummary {
    pub name: Option<String>,
    pub settlement: Option<Value>,
    pub cost: Option<Value>,
    pub amount: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HouseMeta {
    pub house_id: i64,
    pub house_name: String,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub meters: BTreeMap<MeterKey, MeterReading>,
    pub last_invoice: BTreeMap<String, InvoiceEntry>,
    pub usage_summary: BTreeMap<i64, MeterCostSummary>,
    pub meta: HouseMeta,
}

impl Snapshot {
    pub fn empty(meta: HouseMeta) -> Self {
        Self {
            meters: BTreeMap::new(),
            last_invoice: BTreeMap::new(),
            usage_summary: BTreeMap::new(),
            meta,
        }
    }
}

/// Shared slot holding the currently published snapshot.
///
/// Writers replace the whole snapshot at the end of a cycle; readers only
/// clone the `Arc`, so no lock is held while a sensor renders its state.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published snapshot, `None` before the first refresh.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.inner.read().clone()
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.inner.write() = Some(snapshot.clone());
        snapshot
    }
}
