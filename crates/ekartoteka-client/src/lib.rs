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

//! Async client for the eKartoteka utility-billing REST API.
//!
//! Two token classes are handled internally:
//! - `auth_token`: acquired via `/api/api-token-auth/`, used only to resolve
//!   account metadata during login
//! - `data_token`: per-account token returned in the account details; used for
//!   all data endpoints

pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

pub use client::EkartotekaClient;
pub use error::{ClientError, Result};
pub use types::{
    AccountDetails, ApartmentRow, HouseRow, InvoiceLineRow, InvoicePeriodRow, MeterCostRow,
    ReadingRow, SensorKindRow, UsageSummaryRow,
};
