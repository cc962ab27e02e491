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

//! Wire types for the eKartoteka REST API.
//!
//! Field names follow the (Polish) JSON keys the portal sends. Values the
//! portal may serialize as either string or number stay `serde_json::Value`
//! and are passed through to consumers untouched.

use serde::Deserialize;
use serde_json::Value;

/// Standard pagination envelope; most list endpoints wrap rows in
/// `{"results": [...]}`. A missing `results` key means an empty list.
#[derive(Debug, Default, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkedAccountRow {
    #[serde(default)]
    pub id: Option<i64>,
}

/// Account details are NOT results-wrapped; fields come straight off the body.
#[derive(Debug, Deserialize)]
pub struct AccountDetails {
    #[serde(default)]
    pub id_usr: Option<i64>,
    #[serde(default)]
    pub id_kli: Option<i64>,
    #[serde(default)]
    pub nazwa: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupRow {
    #[serde(rename = "IdGru", default)]
    pub id_gru: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HouseRow {
    #[serde(rename = "IdADo", default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nazwa: Option<String>,
    #[serde(rename = "Nazwa", default)]
    pub nazwa_alt: Option<String>,
}

impl HouseRow {
    /// Display name falls back from `nazwa` to `Nazwa` to the raw id.
    pub fn display_name(&self) -> String {
        self.nazwa
            .clone()
            .or_else(|| self.nazwa_alt.clone())
            .unwrap_or_else(|| self.id.map_or_else(String::new, |id| id.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApartmentRow {
    #[serde(rename = "IdLok", default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorKindRow {
    #[serde(default)]
    pub id_el_op: Option<i64>,
    #[serde(default)]
    pub id_gru: Option<i64>,
    /// Unit string, e.g. "m3" or "GJ".
    #[serde(default)]
    pub jm: Option<String>,
    #[serde(default)]
    pub nazwa: Option<String>,
}

/// Latest reading of one meter; `stan` is typically a numeric string.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingRow {
    #[serde(default)]
    pub stan: Option<Value>,
    #[serde(default)]
    pub typ: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoicePeriodRow {
    #[serde(rename = "IdNal", default)]
    pub id_nal: Option<i64>,
    #[serde(rename = "DataOd", default)]
    pub data_od: Option<Value>,
    #[serde(rename = "DataDo", default)]
    pub data_do: Option<Value>,
    /// Paid flag.
    #[serde(rename = "Stan", default)]
    pub stan: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceLineRow {
    #[serde(rename = "Nazwa", default)]
    pub nazwa: Option<String>,
    /// Charged amount for the line.
    #[serde(rename = "Nalicz", default)]
    pub nalicz: Option<Value>,
    #[serde(rename = "Cena", default)]
    pub cena: Option<Value>,
    #[serde(rename = "Ilosc", default)]
    pub ilosc: Option<Value>,
    #[serde(rename = "JM", default)]
    pub jm: Option<Value>,
    #[serde(rename = "WspIle", default)]
    pub wsp_ile: Option<Value>,
    #[serde(rename = "WspIleJM", default)]
    pub wsp_ile_jm: Option<Value>,
    #[serde(rename = "WspCena", default)]
    pub wsp_cena: Option<Value>,
    #[serde(default)]
    pub is_sub: Option<Value>,
    #[serde(rename = "zaOkres", default)]
    pub za_okres: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageSummaryRow {
    #[serde(default)]
    pub id_el_op: Option<i64>,
    #[serde(rename = "Nazwa", default)]
    pub nazwa: Option<String>,
    /// Yearly settlement result for the meter.
    #[serde(rename = "WynikRozliczenia", default)]
    pub wynik_rozliczenia: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeterCostRow {
    #[serde(rename = "zuzycieFaktyczne", default)]
    pub zuzycie_faktyczne: Option<Value>,
    #[serde(rename = "zuzycieFaktyczneJM", default)]
    pub zuzycie_faktyczne_jm: Option<Value>,
}
