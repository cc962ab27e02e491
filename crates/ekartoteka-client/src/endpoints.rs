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

//! eKartoteka endpoint templates.
//!
//! Paths are relative so tests can point the client at a mock server. The `_`
//! query parameter on data endpoints is a millisecond-epoch cache buster the
//! portal frontend sends on every GET.

use chrono::Utc;

pub const DEFAULT_BASE_URL: &str = "https://www.e-kartoteka.pl";

pub const LOGIN: &str = "/api/api-token-auth/";
pub const ACCOUNTS_LIST: &str = "/api/konta/kontapowiazane/?pageSize=50";

/// Millisecond-epoch cache-busting timestamp.
pub fn ts_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn account_details(account_id: i64) -> String {
    format!("/api/konta/kontapowiazane/{account_id}/")
}

pub fn groups(client_id: i64) -> String {
    format!("/api/uzytkownicy/grupy/?id_kli={client_id}&page=1&pageSize=100")
}

pub fn houses(group_id: i64, client_id: i64) -> String {
    format!("/api/uzytkownicy/nieruchomosci/?id_gru={group_id}&id_kli={client_id}&page=1&pageSize=20")
}

pub fn apartments(house_id: i64, client_id: i64, ts: i64) -> String {
    format!(
        "/api/oplatymiesieczne/lokale/?page=1&pageSize=1000&id_a_do={house_id}&id_kli={client_id}&_={ts}"
    )
}

pub fn analysis_summary(house_id: i64, client_id: i64, year: i32, ts: i64) -> String {
    format!(
        "/api/media/analizazuzycia/?page=1&pageSize=20&id_a_do={house_id}&id_kli={client_id}&rok={year}&_={ts}"
    )
}

// NOTE: the second parameter is the group id here; an earlier upstream revision
// passed a year instead. Unverified against the live API.
pub fn sensor_kinds(house_id: i64, group_id: i64, ts: i64) -> String {
    format!(
        "/api/liczniki/rodzajemediow/?page=1&pageSize=20&id_a_do={house_id}&id_gru={group_id}&_={ts}"
    )
}

pub fn sensor_reading(apartment_id: i64, sensor_id: i64, ts: i64) -> String {
    format!(
        "/api/liczniki/liczniki/?page=1&pageSize=20&id_lok={apartment_id}&id_el_op={sensor_id}&_={ts}"
    )
}

pub fn invoice_periods(house_id: i64, client_id: i64, apartment_id: i64, ts: i64) -> String {
    format!(
        "/api/oplatymiesieczne/okresy/?page=1&pageSize=20&id_a_do={house_id}&id_kli={client_id}&id_lok={apartment_id}&_={ts}"
    )
}

pub fn invoice_lines(invoice_id: i64, apartment_id: i64, client_id: i64, ts: i64) -> String {
    format!(
        "/api/oplatymiesieczne/oplatymiesieczneb/?page=1&pageSize=100&id_nal={invoice_id}&id_lok={apartment_id}&id_kli={client_id}&_={ts}"
    )
}

pub fn meter_cost(house_id: i64, client_id: i64, sensor_id: i64, ts: i64) -> String {
    format!(
        "/api/media/rozliczeniemediow/?page=1&pageSize=20&id_a_do={house_id}&id_kli={client_id}&id_el_op={sensor_id}&ordering=DataOd&_={ts}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templated_paths() {
        assert_eq!(account_details(7), "/api/konta/kontapowiazane/7/");
        assert_eq!(
            groups(12),
            "/api/uzytkownicy/grupy/?id_kli=12&page=1&pageSize=100"
        );
        assert_eq!(
            houses(3, 12),
            "/api/uzytkownicy/nieruchomosci/?id_gru=3&id_kli=12&page=1&pageSize=20"
        );
        assert_eq!(
            sensor_reading(1, 10, 1700000000000),
            "/api/liczniki/liczniki/?page=1&pageSize=20&id_lok=1&id_el_op=10&_=1700000000000"
        );
        assert_eq!(
            meter_cost(5, 12, 10, 42),
            "/api/media/rozliczeniemediow/?page=1&pageSize=20&id_a_do=5&id_kli=12&id_el_op=10&ordering=DataOd&_=42"
        );
    }

    #[test]
    fn test_ts_ms_is_millisecond_epoch() {
        let ts = ts_ms();
        // Anything after 2020 in milliseconds.
        assert!(ts > 1_577_836_800_000);
    }
}
