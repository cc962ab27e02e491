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

//! Per-house refresh coordinator.
//!
//! One coordinator owns the published snapshot slot for a single house and
//! runs the full fetch cycle: apartments, sensor kinds, per-pair readings,
//! newest invoice lines, and the guarded yearly usage summary.

use crate::snapshot::{
    HouseMeta, InvoiceEntry, MeterCostSummary, MeterKey, MeterReading, Snapshot, SnapshotHandle,
};
use async_trait::async_trait;
use ekartoteka_client::{ClientError, EkartotekaClient, HouseRow};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Refresh-failure condition reported to the scheduler. The previously
/// published snapshot stays visible to sensors.
#[derive(Debug, Error)]
#[error("unable to update eKartoteka data for house {house_id}: {source}")]
pub struct UpdateFailed {
    pub house_id: i64,
    #[source]
    pub source: ClientError,
}

/// The host scheduler's periodic refresh contract.
#[async_trait]
pub trait Refreshable: Send + Sync {
    async fn refresh_cycle(&self) -> Result<(), UpdateFailed>;
    fn label(&self) -> String;
}

pub struct HouseCoordinator {
    client: Arc<EkartotekaClient>,
    house_id: i64,
    house_name: String,
    handle: SnapshotHandle,
}

impl std::fmt::Debug for HouseCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HouseCoordinator")
            .field("house_id", &self.house_id)
            .field("house_name", &self.house_name)
            .finish_non_exhaustive()
    }
}

impl HouseCoordinator {
    /// Returns `None` for a house row without an `IdADo` identifier.
    pub fn new(client: Arc<EkartotekaClient>, house: &HouseRow) -> Option<Self> {
        let house_id = house.id?;
        Some(Self {
            client,
            house_id,
            house_name: house.display_name(),
            handle: SnapshotHandle::new(),
        })
    }

    pub fn house_id(&self) -> i64 {
        self.house_id
    }

    pub fn house_name(&self) -> &str {
        &self.house_name
    }

    /// Shared slot the sensors read from.
    pub fn handle(&self) -> SnapshotHandle {
        self.handle.clone()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.handle.current()
    }

    /// Run one full cycle and publish the result atomically. On failure the
    /// previous snapshot stays published.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        match self.fetch_snapshot().await {
            Ok(snapshot) => Ok(self.handle.publish(snapshot)),
            Err(source) => {
                error!(
                    "Refresh failed for house {} ({}): {}",
                    self.house_id, self.house_name, source
                );
                Err(UpdateFailed {
                    house_id: self.house_id,
                    source,
                })
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, ClientError> {
        let apartments = self.client.apartment_list(self.house_id).await?;
        // Sensor kinds are shared across apartments within the house.
        let sensors = self.client.sensor_list(self.house_id).await?;

        let mut meters: BTreeMap<MeterKey, MeterReading> = BTreeMap::new();
        let mut last_invoice: BTreeMap<String, InvoiceEntry> = BTreeMap::new();

        for apartment in &apartments {
            let Some(apartment_id) = apartment.id else {
                warn!(
                    "Skipping apartment without IdLok in house {}",
                    self.house_id
                );
                continue;
            };

            for sensor in &sensors {
                let Some(sensor_id) = sensor.id_el_op else {
                    warn!("Skipping sensor without id_el_op: {sensor:?}");
                    continue;
                };
                let readings = self.client.sensor_reading(apartment_id, sensor_id).await?;
                // Null-valued fields are stored when the portal has no reading
                // for the pair, so the sensor still exists but reads unknown.
                let reading = readings.first().map_or_else(MeterReading::default, |row| {
                    MeterReading {
                        value: row.stan.clone(),
                        kind: row.typ.clone(),
                        read_date: row.data.clone(),
                    }
                });
                meters.insert(
                    MeterKey {
                        apartment_id,
                        sensor_id,
                    },
                    reading,
                );
            }

            let periods = self
                .client
                .invoice_periods(self.house_id, apartment_id)
                .await?;
            if let Some(period) = periods.first()
                && let Some(invoice_id) = period.id_nal
            {
                let lines = self.client.invoice_lines(apartment_id, invoice_id).await?;
                for line in lines {
                    let Some(name) = line.nazwa.clone() else {
                        debug!("Skipping unnamed invoice line for apartment {apartment_id}");
                        continue;
                    };
                    // Name collisions across apartments: last writer wins.
                    last_invoice.insert(
                        name.clone(),
                        InvoiceEntry {
                            name: Some(name),
                            amount: line.nalicz,
                            price: line.cena,
                            size: line.ilosc,
                            unit: line.jm,
                            count: line.wsp_ile,
                            count_unit: line.wsp_ile_jm,
                            price_coefficient: line.wsp_cena,
                            is_sub: line.is_sub,
                            period: line.za_okres,
                            period_start: period.data_od.clone(),
                            period_end: period.data_do.clone(),
                            paid: period.stan.clone(),
                            apartment_id,
                        },
                    );
                }
            }
        }

        // An empty or partial summary is an acceptable outcome; failures here
        // never abort the cycle.
        let mut usage_summary: BTreeMap<i64, MeterCostSummary> = BTreeMap::new();
        if let Err(err) = self.collect_usage_summary(&mut usage_summary).await {
            warn!(
                "Usage summary failed for house {}: {}",
                self.house_id, err
            );
        }

        Ok(Snapshot {
            meters,
            last_invoice,
            usage_summary,
            meta: HouseMeta {
                house_id: self.house_id,
                house_name: self.house_name.clone(),
            },
        })
    }

    async fn collect_usage_summary(
        &self,
        out: &mut BTreeMap<i64, MeterCostSummary>,
    ) -> Result<(), ClientError> {
        let rows = self.client.usage_summary(self.house_id).await?;
        for row in rows {
            let Some(sensor_id) = row.id_el_op else {
                debug!("Skipping usage summary row without id_el_op: {row:?}");
                continue;
            };
            let mut summary = MeterCostSummary {
                name: row.nazwa,
                settlement: row.wynik_rozliczenia,
                cost: None,
                amount: None,
            };
            let costs = self.client.meter_cost(self.house_id, sensor_id).await?;
            if let Some(cost) = costs.first() {
                summary.cost = cost.zuzycie_faktyczne.clone();
                summary.amount = cost.zuzycie_faktyczne_jm.clone();
            }
            out.insert(sensor_id, summary);
        }
        Ok(())
    }
}

#[async_trait]
impl Refreshable for HouseCoordinator {
    async fn refresh_cycle(&self) -> Result<(), UpdateFailed> {
        self.refresh().await.map(|_| ())
    }

    fn label(&self) -> String {
        format!("eKartoteka house {}", self.house_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    async fn mock_login(server: &mut ServerGuard) {
        server
            .mock("POST", "/api/api-token-auth/")
            .with_status(200)
            .with_body(json!({"token": "auth-tok"}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/api/konta/kontapowiazane/?pageSize=50")
            .with_status(200)
            .with_body(json!({"results": [{"id": 7}]}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/api/konta/kontapowiazane/7/")
            .with_status(200)
            .with_body(json!({"id_kli": 12, "nazwa": "Jan K.", "token": "data-tok"}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/api/uzytkownicy/grupy/?id_kli=12&page=1&pageSize=100")
            .with_status(200)
            .with_body(json!({"results": [{"IdGru": 3}]}).to_string())
            .create_async()
            .await;
    }

    async fn mock_results(server: &mut ServerGuard, path_prefix: &str, body: serde_json::Value) {
        server
            .mock(
                "GET",
                Matcher::Regex(format!("^{}.*$", regex_escape(path_prefix))),
            )
            .with_status(200)
            .with_body(json!({"results": body}).to_string())
            .create_async()
            .await;
    }

    fn regex_escape(path: &str) -> String {
        path.replace('?', r"\?")
    }

    fn coordinator(server: &ServerGuard) -> HouseCoordinator {
        let client = Arc::new(
            EkartotekaClient::with_base_url(server.url(), "user", "pass").unwrap(),
        );
        let house: HouseRow =
            serde_json::from_value(json!({"IdADo": 5, "nazwa": "Osiedle A"})).unwrap();
        HouseCoordinator::new(client, &house).unwrap()
    }

    #[tokio::test]
    async fn test_full_cycle_builds_snapshot() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/lokale/?",
            json!([{"IdLok": 1}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/liczniki/rodzajemediow/?",
            json!([{"id_el_op": 10, "jm": "m3", "nazwa": "Cold water"}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/liczniki/liczniki/?",
            json!([{"stan": "12.5", "typ": "A", "data": "2024-01-01"}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/okresy/?",
            json!([{"IdNal": 77, "DataOd": "2024-01-01", "DataDo": "2024-01-31", "Stan": 1}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/oplatymiesieczneb/?",
            json!([{"Nazwa": "Woda zimna", "Nalicz": 45.5, "Cena": 9.1, "Ilosc": 5, "JM": "m3"}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/media/analizazuzycia/?",
            json!([{"id_el_op": 10, "Nazwa": "Cold water", "WynikRozliczenia": -12.3}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/media/rozliczeniemediow/?",
            json!([{"zuzycieFaktyczne": 120.0, "zuzycieFaktyczneJM": 13.2}]),
        )
        .await;

        let coordinator = coordinator(&server);
        let snapshot = coordinator.refresh().await.unwrap();

        let key = MeterKey {
            apartment_id: 1,
            sensor_id: 10,
        };
        assert_eq!(snapshot.meters[&key].value, Some(json!("12.5")));
        assert_eq!(snapshot.meters[&key].kind, Some(json!("A")));
        assert_eq!(snapshot.meters[&key].read_date, Some(json!("2024-01-01")));

        let entry = &snapshot.last_invoice["Woda zimna"];
        assert_eq!(entry.amount, Some(json!(45.5)));
        assert_eq!(entry.period_start, Some(json!("2024-01-01")));
        assert_eq!(entry.paid, Some(json!(1)));
        assert_eq!(entry.apartment_id, 1);

        let summary = &snapshot.usage_summary[&10];
        assert_eq!(summary.settlement, Some(json!(-12.3)));
        assert_eq!(summary.cost, Some(json!(120.0)));
        assert_eq!(summary.amount, Some(json!(13.2)));

        assert_eq!(snapshot.meta.house_id, 5);
        assert_eq!(snapshot.meta.house_name, "Osiedle A");
    }

    #[tokio::test]
    async fn test_empty_reading_list_stores_null_fields() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/lokale/?",
            json!([{"IdLok": 1}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/liczniki/rodzajemediow/?",
            json!([{"id_el_op": 10, "jm": "m3"}]),
        )
        .await;
        mock_results(&mut server, "/api/liczniki/liczniki/?", json!([])).await;
        mock_results(&mut server, "/api/oplatymiesieczne/okresy/?", json!([])).await;
        mock_results(&mut server, "/api/media/analizazuzycia/?", json!([])).await;

        let coordinator = coordinator(&server);
        let snapshot = coordinator.refresh().await.unwrap();

        let key = MeterKey {
            apartment_id: 1,
            sensor_id: 10,
        };
        let reading = &snapshot.meters[&key];
        assert!(reading.value.is_none());
        assert!(reading.kind.is_none());
        assert!(reading.read_date.is_none());
        // Empty invoice period list produces no last-invoice entries.
        assert!(snapshot.last_invoice.is_empty());
    }

    #[tokio::test]
    async fn test_sensor_without_id_is_skipped() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/lokale/?",
            json!([{"IdLok": 1}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/liczniki/rodzajemediow/?",
            json!([{"jm": "GJ"}, {"id_el_op": 11, "jm": "GJ"}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/liczniki/liczniki/?",
            json!([{"stan": "0.8"}]),
        )
        .await;
        mock_results(&mut server, "/api/oplatymiesieczne/okresy/?", json!([])).await;
        mock_results(&mut server, "/api/media/analizazuzycia/?", json!([])).await;

        let coordinator = coordinator(&server);
        let snapshot = coordinator.refresh().await.unwrap();

        assert_eq!(snapshot.meters.len(), 1);
        assert!(snapshot.meters.contains_key(&MeterKey {
            apartment_id: 1,
            sensor_id: 11,
        }));
    }

    #[tokio::test]
    async fn test_usage_summary_failure_does_not_abort_cycle() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/lokale/?",
            json!([{"IdLok": 1}]),
        )
        .await;
        mock_results(&mut server, "/api/liczniki/rodzajemediow/?", json!([])).await;
        mock_results(&mut server, "/api/oplatymiesieczne/okresy/?", json!([])).await;
        server
            .mock("GET", Matcher::Regex(r"^/api/media/analizazuzycia/.*$".to_owned()))
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let coordinator = coordinator(&server);
        let snapshot = coordinator.refresh().await.unwrap();
        assert!(snapshot.usage_summary.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_snapshot() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        let apartments_ok = server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/oplatymiesieczne/lokale/.*$".to_owned()),
            )
            .with_status(200)
            .with_body(json!({"results": [{"IdLok": 1}]}).to_string())
            .expect(1)
            .create_async()
            .await;
        let apartments_down = server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/oplatymiesieczne/lokale/.*$".to_owned()),
            )
            .with_status(503)
            .with_body("maintenance")
            .expect(1)
            .create_async()
            .await;
        mock_results(&mut server, "/api/liczniki/rodzajemediow/?", json!([])).await;
        mock_results(&mut server, "/api/oplatymiesieczne/okresy/?", json!([])).await;
        mock_results(&mut server, "/api/media/analizazuzycia/?", json!([])).await;

        let coordinator = coordinator(&server);
        let first = coordinator.refresh().await.unwrap();
        assert_eq!(first.meta.house_id, 5);

        let err = coordinator.refresh().await.unwrap_err();
        assert_eq!(err.house_id, 5);
        assert!(matches!(err.source, ClientError::Api { status: 503, .. }));

        // The snapshot published by the first cycle is still the one visible.
        let current = coordinator.snapshot().unwrap();
        assert!(Arc::ptr_eq(&current, &first));

        apartments_ok.assert_async().await;
        apartments_down.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoice_line_collision_last_writer_wins() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/lokale/?",
            json!([{"IdLok": 1}, {"IdLok": 2}]),
        )
        .await;
        mock_results(&mut server, "/api/liczniki/rodzajemediow/?", json!([])).await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/okresy/?",
            json!([{"IdNal": 77}]),
        )
        .await;
        mock_results(
            &mut server,
            "/api/oplatymiesieczne/oplatymiesieczneb/?",
            json!([{"Nazwa": "Czynsz", "Nalicz": 100.0}]),
        )
        .await;
        mock_results(&mut server, "/api/media/analizazuzycia/?", json!([])).await;

        let coordinator = coordinator(&server);
        let snapshot = coordinator.refresh().await.unwrap();

        // Both apartments produced a "Czynsz" line; the later one is kept.
        assert_eq!(snapshot.last_invoice.len(), 1);
        assert_eq!(snapshot.last_invoice["Czynsz"].apartment_id, 2);
    }

    #[test]
    fn test_house_without_id_yields_no_coordinator() {
        let client = Arc::new(EkartotekaClient::with_base_url("http://localhost", "u", "p").unwrap());
        let house: HouseRow = serde_json::from_value(json!({"nazwa": "x"})).unwrap();
        assert!(HouseCoordinator::new(client, &house).is_none());
    }
}
