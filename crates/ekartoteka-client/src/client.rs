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

use crate::endpoints;
use crate::error::{ClientError, Result};
use crate::types::{
    AccountDetails, ApartmentRow, GroupRow, HouseRow, InvoiceLineRow, InvoicePeriodRow,
    LinkedAccountRow, MeterCostRow, Paged, ReadingRow, SensorKindRow, TokenResponse,
    UsageSummaryRow,
};
use chrono::{Datelike, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Session state populated by `login()` and cleared on auth expiry.
#[derive(Debug, Default)]
struct Session {
    /// Account-independent token from `/api/api-token-auth/`.
    auth_token: String,
    /// Account-scoped token from the account details; used for data endpoints.
    data_token: String,
    account_id: Option<i64>,
    user_id: Option<i64>,
    client_id: Option<i64>,
    group_id: Option<i64>,
    account_name: Option<String>,
}

/// eKartoteka REST API client with automatic authentication.
#[derive(Debug)]
pub struct EkartotekaClient {
    base_url: String,
    username: String,
    password: String,
    http: Client,
    session: RwLock<Session>,
}

impl EkartotekaClient {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_base_url(endpoints::DEFAULT_BASE_URL, username, password)
    }

    /// Create a client against a custom base URL (tests, staging portal).
    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            username: username.into(),
            password: password.into(),
            http,
            session: RwLock::new(Session::default()),
        })
    }

    /// Account display name captured during login, if any.
    pub async fn account_name(&self) -> Option<String> {
        self.session.read().await.account_name.clone()
    }

    /// Ensure both tokens are present. No-op once logged in.
    ///
    /// Sequence: POST credentials for the auth token, resolve the first linked
    /// account, read the account details for the data token and client id,
    /// then the groups list for the group id. Any non-200 or missing field
    /// fails the whole login; a 401 here is a plain failure, not a retry.
    pub async fn login(&self) -> Result<()> {
        let mut session = self.session.write().await;
        if !session.auth_token.is_empty() && !session.data_token.is_empty() {
            return Ok(());
        }

        // 1) Obtain the account-independent auth token
        let response = self
            .request(Method::POST, endpoints::LOGIN, "")
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::AuthFailed {
                username: self.username.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let token: TokenResponse = response.json().await?;
        session.auth_token = token.token.unwrap_or_default();
        if session.auth_token.is_empty() {
            return Err(ClientError::InvalidResponse(
                "login response did not include auth token".to_owned(),
            ));
        }

        // 2) First linked account
        let accounts: Paged<LinkedAccountRow> = self
            .get_json(endpoints::ACCOUNTS_LIST, &session.auth_token)
            .await?;
        let account = accounts.results.first().ok_or_else(|| {
            ClientError::InvalidResponse("no linked accounts returned for user".to_owned())
        })?;
        let account_id = account.id.ok_or_else(|| {
            ClientError::InvalidResponse("linked account payload missing 'id'".to_owned())
        })?;

        // 3) Account details carry the data token and client id
        let details: AccountDetails = self
            .get_json(&endpoints::account_details(account_id), &session.auth_token)
            .await?;
        session.data_token = details.token.unwrap_or_default();
        if session.data_token.is_empty() {
            return Err(ClientError::InvalidResponse(
                "account details did not include account token".to_owned(),
            ));
        }
        let client_id = details.id_kli.ok_or_else(|| {
            ClientError::InvalidResponse("account details missing 'id_kli'".to_owned())
        })?;
        session.account_id = Some(account_id);
        session.user_id = details.id_usr;
        session.client_id = Some(client_id);
        session.account_name = details.nazwa;

        // 4) Groups list carries the group id
        let groups: Paged<GroupRow> = self
            .get_json(&endpoints::groups(client_id), &session.data_token)
            .await?;
        let group = groups.results.first().ok_or_else(|| {
            ClientError::InvalidResponse("groups list empty for user".to_owned())
        })?;
        session.group_id = Some(group.id_gru.ok_or_else(|| {
            ClientError::InvalidResponse("groups payload missing 'IdGru'".to_owned())
        })?);

        info!(
            "Logged in to eKartoteka as {} (client {}, group {})",
            session.account_name.as_deref().unwrap_or(&self.username),
            client_id,
            session.group_id.unwrap_or_default()
        );
        Ok(())
    }

    /// Houses reachable by the account.
    pub async fn house_list(&self) -> Result<Vec<HouseRow>> {
        self.login().await?;
        let (client_id, group_id) = self.ids().await?;
        self.get_results(&endpoints::houses(group_id, client_id))
            .await
    }

    pub async fn apartment_list(&self, house_id: i64) -> Result<Vec<ApartmentRow>> {
        self.login().await?;
        let (client_id, _) = self.ids().await?;
        self.get_results(&endpoints::apartments(house_id, client_id, endpoints::ts_ms()))
            .await
    }

    /// Sensor kinds for a house; shared across its apartments.
    pub async fn sensor_list(&self, house_id: i64) -> Result<Vec<SensorKindRow>> {
        self.login().await?;
        let (_, group_id) = self.ids().await?;
        self.get_results(&endpoints::sensor_kinds(house_id, group_id, endpoints::ts_ms()))
            .await
    }

    /// Latest readings for one (apartment, sensor) pair; newest first.
    pub async fn sensor_reading(
        &self,
        apartment_id: i64,
        sensor_id: i64,
    ) -> Result<Vec<ReadingRow>> {
        self.login().await?;
        self.get_results(&endpoints::sensor_reading(
            apartment_id,
            sensor_id,
            endpoints::ts_ms(),
        ))
        .await
    }

    /// Invoice periods for one apartment; newest first.
    pub async fn invoice_periods(
        &self,
        house_id: i64,
        apartment_id: i64,
    ) -> Result<Vec<InvoicePeriodRow>> {
        self.login().await?;
        let (client_id, _) = self.ids().await?;
        self.get_results(&endpoints::invoice_periods(
            house_id,
            client_id,
            apartment_id,
            endpoints::ts_ms(),
        ))
        .await
    }

    pub async fn invoice_lines(
        &self,
        apartment_id: i64,
        invoice_id: i64,
    ) -> Result<Vec<InvoiceLineRow>> {
        self.login().await?;
        let (client_id, _) = self.ids().await?;
        self.get_results(&endpoints::invoice_lines(
            invoice_id,
            apartment_id,
            client_id,
            endpoints::ts_ms(),
        ))
        .await
    }

    /// Yearly usage analysis for the current calendar year.
    pub async fn usage_summary(&self, house_id: i64) -> Result<Vec<UsageSummaryRow>> {
        self.login().await?;
        let (client_id, _) = self.ids().await?;
        self.get_results(&endpoints::analysis_summary(
            house_id,
            client_id,
            Utc::now().year(),
            endpoints::ts_ms(),
        ))
        .await
    }

    pub async fn meter_cost(&self, house_id: i64, sensor_id: i64) -> Result<Vec<MeterCostRow>> {
        self.login().await?;
        let (client_id, _) = self.ids().await?;
        self.get_results(&endpoints::meter_cost(
            house_id,
            client_id,
            sensor_id,
            endpoints::ts_ms(),
        ))
        .await
    }

    async fn ids(&self) -> Result<(i64, i64)> {
        let session = self.session.read().await;
        match (session.client_id, session.group_id) {
            (Some(client_id), Some(group_id)) => Ok((client_id, group_id)),
            _ => Err(ClientError::InvalidResponse(
                "session missing client or group id".to_owned(),
            )),
        }
    }

    async fn reset_tokens(&self) {
        let mut session = self.session.write().await;
        session.auth_token.clear();
        session.data_token.clear();
    }

    fn request(&self, method: Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Origin", &self.base_url)
            .header("Referer", format!("{}/", self.base_url));
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Plain GET used by the login sequence; no 401 retry.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T> {
        let response = self.request(Method::GET, path, token).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Api {
                status: status.as_u16(),
                url: format!("{}{}", self.base_url, path),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    /// Authenticated GET returning the `results` list.
    ///
    /// On 401 the tokens are cleared, `login()` re-runs and the same request
    /// is retried exactly once with fresh headers. Any other non-200, or a
    /// second 401, fails with status and body.
    async fn get_results<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut retried = false;
        loop {
            let token = self.session.read().await.data_token.clone();
            let response = self.request(Method::GET, path, &token).send().await?;
            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !retried {
                warn!("401 on GET {path}, refreshing tokens and retrying once");
                self.reset_tokens().await;
                self.login().await?;
                retried = true;
                continue;
            }
            if status != StatusCode::OK {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    url: format!("{}{}", self.base_url, path),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            let paged: Paged<T> = response.json().await?;
            debug!("GET {path} returned {} rows", paged.results.len());
            return Ok(paged.results);
        }
    }
}
