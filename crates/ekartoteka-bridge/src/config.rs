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

//! Configuration for the bridge binary.
//!
//! Two entry points resolve to the same config: a persisted TOML file, or
//! the legacy static environment variables.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn default_24() -> u64 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// eKartoteka portal username
    pub username: String,

    /// eKartoteka portal password
    pub password: String,

    /// How often to refresh each house (hours)
    #[serde(default = "default_24")]
    pub update_interval_hours: u64,

    /// Custom API base URL for testing (overrides the production portal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Legacy static configuration via `EKARTOTEKA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let username = std::env::var("EKARTOTEKA_USERNAME")
            .context("EKARTOTEKA_USERNAME environment variable not set")?;
        let password = std::env::var("EKARTOTEKA_PASSWORD")
            .context("EKARTOTEKA_PASSWORD environment variable not set")?;
        let update_interval_hours = match std::env::var("EKARTOTEKA_UPDATE_INTERVAL_HOURS") {
            Ok(raw) => raw
                .parse()
                .context("EKARTOTEKA_UPDATE_INTERVAL_HOURS is not a number")?,
            Err(_) => default_24(),
        };
        let config = Self {
            username,
            password,
            update_interval_hours,
            api_base_url: std::env::var("EKARTOTEKA_API_BASE_URL").ok(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Config file when present, environment otherwise.
    pub fn load_or_env(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::from_env()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            bail!("username must not be empty");
        }
        if self.password.is_empty() {
            bail!("password must not be empty");
        }
        if self.update_interval_hours == 0 {
            bail!("update_interval_hours must be at least 1");
        }
        Ok(())
    }
}
