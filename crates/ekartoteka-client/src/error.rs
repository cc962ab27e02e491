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

//! Error types for the eKartoteka client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authorization failed for {username}: {status} {body}")]
    AuthFailed {
        username: String,
        status: u16,
        body: String,
    },

    #[error("GET {url} failed: {status} {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
