// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use thiserror::Error;

/// Errors returned by the engine's lifecycle operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("crawl config {0} not found")]
    ConfigNotFound(i64),
    #[error("no valid http(s) seed URL in config")]
    NoValidSeeds,
    #[error("crawler is already running")]
    AlreadyRunning,
    #[error("crawler is not running")]
    NotRunning,
    #[error("crawler is shutting down")]
    Stopping,
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Why a single URL could not be fetched. Always recovered by the worker.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    /// Short machine-readable kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::UnsupportedScheme(_) => "unsupported_scheme",
            FetchError::Timeout => "timeout",
            FetchError::Network(_) => "network_error",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::UnsupportedContentType(_) => "unsupported_content_type",
            FetchError::Body(_) => "body_error",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}
