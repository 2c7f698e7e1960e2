// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::content::PageContent;
use crate::models::url::UrlRecord;
use serde::{Deserialize, Serialize};

/// Response after a crawl run was started
#[derive(Debug, Serialize, Deserialize)]
pub struct StartCrawlResponse {
    pub success: bool,
    pub message: String,
    pub config_id: i64,
    /// Number of worker threads spawned
    pub workers: usize,
    /// Canonical seed URLs that were queued
    pub seeds: Vec<String>,
}

/// Response after a crawl run was stopped
#[derive(Debug, Serialize, Deserialize)]
pub struct StopCrawlResponse {
    pub success: bool,
    pub message: String,
}

/// Response after a config was deleted
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteConfigResponse {
    pub success: bool,
    pub message: String,
    pub id: i64,
}

/// Query parameters for listing URL records
#[derive(Debug, Deserialize)]
pub struct UrlListQuery {
    pub status: Option<String>,
}

/// Response for listing URL records
#[derive(Debug, Serialize, Deserialize)]
pub struct UrlListResponse {
    pub urls: Vec<UrlRecord>,
    pub count: usize,
}

/// Full dump of the crawled corpus
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportResponse {
    pub exported_at: String,
    pub urls: Vec<UrlRecord>,
    pub pages: Vec<PageContent>,
}
