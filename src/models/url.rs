// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Pending,
    Visited,
    Failed,
}

impl UrlStatus {
    /// Parse from the lowercase wire form
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pending" => Some(UrlStatus::Pending),
            "visited" => Some(UrlStatus::Visited),
            "failed" => Some(UrlStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlStatus::Pending => write!(f, "pending"),
            UrlStatus::Visited => write!(f, "visited"),
            UrlStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A crawled (or attempted) URL, keyed by its canonical string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    pub status: UrlStatus,
    /// Time of the last processing attempt
    pub visit_date: Option<DateTime<Utc>>,
    /// True when reached by following links rather than seeding
    pub deep_scan: bool,
}

impl UrlRecord {
    pub fn new(url: impl Into<String>, deep_scan: bool) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Pending,
            visit_date: None,
            deep_scan,
        }
    }

    /// Record a processing attempt with its outcome
    pub fn mark(&mut self, status: UrlStatus, at: DateTime<Utc>) {
        self.status = status;
        self.visit_date = Some(at);
    }
}
