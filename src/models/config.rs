// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Worker count used when a config leaves `thread_count` unset or non-positive
pub const DEFAULT_THREAD_COUNT: usize = 5;

/// Whether an operator considers a config usable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStatus::Active => write!(f, "active"),
            ConfigStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A stored crawl configuration. The engine reads one snapshot per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub id: i64,
    /// Comma-separated seed URLs as entered by the operator
    pub seed_urls: String,
    /// Maximum number of link hops from a seed; `None` means unlimited
    pub max_depth: Option<u32>,
    /// Free-form operator note, not used while crawling
    pub keywords_to_search: Option<String>,
    pub thread_count: Option<i32>,
    pub exclude_images: bool,
    pub exclude_pdfs: bool,
    pub stay_on_domain: bool,
    pub status: ConfigStatus,
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl CrawlConfig {
    /// Seed entries split on commas, trimmed, empties dropped
    pub fn seed_list(&self) -> Vec<&str> {
        self.seed_urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Number of workers to spawn for a run
    pub fn worker_count(&self, default: usize) -> usize {
        match self.thread_count {
            Some(n) if n > 0 => n as usize,
            _ => default,
        }
    }

    /// Whether pages at `depth` may still have their links followed
    pub fn allows_links_from(&self, depth: u32) -> bool {
        self.max_depth.map_or(true, |max| max > depth)
    }

    /// Whether a page at `depth` is past the configured limit
    pub fn exceeds_depth(&self, depth: u32) -> bool {
        self.max_depth.is_some_and(|max| depth > max)
    }

    /// Replace the editable fields, keeping `id` and the timestamps
    pub fn apply(&mut self, update: UpdateCrawlConfig) {
        let fields = update.fields;
        self.seed_urls = fields.seed_urls;
        self.max_depth = fields.max_depth;
        self.keywords_to_search = fields.keywords_to_search;
        self.thread_count = fields.thread_count;
        self.exclude_images = fields.exclude_images;
        self.exclude_pdfs = fields.exclude_pdfs;
        self.stay_on_domain = fields.stay_on_domain;
        self.status = update.status;
    }
}

/// Request body for creating a config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCrawlConfig {
    pub seed_urls: String,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub keywords_to_search: Option<String>,
    #[serde(default)]
    pub thread_count: Option<i32>,
    #[serde(default)]
    pub exclude_images: bool,
    #[serde(default)]
    pub exclude_pdfs: bool,
    #[serde(default)]
    pub stay_on_domain: bool,
}

/// Request body for editing a config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCrawlConfig {
    #[serde(flatten)]
    pub fields: NewCrawlConfig,
    #[serde(default)]
    pub status: ConfigStatus,
}
