// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Persistence collaborators of the crawl engine.
//!
//! The engine only talks to these traits. `MemoryStore` implements all three
//! with upsert-by-key semantics and backs the binary and the tests.

use crate::models::config::{ConfigStatus, CrawlConfig, NewCrawlConfig};
use crate::models::content::PageContent;
use crate::models::url::{UrlRecord, UrlStatus};
use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage for crawl configurations
pub trait ConfigStore: Send + Sync {
    fn get_config(&self, id: i64) -> Result<Option<CrawlConfig>>;
    /// Insert or replace by `id`
    fn save_config(&self, config: &CrawlConfig) -> Result<()>;
    fn create_config(&self, new_config: NewCrawlConfig) -> Result<CrawlConfig>;
    fn list_configs(&self) -> Result<Vec<CrawlConfig>>;
    /// Returns false when no config had this `id`
    fn delete_config(&self, id: i64) -> Result<bool>;
}

/// Storage for URL records, keyed by URL string
pub trait UrlStore: Send + Sync {
    fn find_by_url(&self, url: &str) -> Result<Option<UrlRecord>>;
    /// Insert or replace by `url`
    fn save_url(&self, record: &UrlRecord) -> Result<()>;
    fn count_by_status(&self, status: UrlStatus) -> Result<u64>;
    fn find_by_status(&self, status: UrlStatus) -> Result<Vec<UrlRecord>>;
    fn all_urls(&self) -> Result<Vec<UrlRecord>>;
}

/// Append-only storage for extracted page content
pub trait ContentStore: Send + Sync {
    fn save_content(&self, content: &PageContent) -> Result<()>;
    fn find_content_by_url(&self, url: &str) -> Result<Vec<PageContent>>;
    fn all_content(&self) -> Result<Vec<PageContent>>;
}

#[derive(Default)]
struct ConfigTable {
    next_id: i64,
    rows: HashMap<i64, CrawlConfig>,
}

/// In-memory implementation of every store trait
#[derive(Default)]
pub struct MemoryStore {
    configs: RwLock<ConfigTable>,
    urls: RwLock<HashMap<String, UrlRecord>>,
    contents: RwLock<Vec<PageContent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn get_config(&self, id: i64) -> Result<Option<CrawlConfig>> {
        Ok(self.configs.read().rows.get(&id).cloned())
    }

    fn save_config(&self, config: &CrawlConfig) -> Result<()> {
        let mut table = self.configs.write();
        table.next_id = table.next_id.max(config.id);
        table.rows.insert(config.id, config.clone());
        Ok(())
    }

    fn create_config(&self, new_config: NewCrawlConfig) -> Result<CrawlConfig> {
        let mut table = self.configs.write();
        table.next_id += 1;
        let config = CrawlConfig {
            id: table.next_id,
            seed_urls: new_config.seed_urls,
            max_depth: new_config.max_depth,
            keywords_to_search: new_config.keywords_to_search,
            thread_count: new_config.thread_count,
            exclude_images: new_config.exclude_images,
            exclude_pdfs: new_config.exclude_pdfs,
            stay_on_domain: new_config.stay_on_domain,
            status: ConfigStatus::Active,
            created_at: Utc::now(),
            last_run_at: None,
        };
        table.rows.insert(config.id, config.clone());
        Ok(config)
    }

    fn list_configs(&self) -> Result<Vec<CrawlConfig>> {
        let mut configs: Vec<_> = self.configs.read().rows.values().cloned().collect();
        configs.sort_by_key(|c| c.id);
        Ok(configs)
    }

    fn delete_config(&self, id: i64) -> Result<bool> {
        Ok(self.configs.write().rows.remove(&id).is_some())
    }
}

impl UrlStore for MemoryStore {
    fn find_by_url(&self, url: &str) -> Result<Option<UrlRecord>> {
        Ok(self.urls.read().get(url).cloned())
    }

    fn save_url(&self, record: &UrlRecord) -> Result<()> {
        self.urls
            .write()
            .insert(record.url.clone(), record.clone());
        Ok(())
    }

    fn count_by_status(&self, status: UrlStatus) -> Result<u64> {
        Ok(self
            .urls
            .read()
            .values()
            .filter(|r| r.status == status)
            .count() as u64)
    }

    fn find_by_status(&self, status: UrlStatus) -> Result<Vec<UrlRecord>> {
        let mut records: Vec<_> = self
            .urls
            .read()
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(records)
    }

    fn all_urls(&self) -> Result<Vec<UrlRecord>> {
        let mut records: Vec<_> = self.urls.read().values().cloned().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(records)
    }
}

impl ContentStore for MemoryStore {
    fn save_content(&self, content: &PageContent) -> Result<()> {
        self.contents.write().push(content.clone());
        Ok(())
    }

    fn find_content_by_url(&self, url: &str) -> Result<Vec<PageContent>> {
        Ok(self
            .contents
            .read()
            .iter()
            .filter(|c| c.url == url)
            .cloned()
            .collect())
    }

    fn all_content(&self) -> Result<Vec<PageContent>> {
        Ok(self.contents.read().clone())
    }
}
