// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

#![allow(dead_code)]

use crawl_agent::models::config::NewCrawlConfig;
use crawl_agent::models::error::FetchError;
use crawl_agent::models::page::FetchedPage;
use crawl_agent::services::engine::{Collaborators, CrawlEngine, EngineSettings};
use crawl_agent::services::fetcher::PageFetcher;
use crawl_agent::services::status::RecordingStatus;
use crawl_agent::services::store::MemoryStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

enum Response {
    Page(FetchedPage),
    /// Sleep, then fail like a request that hit the client timeout
    Timeout(Duration),
}

/// In-memory web: URL -> canned page or simulated timeout
#[derive(Default)]
pub struct FakeWeb {
    responses: HashMap<String, Response>,
    fetches: Mutex<Vec<String>>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, title: &str, links: &[&str]) -> Self {
        let page = FetchedPage {
            url: url.to_string(),
            title: title.to_string(),
            text: format!("Welcome to {title}"),
            links: links.iter().map(|l| l.to_string()).collect(),
            ..FetchedPage::default()
        };
        self.responses.insert(url.to_string(), Response::Page(page));
        self
    }

    pub fn timeout(mut self, url: &str, after: Duration) -> Self {
        self.responses
            .insert(url.to_string(), Response::Timeout(after));
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }
}

impl PageFetcher for FakeWeb {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetches.lock().push(url.to_string());
        match self.responses.get(url) {
            Some(Response::Page(page)) => Ok(page.clone()),
            Some(Response::Timeout(after)) => {
                thread::sleep(*after);
                Err(FetchError::Timeout)
            }
            None => Err(FetchError::HttpStatus(404)),
        }
    }
}

pub struct TestCrawler {
    pub engine: CrawlEngine,
    pub store: Arc<MemoryStore>,
    pub status: Arc<RecordingStatus>,
}

pub fn test_crawler(fetcher: Arc<dyn PageFetcher>) -> TestCrawler {
    let store = Arc::new(MemoryStore::new());
    let status = Arc::new(RecordingStatus::new());
    let deps = Collaborators::with_memory_store(store.clone(), status.clone(), fetcher);
    let settings = EngineSettings {
        poll_interval: Duration::from_millis(20),
        shutdown_timeout: Duration::from_secs(5),
        default_thread_count: 2,
    };
    TestCrawler {
        engine: CrawlEngine::new(deps, settings),
        store,
        status,
    }
}

pub fn new_config(seeds: &str, max_depth: Option<u32>, threads: i32) -> NewCrawlConfig {
    NewCrawlConfig {
        seed_urls: seeds.to_string(),
        max_depth,
        keywords_to_search: None,
        thread_count: Some(threads),
        exclude_images: false,
        exclude_pdfs: false,
        stay_on_domain: false,
    }
}
