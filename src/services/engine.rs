// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Concurrent crawl engine.
//!
//! `CrawlEngine` owns a state machine (`Idle -> Running -> Stopping -> Idle`).
//! Every run gets its own frontier, running flag and config snapshot, shared
//! by a fixed pool of OS worker threads. Workers only stop when the run is
//! stopped; a failing URL is recorded as `Failed` and the worker moves on.

use crate::models::config::CrawlConfig;
use crate::models::content::PageContent;
use crate::models::error::EngineError;
use crate::models::settings::Settings;
use crate::models::status::StatusSnapshot;
use crate::models::url::{UrlRecord, UrlStatus};
use crate::services::fetcher::PageFetcher;
use crate::services::frontier::Frontier;
use crate::services::link_extractor::{canonicalize, extract_links, CrawlPolicy};
use crate::services::logging::redact_url;
use crate::services::status::StatusPublisher;
use crate::services::store::{ConfigStore, ContentStore, MemoryStore, UrlStore};
use anyhow::Result;
use chrono::Utc;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Timing and sizing knobs of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub shutdown_timeout: Duration,
    pub default_thread_count: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for EngineSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            shutdown_timeout: settings.shutdown_timeout,
            default_thread_count: settings.default_thread_count,
        }
    }
}

/// Everything the engine depends on but does not implement
#[derive(Clone)]
pub struct Collaborators {
    pub configs: Arc<dyn ConfigStore>,
    pub urls: Arc<dyn UrlStore>,
    pub contents: Arc<dyn ContentStore>,
    pub status: Arc<dyn StatusPublisher>,
    pub fetcher: Arc<dyn PageFetcher>,
}

impl Collaborators {
    /// Use one `MemoryStore` for configs, URLs and content
    pub fn with_memory_store(
        store: Arc<MemoryStore>,
        status: Arc<dyn StatusPublisher>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            configs: store.clone(),
            urls: store.clone(),
            contents: store,
            status,
            fetcher,
        }
    }
}

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopping,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Running => write!(f, "running"),
            EngineState::Stopping => write!(f, "stopping"),
        }
    }
}

/// What a successful `start` set in motion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub config_id: i64,
    pub workers: usize,
    pub seeds: Vec<String>,
}

/// State shared by the workers of a single run
struct RunContext {
    config: Arc<CrawlConfig>,
    policy: CrawlPolicy,
    frontier: Frontier,
    running: AtomicBool,
    deps: Collaborators,
    poll_interval: Duration,
}

impl RunContext {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask workers to stop and wake the ones waiting on the frontier
    fn halt(&self) {
        self.running.store(false, Ordering::Release);
        self.frontier.close();
    }

    fn run_worker(&self, worker: usize) {
        debug!(worker, "worker started");

        while self.is_running() {
            let Some(entry) = self.frontier.poll(self.poll_interval) else {
                continue;
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.process_url(&entry.url, entry.depth)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(url = %redact_url(&entry.url), error = %e, "error processing URL");
                    self.record_failure(&entry.url, entry.depth);
                }
                Err(_) => {
                    error!(url = %redact_url(&entry.url), "panic while processing URL");
                    self.record_failure(&entry.url, entry.depth);
                }
            }

            self.frontier.finish(&entry.url);
        }

        debug!(worker, "worker stopped");
    }

    /// Fetch one URL, persist it and its content, then enqueue its links
    fn process_url(&self, url: &str, depth: u32) -> Result<()> {
        if !self.is_running() || self.config.exceeds_depth(depth) {
            debug!(url = %redact_url(url), depth, max_depth = ?self.config.max_depth, "depth limit reached or crawler stopped");
            return Ok(());
        }

        let existing = self.deps.urls.find_by_url(url)?;
        if existing.as_ref().is_some_and(|r| r.status == UrlStatus::Visited) {
            debug!(url = %redact_url(url), "URL already visited");
            return Ok(());
        }

        info!(url = %redact_url(url), depth, "processing URL");

        let page = match self.deps.fetcher.fetch(url) {
            Ok(page) => page,
            Err(e) => {
                if !self.is_running() {
                    debug!(url = %redact_url(url), "crawler stopped while fetching, dropping failure");
                    return Ok(());
                }
                error!(url = %redact_url(url), kind = e.kind(), error = %e, "failed to fetch URL");
                return self.save_status(existing, url, depth, UrlStatus::Failed);
            }
        };

        if !self.is_running() {
            debug!(url = %redact_url(url), "crawler stopped while fetching, dropping page");
            return Ok(());
        }

        let mut record = existing.unwrap_or_else(|| UrlRecord::new(url, depth > 0));
        record.mark(UrlStatus::Visited, Utc::now());
        self.deps.urls.save_url(&record)?;

        let content = PageContent::new(
            url,
            page.text.clone(),
            page.title.clone(),
            page.metadata.clone(),
        );
        self.deps.contents.save_content(&content)?;
        info!(url = %redact_url(url), title = %content.page_title, "content saved");

        self.publish(Some((url, UrlStatus::Visited)));

        if self.config.allows_links_from(depth) {
            let discovered = extract_links(&page, depth, &self.policy);
            let found = discovered.len();
            let queued = discovered
                .into_iter()
                .filter(|link| self.frontier.offer(link.url.clone(), link.depth))
                .inspect(|link| debug!(url = %redact_url(&link.url), depth = link.depth, "queued link"))
                .count();
            debug!(url = %redact_url(url), found, queued, "links extracted");
        }

        Ok(())
    }

    fn save_status(
        &self,
        existing: Option<UrlRecord>,
        url: &str,
        depth: u32,
        status: UrlStatus,
    ) -> Result<()> {
        let mut record = existing.unwrap_or_else(|| UrlRecord::new(url, depth > 0));
        record.mark(status, Utc::now());
        self.deps.urls.save_url(&record)?;
        self.publish(Some((url, status)));
        Ok(())
    }

    /// Persist a Failed status after an error escaped `process_url`
    fn record_failure(&self, url: &str, depth: u32) {
        let result = self
            .deps
            .urls
            .find_by_url(url)
            .and_then(|existing| self.save_status(existing, url, depth, UrlStatus::Failed));
        if let Err(e) = result {
            error!(url = %redact_url(url), error = %e, "failed to persist failed status");
        }
    }

    fn publish(&self, last: Option<(&str, UrlStatus)>) {
        let snapshot = build_snapshot(
            self.deps.urls.as_ref(),
            self.is_running(),
            self.frontier.pending_len(),
            last,
        );
        self.deps.status.publish(&snapshot);
    }
}

/// Stop workers of a run that never became active
fn abort_run(context: &RunContext, handles: Vec<JoinHandle<()>>) {
    context.halt();
    for handle in handles {
        let _ = handle.join();
    }
}

fn build_snapshot(
    urls: &dyn UrlStore,
    running: bool,
    pending: usize,
    last: Option<(&str, UrlStatus)>,
) -> StatusSnapshot {
    let count = |status: UrlStatus| {
        urls.count_by_status(status).unwrap_or_else(|e| {
            warn!(%status, error = %e, "failed to count URLs");
            0
        })
    };

    StatusSnapshot {
        running,
        visited_count: count(UrlStatus::Visited),
        pending_count: pending as u64,
        failed_count: count(UrlStatus::Failed),
        last_url: last.map(|(url, _)| url.to_string()),
        last_status: last.map(|(_, status)| status),
    }
}

struct ActiveRun {
    context: Arc<RunContext>,
    workers: Vec<JoinHandle<()>>,
    exits: Receiver<usize>,
}

impl ActiveRun {
    /// Wait for workers to report exit until `timeout`, join the ones that
    /// did and detach the rest. Returns the number of detached workers.
    fn shutdown(self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut exited = HashSet::new();
        while exited.len() < self.workers.len() {
            match self.exits.recv_deadline(deadline) {
                Ok(worker) => {
                    exited.insert(worker);
                }
                Err(_) => break,
            }
        }

        let mut detached = 0;
        for (worker, handle) in self.workers.into_iter().enumerate() {
            if exited.contains(&worker) || handle.is_finished() {
                if handle.join().is_err() {
                    error!(worker, "worker thread panicked");
                }
            } else {
                warn!(worker, "worker did not stop in time, detaching");
                detached += 1;
            }
        }
        detached
    }
}

enum Phase {
    Idle,
    Running(ActiveRun),
    Stopping,
}

/// The crawl engine. Construct one per process (or per test).
pub struct CrawlEngine {
    deps: Collaborators,
    settings: EngineSettings,
    phase: Mutex<Phase>,
}

impl CrawlEngine {
    pub fn new(deps: Collaborators, settings: EngineSettings) -> Self {
        Self {
            deps,
            settings,
            phase: Mutex::new(Phase::Idle),
        }
    }

    pub fn state(&self) -> EngineState {
        match *self.phase.lock() {
            Phase::Idle => EngineState::Idle,
            Phase::Running(_) => EngineState::Running,
            Phase::Stopping => EngineState::Stopping,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Start a crawl run for the given config
    pub fn start(&self, config_id: i64) -> Result<StartOutcome, EngineError> {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Running(_) => {
                warn!(config_id, "crawler is already running");
                return Err(EngineError::AlreadyRunning);
            }
            Phase::Stopping => {
                warn!(config_id, "crawler is still stopping");
                return Err(EngineError::Stopping);
            }
            Phase::Idle => {}
        }

        let mut config = self.deps.configs.get_config(config_id)?.ok_or_else(|| {
            error!(config_id, "crawl config not found");
            EngineError::ConfigNotFound(config_id)
        })?;

        let seeds = valid_seeds(&config);
        if seeds.is_empty() {
            warn!(config_id, seed_urls = %config.seed_urls, "no valid seed URL configured");
            return Err(EngineError::NoValidSeeds);
        }

        let workers = config.worker_count(self.settings.default_thread_count);
        config.last_run_at = Some(Utc::now());

        let context = Arc::new(RunContext {
            policy: CrawlPolicy::from_config(&config),
            config: Arc::new(config),
            frontier: Frontier::new(),
            running: AtomicBool::new(true),
            deps: self.deps.clone(),
            poll_interval: self.settings.poll_interval,
        });

        let (exit_tx, exits) = crossbeam_channel::unbounded();
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let worker_context = context.clone();
            let exit_tx = exit_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("crawl-worker-{worker}"))
                .spawn(move || {
                    worker_context.run_worker(worker);
                    let _ = exit_tx.send(worker);
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker, error = %e, "failed to spawn worker thread");
                    abort_run(&context, handles);
                    return Err(EngineError::WorkerSpawn(e));
                }
            }
        }

        // The run only counts once every worker is up
        if let Err(e) = self.deps.configs.save_config(&context.config) {
            error!(config_id, error = %e, "failed to record run start");
            abort_run(&context, handles);
            return Err(e.into());
        }

        for seed in &seeds {
            if context.frontier.offer(seed.clone(), 0) {
                info!(url = %redact_url(seed), "seed URL queued");
            }
        }

        *phase = Phase::Running(ActiveRun {
            context: context.clone(),
            workers: handles,
            exits,
        });
        drop(phase);

        info!(config_id, workers, seeds = seeds.len(), "crawler started");
        context.publish(None);

        Ok(StartOutcome {
            config_id,
            workers,
            seeds,
        })
    }

    /// Stop the current run: signal workers, wait for them (bounded), detach
    /// stragglers and drain the frontier
    pub fn stop(&self) -> Result<(), EngineError> {
        let run = {
            let mut phase = self.phase.lock();
            match std::mem::replace(&mut *phase, Phase::Stopping) {
                Phase::Running(run) => run,
                other => {
                    *phase = other;
                    warn!("crawler is not running");
                    return Err(EngineError::NotRunning);
                }
            }
        };

        let config_id = run.context.config.id;
        info!(config_id, "stopping crawler");

        let context = run.context.clone();
        context.halt();
        let detached = run.shutdown(self.settings.shutdown_timeout);
        if detached > 0 {
            warn!(detached, "some workers were still busy after the shutdown timeout");
        }
        context.frontier.clear();
        drop(context);

        *self.phase.lock() = Phase::Idle;
        info!(config_id, "crawler stopped");

        self.deps
            .status
            .publish(&build_snapshot(self.deps.urls.as_ref(), false, 0, None));
        Ok(())
    }

    /// Current progress snapshot
    pub fn snapshot(&self) -> StatusSnapshot {
        let (running, pending) = match &*self.phase.lock() {
            Phase::Running(run) => (true, run.context.frontier.pending_len()),
            _ => (false, 0),
        };
        build_snapshot(self.deps.urls.as_ref(), running, pending, None)
    }

    /// Block until the current run has nothing queued and nothing in flight.
    /// Returns true immediately when no run is active.
    pub fn wait_until_drained(&self, timeout: Duration) -> bool {
        let context = match &*self.phase.lock() {
            Phase::Running(run) => run.context.clone(),
            _ => return true,
        };
        context.frontier.wait_until_drained(timeout)
    }
}

impl Drop for CrawlEngine {
    fn drop(&mut self) {
        if self.is_running() {
            info!("crawl engine dropped while running, stopping");
            let _ = self.stop();
        }
    }
}

/// Canonical, deduplicated http(s) seeds in config order
fn valid_seeds(config: &CrawlConfig) -> Vec<String> {
    let mut seen = HashSet::new();
    config
        .seed_list()
        .into_iter()
        .filter_map(|seed| {
            let canonical = canonicalize(seed);
            if canonical.is_none() {
                warn!(seed, "skipping invalid seed URL");
            }
            canonical
        })
        .filter(|seed| seen.insert(seed.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::NewCrawlConfig;
    use crate::models::error::FetchError;
    use crate::models::page::FetchedPage;
    use crate::services::status::RecordingStatus;
    use std::collections::HashMap;

    /// Serves canned pages; unknown URLs fail with a network error
    #[derive(Default)]
    struct StubFetcher {
        links: HashMap<String, Vec<String>>,
        fetches: Mutex<Vec<String>>,
        panics_on: Option<String>,
        delay: Duration,
    }

    impl StubFetcher {
        fn with_site(site: &[(&str, &[&str])]) -> Self {
            Self {
                links: site
                    .iter()
                    .map(|(url, links)| {
                        (url.to_string(), links.iter().map(|l| l.to_string()).collect())
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetches.lock().clone()
        }
    }

    impl PageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            self.fetches.lock().push(url.to_string());
            thread::sleep(self.delay);
            if self.panics_on.as_deref() == Some(url) {
                panic!("parser blew up");
            }
            let links = self
                .links
                .get(url)
                .ok_or_else(|| FetchError::Network("connection refused".to_string()))?;
            Ok(FetchedPage {
                url: url.to_string(),
                title: format!("Title of {url}"),
                text: format!("Body of {url}"),
                links: links.clone(),
                ..FetchedPage::default()
            })
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        status: Arc<RecordingStatus>,
        fetcher: Arc<StubFetcher>,
        engine: CrawlEngine,
    }

    fn fast_settings() -> EngineSettings {
        EngineSettings {
            poll_interval: Duration::from_millis(10),
            shutdown_timeout: Duration::from_secs(5),
            default_thread_count: 3,
        }
    }

    fn harness(fetcher: StubFetcher) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let status = Arc::new(RecordingStatus::new());
        let fetcher = Arc::new(fetcher);
        let deps = Collaborators::with_memory_store(store.clone(), status.clone(), fetcher.clone());
        Harness {
            engine: CrawlEngine::new(deps, fast_settings()),
            store,
            status,
            fetcher,
        }
    }

    fn add_config(store: &MemoryStore, seeds: &str, max_depth: Option<u32>) -> i64 {
        store
            .create_config(NewCrawlConfig {
                seed_urls: seeds.to_string(),
                max_depth,
                keywords_to_search: None,
                thread_count: Some(2),
                exclude_images: false,
                exclude_pdfs: false,
                stay_on_domain: false,
            })
            .unwrap()
            .id
    }

    fn run_to_completion(h: &Harness, config_id: i64) {
        h.engine.start(config_id).unwrap();
        assert!(h.engine.wait_until_drained(Duration::from_secs(10)));
        h.engine.stop().unwrap();
    }

    fn status_of(store: &MemoryStore, url: &str) -> Option<UrlStatus> {
        store.find_by_url(url).unwrap().map(|r| r.status)
    }

    const CHAIN: &[(&str, &[&str])] = &[
        ("https://a.test/", &["https://a.test/b"]),
        ("https://a.test/b", &["https://a.test/c"]),
        ("https://a.test/c", &["https://a.test/d"]),
        ("https://a.test/d", &[]),
    ];

    #[test]
    fn test_start_unknown_config_keeps_idle() {
        let h = harness(StubFetcher::default());
        let err = h.engine.start(42).unwrap_err();
        assert!(matches!(err, EngineError::ConfigNotFound(42)));
        assert_eq!(h.engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_start_without_valid_seeds_keeps_idle() {
        let h = harness(StubFetcher::default());
        let id = add_config(&h.store, "ftp://a.test, not a url, ", Some(1));

        let err = h.engine.start(id).unwrap_err();
        assert!(matches!(err, EngineError::NoValidSeeds));
        assert!(!h.engine.is_running());
        assert!(h.store.get_config(id).unwrap().unwrap().last_run_at.is_none());
    }

    /// Reads from a `MemoryStore` but refuses every write
    struct ReadOnlyConfigs(Arc<MemoryStore>);

    impl ConfigStore for ReadOnlyConfigs {
        fn get_config(&self, id: i64) -> Result<Option<CrawlConfig>> {
            self.0.get_config(id)
        }

        fn save_config(&self, _config: &CrawlConfig) -> Result<()> {
            anyhow::bail!("config table is read-only")
        }

        fn create_config(&self, new_config: NewCrawlConfig) -> Result<CrawlConfig> {
            self.0.create_config(new_config)
        }

        fn list_configs(&self) -> Result<Vec<CrawlConfig>> {
            self.0.list_configs()
        }

        fn delete_config(&self, id: i64) -> Result<bool> {
            self.0.delete_config(id)
        }
    }

    #[test]
    fn test_failed_run_bookkeeping_aborts_start() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", None);
        let mut deps = h.engine.deps.clone();
        deps.configs = Arc::new(ReadOnlyConfigs(h.store.clone()));
        let engine = CrawlEngine::new(deps, fast_settings());

        let err = engine.start(id).unwrap_err();
        assert!(matches!(err, EngineError::Store(_)), "got {err:?}");
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(h.store.get_config(id).unwrap().unwrap().last_run_at.is_none());
        assert!(h.fetcher.fetched().is_empty());
        assert!(h.store.all_urls().unwrap().is_empty());

        // The same config still starts once writes succeed
        run_to_completion(&h, id);
        assert!(h.store.get_config(id).unwrap().unwrap().last_run_at.is_some());
    }

    #[test]
    fn test_start_is_idempotent() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", Some(0));

        let outcome = h.engine.start(id).unwrap();
        assert_eq!(outcome.workers, 2);
        assert_eq!(outcome.seeds, vec!["https://a.test/"]);
        assert!(matches!(
            h.engine.start(id),
            Err(EngineError::AlreadyRunning)
        ));
        assert!(h.engine.is_running());
        h.engine.stop().unwrap();
    }

    #[test]
    fn test_stop_when_idle_is_rejected() {
        let h = harness(StubFetcher::default());
        assert!(matches!(h.engine.stop(), Err(EngineError::NotRunning)));
        assert_eq!(h.engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_start_records_last_run_and_publishes() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", Some(0));

        run_to_completion(&h, id);

        assert!(h.store.get_config(id).unwrap().unwrap().last_run_at.is_some());
        let snapshots = h.status.snapshots();
        assert!(snapshots.first().unwrap().running);
        let last = h.status.last().unwrap();
        assert!(!last.running);
        assert_eq!(last.visited_count, 1);
        assert_eq!(h.engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_depth_bound_follows_link_hops() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", Some(1));

        run_to_completion(&h, id);

        assert_eq!(status_of(&h.store, "https://a.test/"), Some(UrlStatus::Visited));
        assert_eq!(status_of(&h.store, "https://a.test/b"), Some(UrlStatus::Visited));
        assert_eq!(status_of(&h.store, "https://a.test/c"), None);
        assert!(!h.fetcher.fetched().contains(&"https://a.test/c".to_string()));

        let b = h.store.find_by_url("https://a.test/b").unwrap().unwrap();
        assert!(b.deep_scan);
        let a = h.store.find_by_url("https://a.test/").unwrap().unwrap();
        assert!(!a.deep_scan);
    }

    #[test]
    fn test_depth_zero_only_fetches_seeds() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", Some(0));

        run_to_completion(&h, id);

        assert_eq!(h.fetcher.fetched(), vec!["https://a.test/"]);
    }

    #[test]
    fn test_unlimited_depth_follows_whole_chain() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", None);

        run_to_completion(&h, id);

        assert_eq!(h.store.count_by_status(UrlStatus::Visited).unwrap(), 4);
    }

    #[test]
    fn test_visited_urls_are_not_fetched_again_in_later_runs() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", Some(0));

        run_to_completion(&h, id);
        run_to_completion(&h, id);

        assert_eq!(h.fetcher.fetched().len(), 1);
        assert_eq!(
            h.store.find_content_by_url("https://a.test/").unwrap().len(),
            1
        );
    }

    #[test]
    fn test_fetch_failure_is_recorded_and_run_continues() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://down.test, https://a.test", Some(0));

        run_to_completion(&h, id);

        assert_eq!(status_of(&h.store, "https://down.test/"), Some(UrlStatus::Failed));
        assert_eq!(status_of(&h.store, "https://a.test/"), Some(UrlStatus::Visited));
        assert!(h.store.find_content_by_url("https://down.test/").unwrap().is_empty());
    }

    #[test]
    fn test_panic_during_processing_marks_failed() {
        let mut fetcher = StubFetcher::with_site(CHAIN);
        fetcher.panics_on = Some("https://a.test/b".to_string());
        let h = harness(fetcher);
        let id = add_config(&h.store, "https://a.test", None);

        run_to_completion(&h, id);

        assert_eq!(status_of(&h.store, "https://a.test/"), Some(UrlStatus::Visited));
        assert_eq!(status_of(&h.store, "https://a.test/b"), Some(UrlStatus::Failed));
        let b = h.store.find_by_url("https://a.test/b").unwrap().unwrap();
        assert!(b.deep_scan);
    }

    #[test]
    fn test_restart_after_stop() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let first = add_config(&h.store, "https://a.test", Some(0));
        let second = add_config(&h.store, "https://a.test/b", Some(0));

        run_to_completion(&h, first);
        run_to_completion(&h, second);

        assert_eq!(h.store.count_by_status(UrlStatus::Visited).unwrap(), 2);
    }

    #[test]
    fn test_stop_discards_results_of_inflight_fetches() {
        let mut fetcher = StubFetcher::with_site(CHAIN);
        fetcher.delay = Duration::from_millis(300);
        let h = harness(fetcher);
        let id = add_config(&h.store, "https://a.test", None);

        h.engine.start(id).unwrap();
        thread::sleep(Duration::from_millis(50));
        h.engine.stop().unwrap();

        assert_eq!(h.store.all_urls().unwrap().len(), 0);
        assert!(!h.engine.is_running());
    }

    #[test]
    fn test_drop_stops_running_engine() {
        let fetcher = StubFetcher::with_site(CHAIN);
        let h = harness(fetcher);
        let id = add_config(&h.store, "https://a.test", Some(0));
        h.engine.start(id).unwrap();

        let status = h.status.clone();
        drop(h.engine);

        assert!(!status.last().unwrap().running);
    }

    #[test]
    fn test_seeds_are_deduplicated() {
        let config = CrawlConfig {
            id: 1,
            seed_urls: "https://a.test, https://a.test/, https://a.test#top".to_string(),
            max_depth: Some(0),
            keywords_to_search: None,
            thread_count: None,
            exclude_images: false,
            exclude_pdfs: false,
            stay_on_domain: false,
            status: crate::models::config::ConfigStatus::Active,
            created_at: Utc::now(),
            last_run_at: None,
        };
        assert_eq!(valid_seeds(&config), vec!["https://a.test/"]);
    }

    #[test]
    fn test_concurrent_discovery_fetches_each_page_once() {
        // Every page links to every other page
        let pages: Vec<String> = (0..20).map(|i| format!("https://mesh.test/{i}")).collect();
        let all: Vec<&str> = pages.iter().map(String::as_str).collect();
        let site: Vec<(&str, &[&str])> = all.iter().map(|p| (*p, all.as_slice())).collect();

        let h = harness(StubFetcher::with_site(&site));
        let id = h
            .store
            .create_config(NewCrawlConfig {
                seed_urls: all.join(","),
                max_depth: Some(3),
                keywords_to_search: None,
                thread_count: Some(8),
                exclude_images: false,
                exclude_pdfs: false,
                stay_on_domain: false,
            })
            .unwrap()
            .id;

        run_to_completion(&h, id);

        let fetched = h.fetcher.fetched();
        let unique: HashSet<_> = fetched.iter().collect();
        assert_eq!(fetched.len(), 20);
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_snapshot_counts() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://down.test, https://a.test", Some(1));

        run_to_completion(&h, id);

        let snapshot = h.engine.snapshot();
        assert!(!snapshot.running);
        assert_eq!(snapshot.visited_count, 2);
        assert_eq!(snapshot.failed_count, 1);
        assert_eq!(snapshot.pending_count, 0);
    }

    #[test]
    fn test_worker_count_uses_default_when_unset() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = h
            .store
            .create_config(NewCrawlConfig {
                seed_urls: "https://a.test".to_string(),
                max_depth: Some(0),
                keywords_to_search: None,
                thread_count: None,
                exclude_images: false,
                exclude_pdfs: false,
                stay_on_domain: false,
            })
            .unwrap()
            .id;

        let outcome = h.engine.start(id).unwrap();
        assert_eq!(outcome.workers, 3);
        h.engine.stop().unwrap();
    }

    #[test]
    fn test_published_snapshots_name_last_url() {
        let h = harness(StubFetcher::with_site(CHAIN));
        let id = add_config(&h.store, "https://a.test", Some(0));

        run_to_completion(&h, id);

        let visited: Vec<_> = h
            .status
            .snapshots()
            .into_iter()
            .filter(|s| s.last_status == Some(UrlStatus::Visited))
            .collect();
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].last_url.as_deref(), Some("https://a.test/"));
        assert!(visited[0].running);
    }
}
