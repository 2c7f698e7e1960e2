// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-memory URL frontier shared by the crawl workers of one run.
//!
//! Queue membership, the claimed set and the in-flight counter live under a
//! single lock, so "is this URL new?" and "claim it" are one operation.

use parking_lot::{Condvar, Mutex};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// A URL waiting to be processed, with its distance in link hops from a seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

#[derive(Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

impl FrontierState {
    fn claim_next(&mut self) -> Option<FrontierEntry> {
        while let Some(entry) = self.queue.pop_front() {
            self.queued.remove(&entry.url);
            if self.visited.insert(entry.url.clone()) {
                self.in_flight += 1;
                return Some(entry);
            }
        }
        None
    }

    fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.in_flight == 0
    }
}

/// Thread-safe FIFO of pending URLs plus the set of URLs claimed this run
#[derive(Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    available: Condvar,
    drained: Condvar,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a URL unless it is already queued, already claimed, or the
    /// frontier is closed. Returns true if the URL was added.
    pub fn offer(&self, url: impl Into<String>, depth: u32) -> bool {
        let url = url.into();
        let mut state = self.state.lock();
        if state.closed || state.queued.contains(&url) || state.visited.contains(&url) {
            return false;
        }
        state.queued.insert(url.clone());
        state.queue.push_back(FrontierEntry { url, depth });
        drop(state);

        self.available.notify_one();
        true
    }

    /// Take and claim the next pending URL, waiting at most `wait` for one.
    ///
    /// Returns `None` on timeout or once the frontier is closed. Every
    /// returned entry must be handed back through [`Frontier::finish`].
    pub fn poll(&self, wait: Duration) -> Option<FrontierEntry> {
        let deadline = Instant::now() + wait;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(entry) = self.claim(&mut state) {
                return Some(entry);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return if state.closed {
                    None
                } else {
                    self.claim(&mut state)
                };
            }
        }
    }

    /// Skipping stale entries can empty the queue, which may drain the frontier
    fn claim(&self, state: &mut FrontierState) -> Option<FrontierEntry> {
        let had_queued = !state.queue.is_empty();
        let entry = state.claim_next();
        if entry.is_none() && had_queued && state.is_drained() {
            self.drained.notify_all();
        }
        entry
    }

    /// Claim a URL outside of `poll`. Only the first caller gets `true`.
    pub fn mark_visited(&self, url: &str) -> bool {
        self.state.lock().visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.state.lock().visited.contains(url)
    }

    /// Release the in-flight slot of an entry returned by `poll`
    pub fn finish(&self, url: &str) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        tracing::trace!(url, in_flight = state.in_flight, "frontier entry finished");
        if state.is_drained() {
            self.drained.notify_all();
        }
    }

    /// True when nothing is queued and no claimed entry is still in flight
    pub fn is_drained(&self) -> bool {
        self.state.lock().is_drained()
    }

    /// Block until the frontier is drained or `timeout` passes
    pub fn wait_until_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.is_drained() && !state.closed {
            if self.drained.wait_until(&mut state, deadline).timed_out() {
                return state.is_drained();
            }
        }
        state.is_drained()
    }

    /// Reject further offers and wake every waiting worker
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
        self.drained.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Drop all queued and claimed URLs
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.queue.clear();
        state.queued.clear();
        state.visited.clear();
        state.in_flight = 0;
        drop(state);
        self.drained.notify_all();
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.state.lock().visited.len()
    }
}
