// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::status::StatusSnapshot;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Receives crawl progress snapshots. Called from worker threads.
pub trait StatusPublisher: Send + Sync {
    fn publish(&self, snapshot: &StatusSnapshot);
}

/// Fans snapshots out to any number of subscribers over a broadcast channel.
///
/// Slow subscribers lose the oldest snapshots rather than blocking workers.
/// After `close` every subscriber sees the end of the channel.
pub struct BroadcastStatus {
    sender: Mutex<Option<broadcast::Sender<StatusSnapshot>>>,
    latest: Mutex<StatusSnapshot>,
}

impl BroadcastStatus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            latest: Mutex::new(StatusSnapshot::default()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusSnapshot> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.subscribe(),
            // Sender dropped right away, so the receiver is already closed
            None => broadcast::channel(1).1,
        }
    }

    /// Ends every subscription. Later snapshots only update `latest`.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> StatusSnapshot {
        self.latest.lock().clone()
    }
}

impl StatusPublisher for BroadcastStatus {
    fn publish(&self, snapshot: &StatusSnapshot) {
        *self.latest.lock() = snapshot.clone();
        if let Some(sender) = self.sender.lock().as_ref() {
            // No subscribers is not an error
            let _ = sender.send(snapshot.clone());
        }
    }
}

/// Keeps every published snapshot in memory
#[derive(Default)]
pub struct RecordingStatus {
    snapshots: Mutex<Vec<StatusSnapshot>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<StatusSnapshot> {
        self.snapshots.lock().clone()
    }

    pub fn last(&self) -> Option<StatusSnapshot> {
        self.snapshots.lock().last().cloned()
    }
}

impl StatusPublisher for RecordingStatus {
    fn publish(&self, snapshot: &StatusSnapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }
}
