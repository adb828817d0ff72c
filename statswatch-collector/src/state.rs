//! Published scrape results shared between the scraper and readers.

use std::sync::Arc;

use parking_lot::RwLock;
use statswatch_types::Snapshot;

use crate::history::HistoryRing;

/// All snapshots produced by one scrape tick.
///
/// Shared by reference between the current slot and the history ring.
pub type Batch = Arc<[Snapshot]>;

#[derive(Debug)]
struct Published {
    current: Batch,
    history: HistoryRing<Batch>,
}

/// The latest batch plus the rolling history.
///
/// Both live under one lock so a publication updates them together:
/// readers see either the previous tick or the complete new one.
#[derive(Debug)]
pub struct PublishedState {
    inner: RwLock<Published>,
}

impl PublishedState {
    /// Create empty state retaining up to `window` batches.
    pub fn new(window: usize) -> Self {
        Self {
            inner: RwLock::new(Published {
                current: Arc::from(Vec::new()),
                history: HistoryRing::new(window),
            }),
        }
    }

    /// Swap in a finished batch and append it to the history.
    pub fn publish(&self, batch: Batch) {
        let mut inner = self.inner.write();
        inner.history.put(batch.clone());
        inner.current = batch;
    }

    /// The most recently published batch (empty before the first tick).
    pub fn current(&self) -> Batch {
        self.inner.read().current.clone()
    }

    /// Up to `n` most recent batches, oldest first.
    pub fn history(&self, n: usize) -> Vec<Batch> {
        self.inner.read().history.get(n).into_iter().cloned().collect()
    }

    /// Number of ticks currently retained.
    pub fn retained(&self) -> usize {
        self.inner.read().history.len()
    }

    /// Maximum number of ticks retained.
    pub fn window(&self) -> usize {
        self.inner.read().history.capacity()
    }
}
