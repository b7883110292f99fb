//! StatsCollector - concurrent per-content success counters

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Concurrent counter keyed by canonical message content
///
/// Entries are created lazily at 1 and never removed. Owned by whoever
/// builds the dispatcher and shared through `Arc`.
#[derive(Debug, Default)]
pub struct StatsCollector {
    counters: DashMap<String, u64>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically increment the counter for `key`, inserting it at 1
    ///
    /// The increment happens under the key's shard lock, so concurrent
    /// callers never lose updates.
    pub fn register(&self, key: &str) {
        if let Some(mut count) = self.counters.get_mut(key) {
            *count += 1;
            return;
        }
        // Entry re-checks under the write lock in case of a racing insert.
        *self.counters.entry(key.to_owned()).or_insert(0) += 1;
    }

    /// Current count for `key` (0 if never registered)
    pub fn count(&self, key: &str) -> u64 {
        self.counters.get(key).map(|c| *c).unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Point-in-time copy of all entries, sorted by count descending
    ///
    /// Copies shard by shard and sorts outside any lock. Ties are ordered by
    /// key so output is deterministic.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut entries: Vec<StatEntry> = self
            .counters
            .iter()
            .map(|entry| StatEntry {
                key: entry.key().clone(),
                count: *entry.value(),
            })
            .collect();

        entries.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        let total = entries.iter().map(|e| e.count).sum();

        StatsSnapshot { total, entries }
    }
}

/// One aggregated counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub key: String,
    pub count: u64,
}

/// Consistent read of the collector
///
/// `total` is always the sum of `entries` counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub entries: Vec<StatEntry>,
}

impl StatsSnapshot {
    /// Count for `key` in this snapshot (0 if absent)
    pub fn count(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// First `n` entries (all when `n == 0`)
    pub fn top(&self, n: usize) -> &[StatEntry] {
        if n == 0 {
            &self.entries
        } else {
            &self.entries[..n.min(self.entries.len())]
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
