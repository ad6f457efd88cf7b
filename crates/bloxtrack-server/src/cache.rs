use std::collections::VecDeque;
use std::time::SystemTime;

use bloxtrack_core::summary::{GameSummary, UserSummary};

/// Default maximum number of cached summaries before oldest are evicted.
const DEFAULT_MAX_ENTRIES: usize = 500;

/// Either kind of last-known-good record.
#[derive(Debug, Clone)]
pub enum CachedSummary {
    Game(GameSummary),
    User(UserSummary),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: String,
    summary: CachedSummary,
    fetched_at: SystemTime,
}

/// Bounded in-memory store of last-known-good summaries, keyed by normalized
/// identifier. Consulted only when a lookup's fatal path fails; serving a
/// stale record beats serving an error. Writes are idempotent and
/// last-writer-wins: all writers for a key project the same upstream data.
pub struct SummaryCache {
    entries: VecDeque<CacheEntry>,
    max_entries: usize,
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl SummaryCache {
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Look up the last-known-good summary for a key, with its fetch time.
    pub fn get(&self, key: &str) -> Option<(CachedSummary, SystemTime)> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| (e.summary.clone(), e.fetched_at))
    }

    /// Store a summary, replacing any previous entry for the key. Evicts the
    /// oldest entry when at capacity.
    pub fn put(&mut self, key: &str, summary: CachedSummary) {
        self.entries.retain(|e| e.key != key);
        self.entries.push_back(CacheEntry {
            key: key.to_string(),
            summary,
            fetched_at: SystemTime::now(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
