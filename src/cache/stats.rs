//! Cache Statistics Module
//!
//! Tracks store metrics including hits, misses, and lazy expirations.

use serde::Serialize;

// == Cache Stats ==
/// Tracks store performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of reads that found a live record
    pub hits: u64,
    /// Number of reads that found nothing (absent or expired)
    pub misses: u64,
    /// Number of records purged because they had expired
    pub expirations: u64,
    /// Current number of records held, live or not yet purged
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Records a cache hit.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a cache miss.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records `count` purged records.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}
