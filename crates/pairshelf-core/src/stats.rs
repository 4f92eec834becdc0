//! Cache statistics surface shared by both caches.

use serde::{Deserialize, Serialize};

/// Point-in-time statistics snapshot for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Live entries at snapshot time.
    pub entries: usize,
    /// Lookups answered from the cache since creation (or the last clear).
    pub hits: u64,
    /// Lookups that fell through since creation (or the last clear).
    pub misses: u64,
    /// Estimated bytes held by cached values.
    pub memory_estimate_bytes: u64,
}

impl CacheStatistics {
    /// Fraction of lookups answered from the cache, in `[0, 1]`.
    /// Returns 0 before any lookup has happened.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
