//! Directory-keyed cache of scan indexes.
//!
//! Keys are normalized directory paths; values are the immutable
//! [`ScanIndex`] produced by a scan, shared out as `Arc` clones so eviction
//! can never invalidate a result a caller is still holding. Entries expire
//! after a TTL (checked lazily on `get`) and the least-recently-used entry
//! is evicted when the entry bound is exceeded.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::debug;

use pairshelf_core::{CacheStatistics, ScanIndex};
use std::sync::Arc;

struct CachedScan {
    index: Arc<ScanIndex>,
    inserted: Instant,
    bytes: u64,
}

/// Bounded, TTL-expiring cache of directory scan results.
///
/// All mutation happens under one mutex scoped to this instance; hit/miss
/// counters are atomics so [`statistics`](Self::statistics) never contends
/// with lookups.
pub struct ScanResultCache {
    entries: Mutex<LruCache<PathBuf, CachedScan>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    memory: AtomicU64,
}

impl ScanResultCache {
    /// Create a cache bounded to `max_entries` with the given TTL.
    /// A zero bound is clamped to one entry.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(max_entries.max(1)).expect("clamped above zero");
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            memory: AtomicU64::new(0),
        }
    }

    /// Look up an unexpired index for a directory, refreshing its recency.
    ///
    /// An entry older than the TTL behaves as a miss and is removed on the
    /// spot.
    pub fn get(&self, dir: &Path) -> Option<Arc<ScanIndex>> {
        let key = normalize(dir);
        let mut entries = self.entries.lock().expect("scan cache lock poisoned");

        let expired = match entries.peek(&key) {
            Some(entry) => entry.inserted.elapsed() > self.ttl,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            if let Some(old) = entries.pop(&key) {
                self.memory.fetch_sub(old.bytes, Ordering::Relaxed);
                debug!(dir = %key.display(), "scan cache entry expired");
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        entries.get(&key).map(|entry| Arc::clone(&entry.index))
    }

    /// Store the index for a directory, evicting the least-recently-used
    /// entry if the bound is exceeded.
    pub fn put(&self, dir: &Path, index: Arc<ScanIndex>) {
        let key = normalize(dir);
        let bytes = index.estimated_bytes();
        let entry = CachedScan {
            index,
            inserted: Instant::now(),
            bytes,
        };

        let mut entries = self.entries.lock().expect("scan cache lock poisoned");
        self.memory.fetch_add(bytes, Ordering::Relaxed);
        if let Some((old_key, old)) = entries.push(key, entry) {
            // `push` returns the replaced or evicted entry.
            self.memory.fetch_sub(old.bytes, Ordering::Relaxed);
            debug!(dir = %old_key.display(), "scan cache entry evicted");
        }
    }

    /// Drop the entry for a directory, if present.
    pub fn invalidate(&self, dir: &Path) {
        let key = normalize(dir);
        let mut entries = self.entries.lock().expect("scan cache lock poisoned");
        if let Some(old) = entries.pop(&key) {
            self.memory.fetch_sub(old.bytes, Ordering::Relaxed);
            debug!(dir = %key.display(), "scan cache entry invalidated");
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("scan cache lock poisoned");
        entries.clear();
        self.memory.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of live entries (expired-but-unreaped entries included).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("scan cache lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics snapshot.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            memory_estimate_bytes: self.memory.load(Ordering::Relaxed),
        }
    }
}

/// Normalize a directory path into its cache-key form.
///
/// Canonicalizes when the path still exists; otherwise falls back to a
/// lexical cleanup so `invalidate` can still address entries for deleted
/// directories.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| path.components().collect())
}
