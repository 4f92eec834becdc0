//! Bounded thumbnail cache.
//!
//! Entries are bounded by count AND by total bytes; whichever bound is
//! exceeded, least-recently-used entries go first. Eviction is a batch
//! operation: the removal set is computed from the LRU tail, then applied,
//! so heavy churn does one rebalance per insert instead of one per victim.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tracing::debug;

use pairshelf_core::CacheStatistics;

use crate::key::ThumbKey;
use crate::render::Thumbnail;

/// Fixed accounting overhead per entry (key paths, map node).
const ENTRY_OVERHEAD: u64 = 160;

fn entry_cost(thumb: &Thumbnail) -> u64 {
    thumb.byte_len() + ENTRY_OVERHEAD
}

/// Thumbnail store bounded by entry count and total bytes.
///
/// Values are handed out as `Arc` clones, so an eviction can never
/// invalidate a bitmap a caller is still displaying. All mutation happens
/// under one mutex scoped to this instance; counters are atomics so
/// [`statistics`](Self::statistics) never contends with lookups.
pub struct ThumbnailCache {
    entries: Mutex<LruCache<ThumbKey, Arc<Thumbnail>>>,
    max_entries: usize,
    max_bytes: u64,
    bytes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ThumbnailCache {
    /// Create a cache bounded to `max_entries` entries and `max_bytes`
    /// total retained bytes. A zero entry bound is clamped to one.
    pub fn new(max_entries: usize, max_bytes: u64) -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
            max_entries: max_entries.max(1),
            max_bytes,
            bytes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a thumbnail, refreshing its recency on a hit.
    pub fn get(&self, key: &ThumbKey) -> Option<Arc<Thumbnail>> {
        let mut entries = self.entries.lock().expect("thumb cache lock poisoned");
        match entries.get(key) {
            Some(thumb) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(thumb))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Whether a key is present, without touching its recency.
    pub fn contains(&self, key: &ThumbKey) -> bool {
        self.entries
            .lock()
            .expect("thumb cache lock poisoned")
            .peek(key)
            .is_some()
    }

    /// Insert a thumbnail as most recently used, then evict until both
    /// bounds hold again.
    ///
    /// An entry larger than the byte bound on its own is evicted in the
    /// same pass; the bound invariant holds unconditionally.
    pub fn insert(&self, key: ThumbKey, thumb: Arc<Thumbnail>) {
        let cost = entry_cost(&thumb);
        let mut entries = self.entries.lock().expect("thumb cache lock poisoned");

        if let Some((_, replaced)) = entries.push(key, thumb) {
            self.bytes.fetch_sub(entry_cost(&replaced), Ordering::Relaxed);
        }
        self.bytes.fetch_add(cost, Ordering::Relaxed);
        self.evict_to_bounds(&mut entries);
    }

    /// Compute the LRU-tail removal set, then apply it.
    fn evict_to_bounds(&self, entries: &mut LruCache<ThumbKey, Arc<Thumbnail>>) {
        let mut victims: Vec<ThumbKey> = Vec::new();
        let mut len = entries.len();
        let mut bytes = self.bytes.load(Ordering::Relaxed);

        for (key, thumb) in entries.iter().rev() {
            if len <= self.max_entries && bytes <= self.max_bytes {
                break;
            }
            victims.push(key.clone());
            len -= 1;
            bytes = bytes.saturating_sub(entry_cost(thumb));
        }

        if victims.is_empty() {
            return;
        }
        for key in &victims {
            if let Some(old) = entries.pop(key) {
                self.bytes.fetch_sub(entry_cost(&old), Ordering::Relaxed);
            }
        }
        debug!(evicted = victims.len(), remaining = entries.len(), "thumbnail eviction batch");
    }

    /// Drop every entry rendered from `path`, regardless of size or
    /// options. Returns the number removed.
    ///
    /// The path is canonicalized when possible; a vanished file is matched
    /// as given, which works because keys store canonical paths.
    pub fn invalidate_path(&self, path: &Path) -> usize {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let mut entries = self.entries.lock().expect("thumb cache lock poisoned");

        let victims: Vec<ThumbKey> = entries
            .iter()
            .filter(|(key, _)| key.path == canonical)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &victims {
            if let Some(old) = entries.pop(key) {
                self.bytes.fetch_sub(entry_cost(&old), Ordering::Relaxed);
            }
        }
        if !victims.is_empty() {
            debug!(path = %canonical.display(), removed = victims.len(), "thumbnails invalidated");
        }
        victims.len()
    }

    /// Remove everything and reset the counters.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("thumb cache lock poisoned");
        entries.clear();
        self.bytes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Live entry count.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("thumb cache lock poisoned").len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes currently retained, overhead included.
    pub fn byte_total(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Point-in-time statistics snapshot.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            memory_estimate_bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::key::ThumbFormat;

    fn key(name: &str) -> ThumbKey {
        ThumbKey {
            path: PathBuf::from(format!("/img/{name}")),
            width: 64,
            height: 64,
            fingerprint: 1,
            mtime_unix: 1_000,
        }
    }

    fn thumb(bytes: usize) -> Arc<Thumbnail> {
        Arc::new(Thumbnail {
            data: vec![0; bytes],
            width: 8,
            height: 8,
            format: ThumbFormat::Rgba,
        })
    }

    #[test]
    fn get_refreshes_recency_before_eviction() {
        // Capacity 2: add A, add B, touch A, add C. B is the LRU victim.
        let cache = ThumbnailCache::new(2, u64::MAX);
        cache.insert(key("a"), thumb(10));
        cache.insert(key("b"), thumb(10));
        assert!(cache.get(&key("a")).is_some());
        cache.insert(key("c"), thumb(10));

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn entry_bound_evicts_first_inserted_without_reads() {
        let cache = ThumbnailCache::new(3, u64::MAX);
        for name in ["a", "b", "c", "d"] {
            cache.insert(key(name), thumb(10));
        }
        assert!(!cache.contains(&key("a")));
        assert!(cache.contains(&key("d")));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn byte_bound_holds_after_any_insert_sequence() {
        let max_bytes = 4 * (100 + ENTRY_OVERHEAD);
        let cache = ThumbnailCache::new(100, max_bytes);
        for i in 0..32 {
            cache.insert(key(&format!("k{i}")), thumb(100));
            assert!(cache.byte_total() <= max_bytes);
            assert!(cache.len() <= 100);
        }
        // Only as many entries as the byte budget allows survive.
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn one_insert_can_evict_a_batch() {
        let max_bytes = 10 * (10 + ENTRY_OVERHEAD);
        let cache = ThumbnailCache::new(100, max_bytes);
        for i in 0..10 {
            cache.insert(key(&format!("small{i}")), thumb(10));
        }
        assert_eq!(cache.len(), 10);

        // One large entry displaces several small ones at once.
        cache.insert(key("large"), thumb(9 * 10 + 8 * ENTRY_OVERHEAD as usize));
        assert!(cache.byte_total() <= max_bytes);
        assert!(cache.contains(&key("large")));
        assert!(cache.len() < 10);
    }

    #[test]
    fn oversized_entry_is_not_retained() {
        let cache = ThumbnailCache::new(4, 64);
        cache.insert(key("huge"), thumb(4096));
        assert!(cache.is_empty());
        assert_eq!(cache.byte_total(), 0);
    }

    #[test]
    fn replacing_a_key_does_not_double_count() {
        let cache = ThumbnailCache::new(4, u64::MAX);
        cache.insert(key("a"), thumb(100));
        let before = cache.byte_total();
        cache.insert(key("a"), thumb(100));
        assert_eq!(cache.byte_total(), before);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_path_removes_every_variant() {
        let cache = ThumbnailCache::new(16, u64::MAX);
        let mut small = key("img.png");
        small.width = 32;
        let mut large = key("img.png");
        large.width = 256;
        cache.insert(small, thumb(10));
        cache.insert(large, thumb(10));
        cache.insert(key("other.png"), thumb(10));

        let removed = cache.invalidate_path(Path::new("/img/img.png"));
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key("other.png")));
    }

    #[test]
    fn mtime_change_means_a_different_key() {
        let cache = ThumbnailCache::new(4, u64::MAX);
        let old = key("edited.png");
        cache.insert(old.clone(), thumb(10));

        let mut newer = old.clone();
        newer.mtime_unix += 60;
        // The stale entry is unreachable through the new key.
        assert!(cache.get(&newer).is_none());
        assert!(cache.get(&old).is_some());
    }

    #[test]
    fn statistics_track_hits_misses_and_bytes() {
        let cache = ThumbnailCache::new(4, u64::MAX);
        cache.insert(key("a"), thumb(50));
        cache.get(&key("a"));
        cache.get(&key("nope"));

        let stats = cache.statistics();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.memory_estimate_bytes, 50 + ENTRY_OVERHEAD);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);

        cache.clear();
        assert_eq!(cache.statistics().hits, 0);
        assert!(cache.is_empty());
    }
}
