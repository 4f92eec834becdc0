//! Scan result containers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanWarning;
use crate::pair::{FilePair, SpecialFolder};

/// The pairing outcome for one scanned tree.
///
/// This is the value the scan-result cache stores. It is immutable once
/// built and shared via [`Arc`], so a cached copy can never be corrupted by
/// a caller mutating its own result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanIndex {
    /// Matched pairs, in deterministic per-directory order.
    pub pairs: Vec<FilePair>,
    /// Archives with no preview counterpart.
    pub unpaired_archives: Vec<PathBuf>,
    /// Previews with no archive counterpart.
    pub unpaired_previews: Vec<PathBuf>,
    /// Directories elevated to gallery entries.
    pub special_folders: Vec<SpecialFolder>,
    /// Total number of files inspected (pre-filter).
    pub total_files: u64,
    /// Recoverable conditions encountered while scanning.
    pub warnings: Vec<ScanWarning>,
}

impl ScanIndex {
    /// Whether the scan produced no entries at all.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
            && self.unpaired_archives.is_empty()
            && self.unpaired_previews.is_empty()
            && self.special_folders.is_empty()
    }

    /// Number of pairs that carry a preview.
    pub fn previewed_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.has_preview()).count()
    }

    /// Estimated retained heap bytes. Used by cache accounting and the
    /// walker's memory guard; counts owned path and string buffers plus
    /// per-element overhead, not exact allocator bookkeeping.
    pub fn estimated_bytes(&self) -> u64 {
        fn path_bytes(p: &PathBuf) -> u64 {
            (std::mem::size_of::<PathBuf>() + p.as_os_str().len()) as u64
        }

        let mut total = std::mem::size_of::<Self>() as u64;
        for pair in &self.pairs {
            total += path_bytes(&pair.archive);
            total += pair.preview.as_ref().map(path_bytes).unwrap_or(0);
            total += pair.base_name.len() as u64 + 24;
        }
        for p in &self.unpaired_archives {
            total += path_bytes(p);
        }
        for p in &self.unpaired_previews {
            total += path_bytes(p);
        }
        for folder in &self.special_folders {
            total += path_bytes(&folder.path);
            total += folder.preview.as_ref().map(path_bytes).unwrap_or(0);
            total += folder.name.len() as u64 + 24;
        }
        for warning in &self.warnings {
            total += path_bytes(&warning.path);
            total += warning.message.len() as u64 + 24;
        }
        total
    }
}

/// Counters accumulated during one scan invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files inspected.
    pub files_seen: u64,
    /// Directories entered.
    pub dirs_seen: u64,
    /// Directories skipped by ignore rules, depth limit, or loop guard.
    pub dirs_skipped: u64,
    /// Warnings recorded.
    pub warnings: u64,
}

/// Outcome of one scan invocation, owned by the caller.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The pairing index. Shared immutably with the cache.
    pub index: Arc<ScanIndex>,
    /// Counters for this invocation. Zeroed on a cache hit, where no
    /// file system work happened.
    pub stats: ScanStats,
    /// Wall-clock duration of this invocation.
    pub scan_duration: Duration,
    /// When the result was produced.
    pub scanned_at: DateTime<Utc>,
    /// Whether the index came from the scan-result cache.
    pub cache_hit: bool,
}

impl ScanResult {
    /// Wrap a freshly computed index.
    pub fn fresh(index: ScanIndex, stats: ScanStats, scan_duration: Duration) -> Self {
        Self {
            index: Arc::new(index),
            stats,
            scan_duration,
            scanned_at: Utc::now(),
            cache_hit: false,
        }
    }

    /// Wrap a cache-served index.
    pub fn cached(index: Arc<ScanIndex>, scan_duration: Duration) -> Self {
        Self {
            index,
            stats: ScanStats::default(),
            scan_duration,
            scanned_at: Utc::now(),
            cache_hit: true,
        }
    }

    /// Matched pairs.
    pub fn pairs(&self) -> &[FilePair] {
        &self.index.pairs
    }

    /// Whether any subtree was skipped with a warning.
    pub fn has_warnings(&self) -> bool {
        !self.index.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index() {
        let index = ScanIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.previewed_pairs(), 0);
    }

    #[test]
    fn cached_result_flags_hit_and_zeroes_stats() {
        let index = Arc::new(ScanIndex::default());
        let result = ScanResult::cached(index, Duration::from_micros(5));
        assert!(result.cache_hit);
        assert_eq!(result.stats, ScanStats::default());
    }

    #[test]
    fn fresh_and_cached_share_the_index() {
        let mut index = ScanIndex::default();
        index.total_files = 3;
        let fresh = ScanResult::fresh(index, ScanStats::default(), Duration::ZERO);
        let cached = ScanResult::cached(Arc::clone(&fresh.index), Duration::ZERO);
        assert_eq!(fresh.index, cached.index);
        assert!(!fresh.cache_hit);
        assert!(cached.cache_hit);
    }

    #[test]
    fn byte_estimate_grows_with_content() {
        use crate::pair::FilePair;

        let empty = ScanIndex::default();
        let mut filled = ScanIndex::default();
        filled.pairs.push(FilePair::new(
            PathBuf::from("/library/props/crate.zip"),
            Some(PathBuf::from("/library/props/crate.jpg")),
        ));
        assert!(filled.estimated_bytes() > empty.estimated_bytes());
    }
}
