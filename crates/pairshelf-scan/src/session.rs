//! Per-invocation scan state.
//!
//! One [`ScanSession`] lives for exactly one top-level scan. It owns the
//! visited-directory set (the loop guard), the counters, and the
//! cancellation poll cadence. Nothing here is shared across scans, so
//! concurrent scans of different roots cannot race on it; everything is
//! released when the session drops, on success and error paths alike.

use std::path::PathBuf;
use std::time::Instant;

use indexmap::IndexSet;

use pairshelf_core::ScanStats;

/// Cancellation is polled after this many files...
const POLL_FILES: u32 = 64;
/// ...or this many directories, whichever comes first.
const POLL_DIRS: u32 = 8;

/// Mutable state for one scan invocation.
#[derive(Debug)]
pub struct ScanSession {
    /// Canonicalized directories already entered. Insertion-ordered so the
    /// oldest half can be trimmed in one batch when the cap is reached.
    visited: IndexSet<PathBuf>,
    visited_capacity: usize,
    files_seen: u64,
    dirs_seen: u64,
    dirs_skipped: u64,
    warnings: u64,
    files_since_poll: u32,
    dirs_since_poll: u32,
    started: Instant,
}

impl ScanSession {
    /// Start a session with the given visited-set capacity (clamped to at
    /// least two so trimming always leaves the most recent entries).
    pub fn new(visited_capacity: usize) -> Self {
        Self {
            visited: IndexSet::new(),
            visited_capacity: visited_capacity.max(2),
            files_seen: 0,
            dirs_seen: 0,
            dirs_skipped: 0,
            warnings: 0,
            files_since_poll: 0,
            dirs_since_poll: 0,
            started: Instant::now(),
        }
    }

    /// Record a directory about to be entered. Returns `false` if it was
    /// already visited in this session, which means a cycle (or a second
    /// route to the same directory) and the subtree must be skipped.
    pub fn mark_visited(&mut self, canonical: PathBuf) -> bool {
        if self.visited.len() >= self.visited_capacity {
            // Batch-trim the oldest half. One O(n) splice per cap/2
            // insertions keeps the amortized cost constant; recently
            // visited directories (the live recursion path) survive.
            self.visited = self.visited.split_off(self.visited.len() / 2);
        }
        self.visited.insert(canonical)
    }

    /// Count a file. Returns `true` when the cancellation check is due.
    pub fn note_file(&mut self) -> bool {
        self.files_seen += 1;
        self.files_since_poll += 1;
        if self.files_since_poll >= POLL_FILES {
            self.files_since_poll = 0;
            return true;
        }
        false
    }

    /// Count an entered directory. Returns `true` when the cancellation
    /// check is due.
    pub fn note_dir(&mut self) -> bool {
        self.dirs_seen += 1;
        self.dirs_since_poll += 1;
        if self.dirs_since_poll >= POLL_DIRS {
            self.dirs_since_poll = 0;
            return true;
        }
        false
    }

    /// Count a skipped directory (ignore rule, depth limit, or loop guard).
    pub fn note_skipped_dir(&mut self) {
        self.dirs_skipped += 1;
    }

    /// Count a recorded warning.
    pub fn note_warning(&mut self) {
        self.warnings += 1;
    }

    /// Files counted so far.
    pub fn files_seen(&self) -> u64 {
        self.files_seen
    }

    /// Directories entered so far.
    pub fn dirs_seen(&self) -> u64 {
        self.dirs_seen
    }

    /// Directories currently tracked by the loop guard.
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Session start time.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Counters snapshot for the result.
    pub fn stats(&self) -> ScanStats {
        ScanStats {
            files_seen: self.files_seen,
            dirs_seen: self.dirs_seen,
            dirs_skipped: self.dirs_skipped,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisit_is_detected() {
        let mut session = ScanSession::new(16);
        assert!(session.mark_visited(PathBuf::from("/a")));
        assert!(session.mark_visited(PathBuf::from("/a/b")));
        assert!(!session.mark_visited(PathBuf::from("/a")));
    }

    #[test]
    fn visited_set_trims_oldest_half() {
        let mut session = ScanSession::new(4);
        for i in 0..4 {
            assert!(session.mark_visited(PathBuf::from(format!("/d{i}"))));
        }
        // Cap reached: the next insert trims /d0 and /d1 first.
        assert!(session.mark_visited(PathBuf::from("/d4")));
        assert!(session.visited_len() <= 4);
        assert!(session.mark_visited(PathBuf::from("/d0")), "trimmed entry forgotten");
        assert!(!session.mark_visited(PathBuf::from("/d4")), "recent entry kept");
    }

    #[test]
    fn poll_cadence() {
        let mut session = ScanSession::new(16);
        let mut due = 0;
        for _ in 0..POLL_FILES * 3 {
            if session.note_file() {
                due += 1;
            }
        }
        assert_eq!(due, 3);

        let mut due = 0;
        for _ in 0..POLL_DIRS * 2 {
            if session.note_dir() {
                due += 1;
            }
        }
        assert_eq!(due, 2);
    }

    #[test]
    fn stats_snapshot() {
        let mut session = ScanSession::new(16);
        session.note_file();
        session.note_dir();
        session.note_skipped_dir();
        session.note_warning();

        let stats = session.stats();
        assert_eq!(stats.files_seen, 1);
        assert_eq!(stats.dirs_seen, 1);
        assert_eq!(stats.dirs_skipped, 1);
        assert_eq!(stats.warnings, 1);
    }
}
