//! Depth-first directory walker.
//!
//! [`Walker`] is the long-lived entry point: it compiles the configuration
//! once (ignore rules, extension classifier) and can then run any number of
//! scans. Each scan gets its own [`ScanSession`], so nothing leaks between
//! invocations and concurrent scans of different roots share no mutable
//! state.
//!
//! Per-directory errors are recoverable: an unreadable or vanished subtree
//! is recorded as a warning and the walk continues with its siblings. Only
//! cancellation, memory exhaustion, and an invalid root abort the scan.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use pairshelf_cache::ScanResultCache;
use pairshelf_core::{
    IgnoreRules, PairStrategy, ScanError, ScanIndex, ScanRequest, ScanResult, ScanWarning,
    ShelfConfig, SpecialFolder, normalized_stem,
};

use crate::estimate::{self, WorkEstimate};
use crate::pairing::{self, Classifier, FileKind};
use crate::progress::{ProgressFn, ProgressReporter};
use crate::session::ScanSession;

/// Cancellation hook polled during a scan.
pub type CancelFn<'a> = dyn Fn() -> bool + Send + Sync + 'a;

/// Estimated memory is re-checked after this many files.
const MEM_CHECK_FILES: u64 = 512;
/// Read-buffer capacity retained between directories, halved under
/// memory pressure.
const SCRATCH_RETAIN_INITIAL: usize = 4096;
const SCRATCH_RETAIN_MIN: usize = 64;
/// Warnings recorded on the index before only the counter keeps moving.
const MAX_RECORDED_WARNINGS: usize = 512;

/// Caller-supplied observation hooks for one scan invocation.
#[derive(Clone, Copy, Default)]
pub struct ScanMonitor<'a> {
    /// Polled at a bounded cadence; return `true` to abort the scan with
    /// [`ScanError::Interrupted`].
    pub cancel: Option<&'a CancelFn<'a>>,
    /// Receives throttled `(percent, message)` updates.
    pub progress: Option<&'a ProgressFn<'a>>,
}

impl<'a> ScanMonitor<'a> {
    /// No hooks; the scan runs silently to completion.
    pub fn none() -> Self {
        Self::default()
    }

    /// Attach a cancellation hook.
    pub fn with_cancel(mut self, cancel: &'a CancelFn<'a>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Attach a progress hook.
    pub fn with_progress(mut self, progress: &'a ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Directory walker producing pairing indexes.
#[derive(Debug, Clone)]
pub struct Walker {
    config: ShelfConfig,
    rules: IgnoreRules,
    classifier: Classifier,
}

impl Walker {
    /// Compile a walker from the shelf configuration.
    pub fn new(config: ShelfConfig) -> Self {
        let rules = IgnoreRules::new(&config.ignored_names, &config.ignored_prefixes);
        let classifier = Classifier::new(&config);
        Self {
            config,
            rules,
            classifier,
        }
    }

    /// The configuration this walker was compiled from.
    pub fn config(&self) -> &ShelfConfig {
        &self.config
    }

    /// Scan a directory tree.
    ///
    /// Unless the request forces a refresh, an unexpired cache entry for
    /// the root is returned immediately without touching the file system.
    /// A fresh result is written back to the cache (again skipped under
    /// `force_refresh`) before being returned with `cache_hit = false`.
    pub fn scan(
        &self,
        request: &ScanRequest,
        cache: &ScanResultCache,
        monitor: ScanMonitor<'_>,
    ) -> Result<ScanResult, ScanError> {
        let started = Instant::now();
        let root = self.validate_root(&request.root)?;

        if !request.force_refresh {
            if let Some(index) = cache.get(&root) {
                debug!(root = %root.display(), "scan served from cache");
                ProgressReporter::new(monitor.progress).finish("Loaded from cache");
                return Ok(ScanResult::cached(index, started.elapsed()));
            }
        }

        let estimate = estimate::sample(&root, &self.rules);
        if let Some(est) = &estimate {
            debug!(files = est.files, folders = est.folders, "work estimate");
        }

        let mut walk = Walk {
            rules: &self.rules,
            classifier: &self.classifier,
            special_marker: &self.config.special_marker,
            strategy: request.strategy,
            max_depth: request.max_depth,
            cancel: monitor.cancel,
            session: ScanSession::new(self.config.visited_capacity),
            index: ScanIndex::default(),
            reporter: ProgressReporter::new(monitor.progress),
            estimate,
            guard: MemoryGuard::new(self.config.memory_soft_limit, self.config.memory_hard_limit),
            scratch: Vec::new(),
        };

        if let Err(err) = walk.run(&root) {
            if err.is_interrupted() {
                debug!(root = %root.display(), "scan cancelled by caller");
            }
            return Err(err);
        }

        let Walk {
            session,
            mut index,
            mut reporter,
            ..
        } = walk;
        let stats = session.stats();
        index.total_files = stats.files_seen;
        reporter.finish("Scan complete");

        let result = ScanResult::fresh(index, stats, started.elapsed());
        if !request.force_refresh {
            cache.put(&root, Arc::clone(&result.index));
        }
        info!(
            root = %root.display(),
            pairs = result.index.pairs.len(),
            files = stats.files_seen,
            dirs = stats.dirs_seen,
            warnings = stats.warnings,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );
        Ok(result)
    }

    /// Check the root before any session state exists.
    fn validate_root(&self, root: &Path) -> Result<PathBuf, ScanError> {
        if root.as_os_str().is_empty() {
            return Err(ScanError::invalid("scan root must not be empty"));
        }
        let canonical = root
            .canonicalize()
            .map_err(|err| ScanError::io(root, err))?;
        let meta = fs::metadata(&canonical).map_err(|err| ScanError::io(&canonical, err))?;
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory { path: canonical });
        }
        // Listing probe so an unreadable root fails the scan instead of
        // producing an empty result with one warning.
        fs::read_dir(&canonical).map_err(|err| ScanError::io(&canonical, err))?;
        Ok(canonical)
    }
}

/// Mutable state for one scan, dropped wholesale on any outcome.
struct Walk<'a> {
    rules: &'a IgnoreRules,
    classifier: &'a Classifier,
    special_marker: &'a str,
    strategy: PairStrategy,
    max_depth: Option<u32>,
    cancel: Option<&'a CancelFn<'a>>,
    session: ScanSession,
    index: ScanIndex,
    reporter: ProgressReporter<'a>,
    estimate: Option<WorkEstimate>,
    guard: MemoryGuard,
    scratch: Vec<(PathBuf, FileKind)>,
}

impl Walk<'_> {
    fn run(&mut self, root: &Path) -> Result<(), ScanError> {
        self.check_cancel()?;
        self.session.mark_visited(root.to_path_buf());
        self.walk_dir(root, 0)
    }

    /// Process one directory, then recurse into its subdirectories.
    /// `dir` is canonical and already in the visited set.
    fn walk_dir(&mut self, dir: &Path, depth: u32) -> Result<(), ScanError> {
        if self.session.note_dir() {
            self.check_cancel()?;
        }

        let listing = match fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(err) => {
                self.push_warning(ScanWarning::from_io(dir, &err));
                return Ok(());
            }
        };

        let mut subdirs: Vec<PathBuf> = Vec::new();
        let mut marker_seen = false;

        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.push_warning(ScanWarning::from_io(dir, &err));
                    continue;
                }
            };
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if self.rules.is_ignored(&name_str) {
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    self.session.note_skipped_dir();
                }
                continue;
            }

            let kind = match entry.file_type() {
                Ok(kind) => kind,
                Err(err) => {
                    self.push_warning(ScanWarning::from_io(entry.path(), &err));
                    continue;
                }
            };
            // Symlinks are followed; the visited set catches cycles later.
            let is_dir = if kind.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) => meta.is_dir(),
                    Err(err) => {
                        self.push_warning(ScanWarning::from_io(entry.path(), &err));
                        continue;
                    }
                }
            } else {
                kind.is_dir()
            };

            if is_dir {
                subdirs.push(entry.path());
                continue;
            }

            if self.session.note_file() {
                self.check_cancel()?;
            }
            if name_str == self.special_marker {
                marker_seen = true;
            }
            if let Some(file_kind) = self.classifier.classify(Path::new(&name)) {
                self.scratch.push((entry.path(), file_kind));
            }
            self.guard.on_file(&mut self.index, &mut self.scratch)?;
        }

        self.report_progress(dir);

        if marker_seen {
            let preview = self.special_preview(dir);
            self.index
                .special_folders
                .push(SpecialFolder::new(dir.to_path_buf(), preview));
        }

        let groups = pairing::group_by_stem(self.scratch.drain(..));
        let mut outcome = pairing::pair(groups, self.strategy, self.classifier);
        self.index.pairs.append(&mut outcome.pairs);
        self.index
            .unpaired_archives
            .append(&mut outcome.unpaired_archives);
        self.index
            .unpaired_previews
            .append(&mut outcome.unpaired_previews);
        self.guard.trim_scratch(&mut self.scratch);

        subdirs.sort();
        for subdir in subdirs {
            if let Some(limit) = self.max_depth {
                if depth >= limit {
                    self.session.note_skipped_dir();
                    continue;
                }
            }
            // Canonicalize before descent so the loop guard sees the real
            // path a symlink resolves to.
            let canonical = match subdir.canonicalize() {
                Ok(canonical) => canonical,
                Err(err) => {
                    self.push_warning(ScanWarning::from_io(&subdir, &err));
                    continue;
                }
            };
            if !self.session.mark_visited(canonical.clone()) {
                self.session.note_skipped_dir();
                self.push_warning(ScanWarning::loop_detected(&subdir));
                continue;
            }
            self.walk_dir(&canonical, depth + 1)?;
        }
        Ok(())
    }

    fn check_cancel(&self) -> Result<(), ScanError> {
        match self.cancel {
            Some(cancel) if cancel() => Err(ScanError::Interrupted),
            _ => Ok(()),
        }
    }

    fn push_warning(&mut self, warning: ScanWarning) {
        warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        self.session.note_warning();
        if self.index.warnings.len() < MAX_RECORDED_WARNINGS {
            self.index.warnings.push(warning);
        }
    }

    fn report_progress(&mut self, dir: &Path) {
        let percent = match self.estimate {
            Some(est) => est.progress(self.session.files_seen(), self.session.dirs_seen()),
            None => estimate::fallback_progress(self.session.dirs_seen()),
        };
        self.reporter
            .report(percent, &format!("Scanning {}", dir.display()));
    }

    /// Gallery preview for a special folder: first image whose stem equals
    /// the directory name, else one named `folder`.
    fn special_preview(&self, dir: &Path) -> Option<PathBuf> {
        let dir_stem = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let previews = || {
            self.scratch
                .iter()
                .filter(|(_, kind)| *kind == FileKind::Preview)
                .map(|(path, _)| path)
        };

        previews()
            .filter(|p| normalized_stem(p).as_str() == dir_stem)
            .min()
            .or_else(|| previews().filter(|p| normalized_stem(p).as_str() == "folder").min())
            .cloned()
    }
}

/// Periodic check of estimated retained memory.
///
/// The accumulating index is the scan's dominant allocation, so its content
/// estimate stands in for process-level accounting. Soft limit: release
/// spare buffer capacity and halve the retained read-buffer budget. Hard
/// limit: abort with [`ScanError::ResourceExhausted`].
struct MemoryGuard {
    soft_limit: u64,
    hard_limit: u64,
    scratch_retain: usize,
    files_since_check: u64,
}

impl MemoryGuard {
    fn new(soft_limit: u64, hard_limit: u64) -> Self {
        Self {
            soft_limit,
            hard_limit,
            scratch_retain: SCRATCH_RETAIN_INITIAL,
            files_since_check: 0,
        }
    }

    fn on_file(
        &mut self,
        index: &mut ScanIndex,
        scratch: &mut Vec<(PathBuf, FileKind)>,
    ) -> Result<(), ScanError> {
        self.files_since_check += 1;
        if self.files_since_check < MEM_CHECK_FILES {
            return Ok(());
        }
        self.files_since_check = 0;

        let estimated = index.estimated_bytes();
        if estimated <= self.soft_limit {
            return Ok(());
        }

        self.scratch_retain = (self.scratch_retain / 2).max(SCRATCH_RETAIN_MIN);
        scratch.shrink_to(self.scratch_retain);
        index.pairs.shrink_to_fit();
        index.unpaired_archives.shrink_to_fit();
        index.unpaired_previews.shrink_to_fit();
        warn!(
            estimated,
            soft_limit = self.soft_limit,
            "estimated scan memory over soft limit, reclaiming buffers"
        );

        if estimated > self.hard_limit {
            return Err(ScanError::ResourceExhausted {
                estimated,
                limit: self.hard_limit,
            });
        }
        Ok(())
    }

    /// Clamp the reusable read buffer after a directory is processed.
    fn trim_scratch(&self, scratch: &mut Vec<(PathBuf, FileKind)>) {
        if scratch.capacity() > self.scratch_retain {
            scratch.shrink_to(self.scratch_retain);
        }
    }
}
