//! Work estimation for scan progress.
//!
//! A full recursive pre-walk would cost as much as the scan itself, so the
//! estimate comes from one shallow listing of the root plus a small sample
//! of its subdirectories, extrapolating per-folder file density across the
//! rest.

use std::fs;
use std::path::Path;

use pairshelf_core::IgnoreRules;

/// Number of subdirectories sampled when measuring file density.
const SAMPLE_DIRS: usize = 5;

/// Estimated total work for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkEstimate {
    /// Estimated total file count.
    pub files: u64,
    /// Estimated total directory count, root included.
    pub folders: u64,
}

impl WorkEstimate {
    /// Convert running counters into a percentage in `0..=95`.
    ///
    /// Weighted 80% by files and 20% by folders. Capped at 95: the walker
    /// reports 100 only on confirmed completion, never from an estimate.
    pub fn progress(&self, files_seen: u64, dirs_seen: u64) -> u8 {
        if self.files == 0 && self.folders == 0 {
            return fallback_progress(dirs_seen);
        }
        let pct = (ratio(files_seen, self.files) * 0.8 + ratio(dirs_seen, self.folders) * 0.2)
            * 100.0;
        (pct as u8).min(95)
    }
}

fn ratio(seen: u64, estimated: u64) -> f64 {
    if estimated == 0 {
        0.0
    } else {
        (seen as f64 / estimated as f64).min(1.0)
    }
}

/// Folder-count heuristic used when no usable estimate exists.
pub fn fallback_progress(dirs_seen: u64) -> u8 {
    dirs_seen.saturating_mul(2).min(95) as u8
}

/// Estimate total work from a shallow sample of `root`.
///
/// Lists the root once to count its immediate files and subdirectories,
/// then lists up to [`SAMPLE_DIRS`] subdirectories (sorted, so the sample
/// is stable) and extrapolates their mean file count across all
/// subdirectories. Returns `None` when the root cannot be listed; the
/// caller falls back to [`fallback_progress`].
pub fn sample(root: &Path, rules: &IgnoreRules) -> Option<WorkEstimate> {
    let mut root_files = 0u64;
    let mut subdirs = Vec::new();

    for entry in fs::read_dir(root).ok()? {
        let Ok(entry) = entry else { continue };
        if rules.is_ignored(&entry.file_name().to_string_lossy()) {
            continue;
        }
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => subdirs.push(entry.path()),
            Ok(kind) if kind.is_file() => root_files += 1,
            _ => {}
        }
    }
    subdirs.sort();

    let mut sampled_files = 0u64;
    let mut sampled_dirs = 0u64;
    for dir in subdirs.iter().take(SAMPLE_DIRS) {
        let Ok(listing) = fs::read_dir(dir) else {
            continue;
        };
        sampled_dirs += 1;
        sampled_files += listing
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count() as u64;
    }

    let density = if sampled_dirs > 0 {
        sampled_files as f64 / sampled_dirs as f64
    } else {
        0.0
    };
    Some(WorkEstimate {
        files: root_files + (density * subdirs.len() as f64).round() as u64,
        folders: 1 + subdirs.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn progress_is_weighted_and_capped() {
        let est = WorkEstimate {
            files: 100,
            folders: 10,
        };
        assert_eq!(est.progress(0, 0), 0);
        assert_eq!(est.progress(50, 5), 50);
        // Overshooting the estimate saturates at the cap, never 100.
        assert_eq!(est.progress(500, 50), 95);
    }

    #[test]
    fn zero_estimate_falls_back_to_folder_heuristic() {
        let est = WorkEstimate {
            files: 0,
            folders: 0,
        };
        assert_eq!(est.progress(1_000, 10), 20);
        assert_eq!(fallback_progress(0), 0);
        assert_eq!(fallback_progress(47), 94);
        assert_eq!(fallback_progress(48), 95);
        assert_eq!(fallback_progress(10_000), 95);
    }

    #[test]
    fn sample_extrapolates_subdir_density() {
        let tmp = TempDir::new().unwrap();
        File::create(tmp.path().join("a.zip")).unwrap();
        File::create(tmp.path().join("b.zip")).unwrap();
        for d in ["one", "two", "three"] {
            let dir = tmp.path().join(d);
            std::fs::create_dir(&dir).unwrap();
            for f in ["w.zip", "x.zip", "y.jpg", "z.jpg"] {
                File::create(dir.join(f)).unwrap();
            }
        }

        let est = sample(tmp.path(), &IgnoreRules::default()).unwrap();
        // 2 root files + density 4 across 3 subdirs.
        assert_eq!(est.files, 14);
        assert_eq!(est.folders, 4);
    }

    #[test]
    fn ignored_subdirs_are_not_counted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("keep")).unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();

        let rules = IgnoreRules::new([".git"], Vec::<&str>::new());
        let est = sample(tmp.path(), &rules).unwrap();
        assert_eq!(est.folders, 2);
    }

    #[test]
    fn missing_root_yields_none() {
        assert!(sample(Path::new("/definitely/not/here"), &IgnoreRules::default()).is_none());
    }
}
