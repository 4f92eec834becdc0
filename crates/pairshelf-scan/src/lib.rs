//! Directory scanning and pairing engine for pairshelf.
//!
//! This crate owns the scan path: one [`Walker`] is compiled from a
//! [`ShelfConfig`] and can then run any number of scans, each with its own
//! session state.
//!
//! # Overview
//!
//! `pairshelf-scan` walks a tree depth-first and builds the paired index.
//! Key properties:
//!
//! - **Deterministic pairing** from sorted, stem-grouped listings
//! - **Loop safe** via canonicalized paths in a bounded visited set
//! - **Cooperative cancellation** polled at a bounded cadence
//! - **Cache aware** so unchanged trees cost one lookup, not a walk
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use pairshelf_cache::ScanResultCache;
//! use pairshelf_scan::{ScanMonitor, ScanRequest, ShelfConfig, Walker};
//!
//! let walker = Walker::new(ShelfConfig::default());
//! let cache = ScanResultCache::new(64, Duration::from_secs(300));
//!
//! let progress = |pct: u8, msg: &str| eprintln!("[{pct:3}%] {msg}");
//! let monitor = ScanMonitor::none().with_progress(&progress);
//!
//! let result = walker
//!     .scan(&ScanRequest::new("/assets"), &cache, monitor)
//!     .unwrap();
//! println!("{} pairs in {:?}", result.pairs().len(), result.scan_duration);
//! ```

pub mod pairing;

mod estimate;
mod progress;
mod session;
mod walker;

pub use estimate::WorkEstimate;
pub use progress::{ProgressFn, ProgressReporter};
pub use session::ScanSession;
pub use walker::{CancelFn, ScanMonitor, Walker};

// Re-export core types for convenience
pub use pairshelf_core::{
    FilePair, PairStrategy, ScanError, ScanIndex, ScanRequest, ScanResult, ScanStats, ScanWarning,
    ShelfConfig, SpecialFolder, WarningKind,
};
