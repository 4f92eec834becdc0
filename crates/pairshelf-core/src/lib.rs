//! Core types for pairshelf.
//!
//! This crate provides the vocabulary shared across the pairshelf
//! workspace: file pairs, scan results and warnings, configuration, and the
//! ignore-rule predicate. It performs no I/O itself.

mod config;
mod error;
mod ignore;
mod pair;
mod result;
mod stats;

pub use config::{PairStrategy, ScanRequest, ShelfConfig, ShelfConfigBuilder};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use ignore::IgnoreRules;
pub use pair::{FilePair, SpecialFolder, normalized_extension, normalized_stem};
pub use result::{ScanIndex, ScanResult, ScanStats};
pub use stats::CacheStatistics;
