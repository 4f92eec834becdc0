//! Gallery composition root for pairshelf.
//!
//! This crate ties the scanner, the scan-result cache, and the thumbnail
//! pipeline into one [`ShelfRegistry`] that hosts construct and own
//! directly. The registry is the whole external surface: scans, cache
//! management, and thumbnail requests all go through it.
//!
//! ## Example
//!
//! ```no_run
//! use pairshelf_gallery::{GalleryConfig, ShelfRegistry};
//! use pairshelf_core::ScanRequest;
//! use pairshelf_scan::ScanMonitor;
//!
//! # async fn demo() -> Result<(), pairshelf_core::ScanError> {
//! let registry = ShelfRegistry::new(GalleryConfig::default());
//! let result = registry.scan(&ScanRequest::new("/library"), ScanMonitor::none())?;
//! println!("{} pairs", result.index.pairs.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod registry;

pub use config::GalleryConfig;
pub use registry::ShelfRegistry;

// Re-export core types for convenience
pub use pairshelf_core::{
    CacheStatistics, ScanError, ScanRequest, ScanResult, ShelfConfig,
};
pub use pairshelf_scan::ScanMonitor;
pub use pairshelf_thumbs::{ThumbConfig, ThumbError, ThumbnailResponse};
