//! Scan-result caching for pairshelf.
//!
//! A single cache type maps normalized directory paths to the immutable
//! scan index computed for them, with TTL expiry and an LRU entry bound.
//! The walker consults it before touching the file system; hosts reach it
//! through the registry's cache-management surface.
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use pairshelf_cache::ScanResultCache;
//! use pairshelf_core::ScanIndex;
//!
//! let cache = ScanResultCache::new(64, Duration::from_secs(300));
//! cache.put(Path::new("/library"), Arc::new(ScanIndex::default()));
//! assert!(cache.get(Path::new("/library")).is_some());
//! ```

mod results;

pub use results::ScanResultCache;
