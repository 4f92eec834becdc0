//! The composition root owning scanner, caches, and loader.

use std::path::Path;

use tracing::info;

use pairshelf_cache::ScanResultCache;
use pairshelf_core::{CacheStatistics, ScanError, ScanRequest, ScanResult};
use pairshelf_scan::{ScanMonitor, Walker};
use pairshelf_thumbs::{ThumbnailLoader, ThumbnailResponse};

use crate::config::GalleryConfig;

/// Single owner of the scan cache, the thumbnail cache, and the loader.
///
/// Hosts construct one registry, keep it for the lifetime of the gallery,
/// and share it behind their own `Arc` when multiple components need it.
/// There is no global instance; dropping the registry releases every cache
/// and stops the worker pool.
pub struct ShelfRegistry {
    walker: Walker,
    scan_cache: ScanResultCache,
    loader: ThumbnailLoader,
}

impl ShelfRegistry {
    /// Build the full stack from one configuration.
    ///
    /// Spawns the thumbnail workers, so it must be called inside a tokio
    /// runtime.
    pub fn new(config: GalleryConfig) -> Self {
        let scan_cache = ScanResultCache::new(
            config.shelf.scan_cache_entries,
            config.shelf.scan_cache_ttl,
        );
        let loader = ThumbnailLoader::new(config.thumbs);
        let walker = Walker::new(config.shelf);
        info!(
            workers = loader.config().workers,
            scan_cache_entries = walker.config().scan_cache_entries,
            "gallery registry ready"
        );
        Self {
            walker,
            scan_cache,
            loader,
        }
    }

    /// Scan a directory tree, consulting the scan cache first.
    ///
    /// Blocks until the scan completes; hosts with an event loop run it
    /// via `spawn_blocking`. Cancellation and progress reporting are wired
    /// through the monitor.
    pub fn scan(
        &self,
        request: &ScanRequest,
        monitor: ScanMonitor<'_>,
    ) -> Result<ScanResult, ScanError> {
        self.walker.scan(request, &self.scan_cache, monitor)
    }

    /// Drop the cached scan result for one directory.
    pub fn invalidate_directory(&self, dir: &Path) {
        self.scan_cache.invalidate(dir);
    }

    /// Drop every cached scan result.
    pub fn clear_scan_cache(&self) {
        self.scan_cache.clear();
    }

    /// Scan-cache statistics snapshot.
    pub fn scan_cache_statistics(&self) -> CacheStatistics {
        self.scan_cache.statistics()
    }

    /// Request a thumbnail; cached entries come back ready, everything
    /// else resolves through the returned pending handle.
    pub fn request_thumbnail(&self, path: &Path, width: u32, height: u32) -> ThumbnailResponse {
        self.loader.request(path, width, height)
    }

    /// Drop every cached thumbnail rendered from one source file.
    /// Returns the number removed.
    pub fn invalidate_thumbnails_for_path(&self, path: &Path) -> usize {
        self.loader.cache().invalidate_path(path)
    }

    /// Drop every cached thumbnail.
    pub fn clear_thumbnail_cache(&self) {
        self.loader.cache().clear();
    }

    /// Thumbnail-cache statistics snapshot.
    pub fn thumbnail_cache_statistics(&self) -> CacheStatistics {
        self.loader.cache().statistics()
    }

    /// Stop the thumbnail workers after draining queued renders.
    pub async fn shutdown(self) {
        let Self { loader, .. } = self;
        loader.shutdown().await;
    }
}
