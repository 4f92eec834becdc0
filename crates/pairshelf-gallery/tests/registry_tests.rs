//! Integration tests for the registry surface.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pairshelf_core::ScanRequest;
use pairshelf_gallery::{GalleryConfig, ShelfRegistry, ThumbnailResponse};
use pairshelf_scan::ScanMonitor;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"x").unwrap();
}

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbaImage::from_pixel(60, 60, image::Rgba([120, 40, 200, 255]));
    img.save(&path).unwrap();
    path
}

#[tokio::test]
async fn test_scan_through_registry_pairs_and_caches() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "foo.zip");
    touch(dir.path(), "foo.jpg");
    touch(dir.path(), "bar.zip");

    let registry = ShelfRegistry::new(GalleryConfig::default());
    let request = ScanRequest::new(dir.path());

    let first = registry.scan(&request, ScanMonitor::none()).unwrap();
    assert!(!first.cache_hit);
    assert_eq!(first.index.pairs.len(), 1);
    assert_eq!(first.index.unpaired_archives.len(), 1);

    let second = registry.scan(&request, ScanMonitor::none()).unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.index, first.index);

    let stats = registry.scan_cache_statistics();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_invalidate_directory_forces_a_fresh_scan() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "foo.zip");

    let registry = ShelfRegistry::new(GalleryConfig::default());
    let request = ScanRequest::new(dir.path());

    registry.scan(&request, ScanMonitor::none()).unwrap();
    registry.invalidate_directory(dir.path());

    // The tree changed while no entry was cached.
    touch(dir.path(), "foo.png");
    let rescan = registry.scan(&request, ScanMonitor::none()).unwrap();
    assert!(!rescan.cache_hit);
    assert_eq!(rescan.index.pairs.len(), 1);
    assert!(rescan.index.unpaired_archives.is_empty());

    registry.shutdown().await;
}

#[tokio::test]
async fn test_clear_scan_cache_drops_every_entry() {
    let left = TempDir::new().unwrap();
    let right = TempDir::new().unwrap();
    touch(left.path(), "a.zip");
    touch(right.path(), "b.zip");

    let registry = ShelfRegistry::new(GalleryConfig::default());
    registry
        .scan(&ScanRequest::new(left.path()), ScanMonitor::none())
        .unwrap();
    registry
        .scan(&ScanRequest::new(right.path()), ScanMonitor::none())
        .unwrap();
    assert_eq!(registry.scan_cache_statistics().entries, 2);

    registry.clear_scan_cache();
    assert_eq!(registry.scan_cache_statistics().entries, 0);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_thumbnail_round_trip_and_invalidation() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "cover.png");

    let registry = ShelfRegistry::new(GalleryConfig::default());

    let ThumbnailResponse::Pending(pending) = registry.request_thumbnail(&path, 24, 24) else {
        panic!("first request cannot be cached");
    };
    let thumb = pending.wait().await.unwrap();
    assert_eq!((thumb.width, thumb.height), (24, 24));

    assert!(matches!(
        registry.request_thumbnail(&path, 24, 24),
        ThumbnailResponse::Ready(_)
    ));
    assert_eq!(registry.thumbnail_cache_statistics().entries, 1);

    assert_eq!(registry.invalidate_thumbnails_for_path(&path), 1);
    assert!(matches!(
        registry.request_thumbnail(&path, 24, 24),
        ThumbnailResponse::Pending(_)
    ));

    registry.shutdown().await;
}

#[tokio::test]
async fn test_configuration_flows_from_a_serialized_document() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "kit.cbz");
    touch(dir.path(), "kit.jpg");

    // Hosts hand in settings from their own store; `cbz` is accepted as
    // an archive only because this document says so.
    let config: GalleryConfig = serde_json::from_str(
        r#"{
            "shelf": {"archive_extensions": ["cbz"]},
            "thumbs": {"max_entries": 8, "workers": 1}
        }"#,
    )
    .unwrap();

    let registry = ShelfRegistry::new(config);
    let result = registry
        .scan(&ScanRequest::new(dir.path()), ScanMonitor::none())
        .unwrap();
    assert_eq!(result.index.pairs.len(), 1);

    registry.shutdown().await;
}
