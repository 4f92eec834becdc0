//! Integration tests for the thumbnail loader and cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use pairshelf_thumbs::{
    CropMode, RenderOptions, ResizeFilter, ThumbConfig, ThumbError, ThumbFormat, ThumbnailLoader,
    ThumbnailResponse,
};

fn write_png(dir: &Path, name: &str, side: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbaImage::from_fn(side, side, |x, y| {
        image::Rgba([(x % 251) as u8, (y % 241) as u8, 64, 255])
    });
    img.save(&path).unwrap();
    path
}

fn quick_config() -> ThumbConfig {
    ThumbConfig::builder()
        .workers(2usize)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

async fn render(loader: &ThumbnailLoader, path: &Path, side: u32) -> Arc<pairshelf_thumbs::Thumbnail> {
    match loader.request(path, side, side) {
        ThumbnailResponse::Ready(thumb) => thumb,
        ThumbnailResponse::Pending(pending) => pending.wait().await.unwrap(),
    }
}

#[tokio::test]
async fn test_second_request_is_served_ready_from_cache() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "cover.png", 80);
    let loader = ThumbnailLoader::new(quick_config());

    let ThumbnailResponse::Pending(pending) = loader.request(&path, 32, 32) else {
        panic!("first request cannot be cached");
    };
    let first = pending.wait().await.unwrap();
    assert_eq!((first.width, first.height), (32, 32));

    let ThumbnailResponse::Ready(second) = loader.request(&path, 32, 32) else {
        panic!("second request must hit the cache");
    };
    assert!(Arc::ptr_eq(&first, &second));

    let stats = loader.cache().statistics();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);

    loader.shutdown().await;
}

#[tokio::test]
async fn test_rapid_duplicate_requests_share_one_render() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "cover.png", 80);
    let loader = ThumbnailLoader::new(quick_config());

    // Both requests land before any worker runs, so the second must
    // attach to the first render rather than queue its own.
    let ThumbnailResponse::Pending(a) = loader.request(&path, 64, 64) else {
        panic!("nothing cached yet");
    };
    let ThumbnailResponse::Pending(b) = loader.request(&path, 64, 64) else {
        panic!("duplicate must coalesce, not hit the cache");
    };

    let (a, b) = tokio::join!(a.wait(), b.wait());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loader.cache().len(), 1);

    loader.shutdown().await;
}

#[tokio::test]
async fn test_undecodable_file_fails_without_caching() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"not an image at all").unwrap();
    let loader = ThumbnailLoader::new(quick_config());

    let ThumbnailResponse::Pending(pending) = loader.request(&path, 32, 32) else {
        panic!("broken file cannot be cached");
    };
    let err = pending.wait().await.unwrap_err();
    assert!(matches!(err, ThumbError::Decode { .. }));
    assert!(loader.cache().is_empty());

    // The failure was not cached, so the next request decodes again.
    assert!(matches!(
        loader.request(&path, 32, 32),
        ThumbnailResponse::Pending(_)
    ));

    loader.shutdown().await;
}

#[tokio::test]
async fn test_each_box_size_is_cached_separately() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "cover.png", 80);
    let loader = ThumbnailLoader::new(quick_config());

    for side in [32u32, 64, 96] {
        let thumb = render(&loader, &path, side).await;
        assert_eq!((thumb.width, thumb.height), (side, side));
    }
    assert_eq!(loader.cache().len(), 3);

    loader.shutdown().await;
}

#[tokio::test]
async fn test_invalidate_path_forces_a_rerender() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "cover.png", 80);
    let loader = ThumbnailLoader::new(quick_config());

    render(&loader, &path, 48).await;
    assert_eq!(loader.cache().invalidate_path(&path), 1);

    assert!(matches!(
        loader.request(&path, 48, 48),
        ThumbnailResponse::Pending(_)
    ));

    loader.shutdown().await;
}

#[tokio::test]
async fn test_modified_file_is_rerendered_not_served_stale() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "edited.png", 80);
    let loader = ThumbnailLoader::new(quick_config());

    let before = render(&loader, &path, 40).await;

    // Replace the content and move the mtime forward past second
    // granularity.
    write_png(dir.path(), "edited.png", 200);
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(5))
        .unwrap();

    let ThumbnailResponse::Pending(pending) = loader.request(&path, 40, 40) else {
        panic!("stale entry must not be served");
    };
    let after = pending.wait().await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after));

    loader.shutdown().await;
}

#[tokio::test]
async fn test_configured_format_flows_through_the_loader() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "cover.png", 80);

    let render_options = RenderOptions {
        format: ThumbFormat::Jpeg,
        quality: 80,
        crop: CropMode::Cover,
        filter: ResizeFilter::Triangle,
    };
    let config = ThumbConfig::builder().render(render_options).build().unwrap();
    let loader = ThumbnailLoader::new(config);

    let thumb = render(&loader, &path, 50).await;
    assert_eq!(thumb.format, ThumbFormat::Jpeg);
    assert_eq!(&thumb.data[..2], &[0xFF, 0xD8]);

    loader.shutdown().await;
}
