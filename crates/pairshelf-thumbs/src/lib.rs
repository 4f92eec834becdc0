//! Thumbnail rendering and caching for pairshelf.
//!
//! This crate provides the gallery's image pipeline: a synchronous
//! renderer (decode, resize, encode), a cache bounded by entry count and
//! total bytes, and an async loader that coalesces duplicate requests
//! onto a fixed worker pool.
//!
//! ## Example
//!
//! ```no_run
//! use pairshelf_thumbs::{ThumbConfig, ThumbnailLoader, ThumbnailResponse};
//!
//! # async fn demo() -> Result<(), pairshelf_thumbs::ThumbError> {
//! let loader = ThumbnailLoader::new(ThumbConfig::default());
//! match loader.request("photos/cover.jpg".as_ref(), 256, 256) {
//!     ThumbnailResponse::Ready(thumb) => {
//!         println!("cached: {}x{}", thumb.width, thumb.height);
//!     }
//!     ThumbnailResponse::Pending(pending) => {
//!         let thumb = pending.wait().await?;
//!         println!("rendered: {}x{}", thumb.width, thumb.height);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod error;
mod key;
mod loader;
mod render;

pub use cache::ThumbnailCache;
pub use config::{ThumbConfig, ThumbConfigBuilder};
pub use error::ThumbError;
pub use key::{CropMode, RenderOptions, ResizeFilter, ThumbFormat, ThumbKey};
pub use loader::{PendingThumbnail, ThumbnailLoader, ThumbnailResponse};
pub use render::{render_batch, render_file, Thumbnail};

// Re-export core types for convenience
pub use pairshelf_core::CacheStatistics;
