//! Thumbnail failure type.
//!
//! One failed request may have many coalesced waiters, so the error is
//! `Clone`: source errors are held behind `Arc` and rendered into the
//! message instead of chained.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Why a thumbnail could not be produced.
///
/// Always local to one request; a failure never aborts other in-flight
/// renders and is never written to the cache.
#[derive(Debug, Clone, Error)]
pub enum ThumbError {
    /// Source file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    /// Source bytes are not a decodable image.
    #[error("Decode failed for {path}: {source}")]
    Decode {
        path: PathBuf,
        source: Arc<image::ImageError>,
    },

    /// The resized image could not be encoded to the requested format.
    #[error("Encode failed for {path}: {source}")]
    Encode {
        path: PathBuf,
        source: Arc<image::ImageError>,
    },

    /// Decode/resize exceeded the per-request budget. The worker slot is
    /// released; the abandoned blocking render finishes in the background.
    #[error("Render timed out after {timeout:?}: {path}")]
    TimedOut { path: PathBuf, timeout: Duration },

    /// The render queue was full; the request was dropped without queuing.
    #[error("Render queue full, request dropped: {path}")]
    QueueFull { path: PathBuf },

    /// The loader shut down before this request completed.
    #[error("Request dropped before completion: {path}")]
    Canceled { path: PathBuf },
}

impl ThumbError {
    /// Wrap a read failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Wrap a decode failure.
    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Wrap an encode failure.
    pub fn encode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Encode {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Whether the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
