//! Thumbnail cache keys and render options.

use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output encoding for rendered thumbnails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ThumbFormat {
    /// Raw RGBA pixels, no encode cost, largest footprint.
    #[default]
    Rgba,
    /// JPEG at the configured quality.
    Jpeg,
    /// PNG, lossless.
    Png,
}

/// How a source image is fitted into the requested box.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CropMode {
    /// Preserve aspect ratio inside the box; output may be smaller than
    /// requested on one axis.
    #[default]
    Fit,
    /// Fill the box exactly, cropping the overflow around the center.
    Cover,
    /// Stretch to the box, ignoring aspect ratio.
    Stretch,
}

/// Resampling filter used when scaling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    /// Nearest neighbour, fastest.
    Nearest,
    /// Linear interpolation.
    Triangle,
    /// Lanczos with window 3, best quality.
    #[default]
    Lanczos3,
}

/// Render-affecting configuration, hashed into every cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Output encoding.
    pub format: ThumbFormat,
    /// Encoder quality, 1 to 100. Only meaningful for lossy formats.
    pub quality: u8,
    /// Fit mode.
    pub crop: CropMode,
    /// Scaling filter.
    pub filter: ResizeFilter,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: ThumbFormat::default(),
            quality: 85,
            crop: CropMode::default(),
            filter: ResizeFilter::default(),
        }
    }
}

impl RenderOptions {
    /// Compact digest of every render-affecting field.
    ///
    /// First 8 bytes of a BLAKE3 hash over the option wire names, so any
    /// configuration change makes every previously rendered key
    /// unreachable rather than serving bitmaps rendered under old
    /// settings.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.format.to_string(),
            self.crop.to_string(),
            self.filter.to_string(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&[self.quality]);

        let digest: [u8; 32] = hasher.finalize().into();
        let mut first = [0u8; 8];
        first.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(first)
    }
}

/// Cache key for one rendered thumbnail.
///
/// The source file's modification time at key-build time is part of the
/// key: editing the file changes the mtime, so entries rendered from the
/// old contents stop being addressable and age out of the LRU tail. They
/// are never served stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbKey {
    /// Canonicalized source path.
    pub path: PathBuf,
    /// Requested box width.
    pub width: u32,
    /// Requested box height.
    pub height: u32,
    /// [`RenderOptions::fingerprint`] at request time.
    pub fingerprint: u64,
    /// Source mtime as Unix seconds when the key was built.
    pub mtime_unix: u64,
}

impl ThumbKey {
    /// Build a key for `path`, normalizing it and reading its current
    /// modification time.
    pub fn for_file(
        path: &Path,
        width: u32,
        height: u32,
        options: &RenderOptions,
    ) -> io::Result<Self> {
        let canonical = path.canonicalize()?;
        let meta = std::fs::metadata(&canonical)?;
        let mtime_unix = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Self {
            path: canonical,
            width,
            height,
            fingerprint: options.fingerprint(),
            mtime_unix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_changes_with_any_option() {
        let base = RenderOptions::default();
        let fp = base.fingerprint();

        let mut quality = base.clone();
        quality.quality = 60;
        assert_ne!(fp, quality.fingerprint());

        let mut format = base.clone();
        format.format = ThumbFormat::Jpeg;
        assert_ne!(fp, format.fingerprint());

        let mut crop = base.clone();
        crop.crop = CropMode::Cover;
        assert_ne!(fp, crop.fingerprint());

        let mut filter = base;
        filter.filter = ResizeFilter::Nearest;
        assert_ne!(fp, filter.fingerprint());
    }

    #[test]
    fn fingerprint_is_stable_for_equal_options() {
        assert_eq!(
            RenderOptions::default().fingerprint(),
            RenderOptions::default().fingerprint()
        );
    }

    #[test]
    fn mtime_is_part_of_key_identity() {
        let a = ThumbKey {
            path: PathBuf::from("/img.png"),
            width: 64,
            height: 64,
            fingerprint: 7,
            mtime_unix: 1_000,
        };
        let mut b = a.clone();
        b.mtime_unix = 2_000;
        assert_ne!(a, b);
    }

    #[test]
    fn enum_wire_names() {
        use std::str::FromStr;

        assert_eq!(ThumbFormat::Jpeg.to_string(), "jpeg");
        assert_eq!(CropMode::from_str("cover").unwrap(), CropMode::Cover);
        assert_eq!(ResizeFilter::from_str("lanczos3").unwrap(), ResizeFilter::Lanczos3);
        assert!(ThumbFormat::from_str("tiff").is_err());
    }
}
