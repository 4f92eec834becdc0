//! Image decode, resize, and encode.
//!
//! Rendering is synchronous and CPU-bound; the async loader wraps it in
//! `spawn_blocking`, and [`render_batch`] fans it out on the rayon pool for
//! bulk prerendering.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use rayon::prelude::*;

use crate::error::ThumbError;
use crate::key::{CropMode, RenderOptions, ResizeFilter, ThumbFormat};

/// A rendered thumbnail.
///
/// `data` is raw RGBA (`width * height * 4` bytes) or an encoded stream,
/// per `format`. Values are shared as `Arc` by the cache and loader; the
/// buffer is never mutated after rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Pixel or encoded bytes.
    pub data: Vec<u8>,
    /// Actual output width; under [`CropMode::Fit`] this can be smaller
    /// than requested on one axis.
    pub width: u32,
    /// Actual output height.
    pub height: u32,
    /// Encoding of `data`.
    pub format: ThumbFormat,
}

impl Thumbnail {
    /// Exact byte length of the retained buffer.
    pub fn byte_len(&self) -> u64 {
        self.data.len() as u64
    }
}

impl ResizeFilter {
    fn to_image(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Decode `path` and render one thumbnail. Zero dimensions are clamped
/// to one pixel.
pub fn render_file(
    path: &Path,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<Thumbnail, ThumbError> {
    let reader = ImageReader::open(path)
        .map_err(|err| ThumbError::io(path, err))?
        .with_guessed_format()
        .map_err(|err| ThumbError::io(path, err))?;
    let source = reader
        .decode()
        .map_err(|err| ThumbError::decode(path, err))?;
    render_image(path, source, width, height, options)
}

fn render_image(
    path: &Path,
    source: DynamicImage,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<Thumbnail, ThumbError> {
    let width = width.max(1);
    let height = height.max(1);
    let filter = options.filter.to_image();

    let resized = match options.crop {
        CropMode::Fit => source.resize(width, height, filter),
        CropMode::Cover => source.resize_to_fill(width, height, filter),
        CropMode::Stretch => source.resize_exact(width, height, filter),
    };
    let out_width = resized.width();
    let out_height = resized.height();

    let data = match options.format {
        ThumbFormat::Rgba => resized.into_rgba8().into_raw(),
        ThumbFormat::Jpeg => {
            let mut data = Vec::new();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                Cursor::new(&mut data),
                options.quality,
            );
            // JPEG has no alpha channel.
            let rgb = resized.into_rgb8();
            encoder
                .encode_image(&rgb)
                .map_err(|err| ThumbError::encode(path, err))?;
            data
        }
        ThumbFormat::Png => {
            let mut data = Vec::new();
            resized
                .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
                .map_err(|err| ThumbError::encode(path, err))?;
            data
        }
    };

    Ok(Thumbnail {
        data,
        width: out_width,
        height: out_height,
        format: options.format,
    })
}

/// Render many thumbnails in parallel on the rayon pool.
///
/// Used to warm a directory ahead of display. Entries fail independently;
/// the output order matches the input order.
pub fn render_batch(
    requests: &[(PathBuf, u32, u32)],
    options: &RenderOptions,
) -> Vec<Result<Thumbnail, ThumbError>> {
    requests
        .par_iter()
        .map(|(path, width, height)| render_file(path, *width, *height, options))
        .collect()
}
