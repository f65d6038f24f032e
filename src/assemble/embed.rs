//! Raster embedding into the output document.
//!
//! Exported rasters arrive as lossless PNG bytes; embedding decodes them
//! and stores the raw RGB samples behind FlateDecode. JPEG sources can
//! take a fast path that stores the original bytes behind DCTDecode, but
//! any failure there falls back to the PNG route so a page is never lost
//! to an embed optimization.

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};
use image::RgbImage;
use lopdf::{Stream, dictionary};

use crate::error::{PagedeckError, Result};

/// An image XObject ready to be drawn into the output document.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Pixel width of the embedded raster.
    pub width: u32,

    /// Pixel height of the embedded raster.
    pub height: u32,

    pub(crate) stream: Stream,
}

/// Embed lossless PNG bytes as a FlateDecode DeviceRGB XObject.
///
/// # Errors
///
/// Fails if the bytes don't decode or the sample data can't be compressed.
pub fn embed_png(png_bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoded = image::load_from_memory(png_bytes)
        .map_err(|e| PagedeckError::rasterize_failure(format!("cannot decode raster: {e}")))?;
    embed_rgb(decoded.to_rgb8())
}

/// Embed decoded RGB samples directly.
pub fn embed_rgb(image: RgbImage) -> Result<EmbeddedImage> {
    let (width, height) = image.dimensions();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(image.as_raw())?;
    let data = encoder.finish()?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode"
    };

    Ok(EmbeddedImage {
        width,
        height,
        stream: Stream::new(dict, data),
    })
}

/// Embed JPEG bytes without recompression, behind DCTDecode.
///
/// # Errors
///
/// Fails if the bytes are not a decodable JPEG; callers fall back to
/// [`embed_png`].
pub fn embed_jpeg(jpeg_bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoded = image::load_from_memory_with_format(jpeg_bytes, image::ImageFormat::Jpeg)
        .map_err(|e| PagedeckError::rasterize_failure(format!("cannot decode JPEG: {e}")))?;
    let (width, height) = decoded.to_rgb8().dimensions();

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode"
    };

    Ok(EmbeddedImage {
        width,
        height,
        stream: Stream::new(dict, jpeg_bytes.to_vec()),
    })
}

/// Embed raster bytes, using the JPEG fast path when it applies.
///
/// JPEG data is stored as-is to avoid a lossy recompression cycle; any
/// failure on that path falls back to decoding and re-embedding as
/// FlateDecode RGB.
pub fn embed_raster(bytes: &[u8]) -> Result<EmbeddedImage> {
    if looks_like_jpeg(bytes) {
        match embed_jpeg(bytes) {
            Ok(embedded) => return Ok(embedded),
            Err(err) => {
                log::warn!("JPEG embed failed, falling back to PNG path: {err}");
            }
        }
    }
    embed_png(bytes)
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}
