//! Page rasterization.
//!
//! Rendering a PDF page to pixels is an external capability; this module
//! owns the policy around it: the scale ceiling, the opaque background,
//! the lossless PNG encoding used for embedding, and the bound on how long
//! an encode may take. Imported images get an in-crate [`RenderSource`]
//! implementation so they flow through the same pipeline as rendered PDF
//! pages.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage, imageops};
use tokio::task;
use tokio::time::timeout;

use crate::collection::Rotation;
use crate::error::{PagedeckError, Result};

/// Hard ceiling on either raster dimension, in pixels.
pub const MAX_RENDER_DIM: u32 = 16384;

/// Scale used for grid thumbnails.
pub const THUMBNAIL_SCALE: f64 = 0.3;

/// Scale used for the preview pane.
pub const PREVIEW_SCALE: f64 = 1.5;

/// Scale used for the single-page view.
pub const SINGLE_VIEW_SCALE: f64 = 2.0;

/// Longest side of a grid thumbnail, in pixels.
pub const MAX_THUMBNAIL_PX: f64 = 120.0;

/// Bound on a single rasterize-to-bytes encode step.
pub const ENCODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of pixels for one page.
///
/// Implementations render over an opaque white background; the output must
/// never carry transparency, which would flatten to artifacts when drawn
/// into a PDF.
pub trait RenderSource: Send + Sync {
    /// Native (unscaled, unrotated) size, in pixels or points.
    fn native_size(&self) -> (f64, f64);

    /// Render at `scale` times the native size with the given rotation.
    ///
    /// Quarter-turn rotations swap the output dimensions.
    fn render(&self, scale: f64, rotation: Rotation) -> Result<RgbImage>;
}

/// Shared, non-owning handle to a [`RenderSource`].
///
/// Pages hold one of these; the rendering collaborator owns the source.
#[derive(Clone)]
pub struct RenderHandle(Arc<dyn RenderSource>);

impl RenderHandle {
    /// Wrap a render source.
    pub fn new(source: impl RenderSource + 'static) -> Self {
        Self(Arc::new(source))
    }

    /// Native size of the underlying source.
    pub fn native_size(&self) -> (f64, f64) {
        self.0.native_size()
    }

    /// Render through the underlying source.
    pub fn render(&self, scale: f64, rotation: Rotation) -> Result<RgbImage> {
        self.0.render(scale, rotation)
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.native_size();
        write!(f, "RenderHandle({w}x{h})")
    }
}

/// An imported raster image acting as its own render source.
///
/// The image is flattened over white at decode time, so downstream code
/// never sees an alpha channel.
pub struct ImagePage {
    image: RgbImage,
}

impl ImagePage {
    /// Decode image bytes into a render source.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are not a decodable image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self {
            image: flatten_over_white(decoded),
        })
    }

    /// Build a render source from an already-decoded image.
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }
}

impl RenderSource for ImagePage {
    fn native_size(&self) -> (f64, f64) {
        (f64::from(self.image.width()), f64::from(self.image.height()))
    }

    fn render(&self, scale: f64, rotation: Rotation) -> Result<RgbImage> {
        if scale <= 0.0 {
            return Err(PagedeckError::rasterize_failure(format!(
                "non-positive render scale {scale}"
            )));
        }
        let width = ((f64::from(self.image.width()) * scale).round() as u32).max(1);
        let height = ((f64::from(self.image.height()) * scale).round() as u32).max(1);

        let scaled = if (width, height) == self.image.dimensions() {
            self.image.clone()
        } else {
            imageops::resize(&self.image, width, height, imageops::FilterType::CatmullRom)
        };

        Ok(match rotation {
            Rotation::None => scaled,
            Rotation::Clockwise90 => imageops::rotate90(&scaled),
            Rotation::Rotate180 => imageops::rotate180(&scaled),
            Rotation::Clockwise270 => imageops::rotate270(&scaled),
        })
    }
}

/// Flatten any alpha channel over an opaque white background.
fn flatten_over_white(image: DynamicImage) -> RgbImage {
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        let mut out = RgbImage::new(rgba.width(), rgba.height());
        for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
            let alpha = f32::from(src[3]) / 255.0;
            for c in 0..3 {
                let blended = f32::from(src[c]) * alpha + 255.0 * (1.0 - alpha);
                dst[c] = blended.round() as u8;
            }
        }
        out
    } else {
        image.to_rgb8()
    }
}

/// Reduce `scale` proportionally so neither scaled dimension exceeds `ceiling`.
pub fn clamped_scale_to(native_w: f64, native_h: f64, scale: f64, ceiling: u32) -> f64 {
    if native_w <= 0.0 || native_h <= 0.0 {
        return scale;
    }
    let ceiling = f64::from(ceiling);
    let max_side = native_w.max(native_h);
    if max_side * scale > ceiling {
        ceiling / max_side
    } else {
        scale
    }
}

/// Reduce `scale` so neither scaled dimension exceeds [`MAX_RENDER_DIM`].
pub fn clamped_scale(native_w: f64, native_h: f64, scale: f64) -> f64 {
    clamped_scale_to(native_w, native_h, scale, MAX_RENDER_DIM)
}

/// Thumbnail scale for a page of the given native size.
///
/// Keeps the longest side at or under [`MAX_THUMBNAIL_PX`] and never
/// exceeds the thumbnail quality tier.
pub fn thumbnail_scale(native_w: f64, native_h: f64) -> f64 {
    let max_side = native_w.max(native_h);
    if max_side <= 0.0 {
        return THUMBNAIL_SCALE;
    }
    (MAX_THUMBNAIL_PX / max_side).min(THUMBNAIL_SCALE)
}

/// Rasterizer with the export scale/encode policy applied.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    /// Ceiling on either output dimension.
    max_dimension: u32,

    /// Bound on the encode step.
    encode_timeout: Duration,
}

impl Rasterizer {
    /// Create a rasterizer with the default policy.
    pub fn new() -> Self {
        Self {
            max_dimension: MAX_RENDER_DIM,
            encode_timeout: ENCODE_TIMEOUT,
        }
    }

    /// Create a rasterizer with a custom dimension ceiling and encode bound.
    pub fn with_limits(max_dimension: u32, encode_timeout: Duration) -> Self {
        Self {
            max_dimension,
            encode_timeout,
        }
    }

    /// Render a page, clamping the scale to the dimension ceiling.
    ///
    /// # Errors
    ///
    /// Fails if the underlying render fails or produces a dimension above
    /// the ceiling despite the clamp.
    pub fn render_clamped(
        &self,
        handle: &RenderHandle,
        scale: f64,
        rotation: Rotation,
    ) -> Result<RgbImage> {
        let (native_w, native_h) = handle.native_size();
        let effective = clamped_scale_to(native_w, native_h, scale, self.max_dimension);
        if effective < scale {
            log::warn!(
                "reducing render scale {scale} to {effective:.3} to keep {native_w}x{native_h} under {} px",
                self.max_dimension
            );
        }

        let image = handle.render(effective, rotation)?;
        if image.width() > self.max_dimension || image.height() > self.max_dimension {
            return Err(PagedeckError::rasterize_failure(format!(
                "renderer produced {}x{} canvas, above the {} px ceiling",
                image.width(),
                image.height(),
                self.max_dimension
            )));
        }
        Ok(image)
    }

    /// Encode a raster as lossless PNG bytes, bounded by the encode timeout.
    ///
    /// # Errors
    ///
    /// Fails with [`PagedeckError::RasterizeFailure`] if encoding fails or
    /// does not complete within the bound.
    pub async fn to_png_bytes(&self, image: RgbImage) -> Result<Vec<u8>> {
        let encode = task::spawn_blocking(move || -> Result<Vec<u8>> {
            let mut bytes = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(image)
                .write_to(&mut bytes, ImageFormat::Png)
                .map_err(|e| PagedeckError::rasterize_failure(format!("PNG encode failed: {e}")))?;
            Ok(bytes.into_inner())
        });

        match timeout(self.encode_timeout, encode).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(PagedeckError::rasterize_failure(format!(
                "PNG encode task failed: {join_err}"
            ))),
            Err(_) => Err(PagedeckError::rasterize_failure(format!(
                "PNG encode did not complete within {} s",
                self.encode_timeout.as_secs()
            ))),
        }
    }

    /// Render a page and encode it as PNG bytes in one step.
    pub async fn rasterize(
        &self,
        handle: &RenderHandle,
        scale: f64,
        rotation: Rotation,
    ) -> Result<Vec<u8>> {
        let image = self.render_clamped(handle, scale, rotation)?;
        self.to_png_bytes(image).await
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a raster as PNG bytes synchronously.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| PagedeckError::rasterize_failure(format!("PNG encode failed: {e}")))?;
    Ok(bytes.into_inner())
}
