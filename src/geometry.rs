//! Page geometry normalization.
//!
//! Output documents reflow every page to A4: orientation is detected from
//! the source dimensions, vector pages within tolerance of the target keep
//! their native content, and everything else is rasterized and drawn
//! centered on a fresh page with a fixed margin. The same centered
//! fit-to-page routine serves both rasterized PDF pages and imported
//! images.

/// A4 portrait size in points at 72 dpi.
pub const A4_PORTRAIT: (f64, f64) = (595.0, 842.0);

/// A4 landscape size in points at 72 dpi.
pub const A4_LANDSCAPE: (f64, f64) = (842.0, 595.0);

/// Vector pages within this distance (points) of the target size are kept
/// as native content instead of being rasterized.
pub const SIZE_TOLERANCE: f64 = 10.0;

/// Margin in points applied on every side of a normalized page.
pub const PAGE_MARGIN: f64 = 20.0;

/// Page orientation, detected from source dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Height >= width.
    Portrait,
    /// Width > height.
    Landscape,
}

impl Orientation {
    /// Detect orientation from a width/height pair.
    pub fn of(width: f64, height: f64) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }

    /// The A4 target size for this orientation.
    pub fn target_size(self) -> (f64, f64) {
        match self {
            Self::Portrait => A4_PORTRAIT,
            Self::Landscape => A4_LANDSCAPE,
        }
    }
}

/// The A4 target size matching the orientation of the given dimensions.
pub fn target_page_size(width: f64, height: f64) -> (f64, f64) {
    Orientation::of(width, height).target_size()
}

/// Whether a vector page of the given size must be reflowed.
///
/// Pages within [`SIZE_TOLERANCE`] of their orientation-matched A4 target
/// keep their native vector content to preserve quality and file size.
pub fn needs_normalization(width: f64, height: f64) -> bool {
    let (target_w, target_h) = target_page_size(width, height);
    (width - target_w).abs() > SIZE_TOLERANCE || (height - target_h).abs() > SIZE_TOLERANCE
}

/// Placement of a drawn image on a target page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    /// Left edge of the drawn image.
    pub x: f64,
    /// Bottom edge of the drawn image.
    pub y: f64,
    /// Drawn width.
    pub width: f64,
    /// Drawn height.
    pub height: f64,
}

/// Compute the centered fit-to-page placement for an image.
///
/// A fixed [`PAGE_MARGIN`] is reserved on every side; the image is scaled
/// to fill the remaining area along its constraining axis (fit-to-width
/// when its aspect is wider than the available area, fit-to-height
/// otherwise) and centered on the page.
///
/// # Arguments
///
/// * `image_w`, `image_h` - source image dimensions (pixels or points)
/// * `page_w`, `page_h` - target page dimensions in points
pub fn fit_rect(image_w: f64, image_h: f64, page_w: f64, page_h: f64) -> FitRect {
    let available_w = page_w - 2.0 * PAGE_MARGIN;
    let available_h = page_h - 2.0 * PAGE_MARGIN;

    if image_w <= 0.0 || image_h <= 0.0 {
        return FitRect {
            x: page_w / 2.0,
            y: page_h / 2.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let image_aspect = image_w / image_h;
    let available_aspect = available_w / available_h;

    let (draw_w, draw_h) = if image_aspect > available_aspect {
        (available_w, available_w / image_aspect)
    } else {
        (available_h * image_aspect, available_h)
    };

    FitRect {
        x: (page_w - draw_w) / 2.0,
        y: (page_h - draw_h) / 2.0,
        width: draw_w,
        height: draw_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_orientation_detection() {
        assert_eq!(Orientation::of(595.0, 842.0), Orientation::Portrait);
        assert_eq!(Orientation::of(842.0, 595.0), Orientation::Landscape);
        // A square page counts as portrait.
        assert_eq!(Orientation::of(500.0, 500.0), Orientation::Portrait);
    }

    #[test]
    fn test_target_page_size() {
        assert_eq!(target_page_size(100.0, 200.0), A4_PORTRAIT);
        assert_eq!(target_page_size(200.0, 100.0), A4_LANDSCAPE);
    }

    #[test]
    fn test_tolerance_keeps_near_a4_pages() {
        // Exactly A4, and within 10pt on either axis.
        assert!(!needs_normalization(595.0, 842.0));
        assert!(!needs_normalization(600.0, 850.0));
        // US Letter is well outside the tolerance.
        assert!(needs_normalization(612.0, 792.0));
    }

    #[test]
    fn test_tolerance_boundary() {
        // 10pt off is still in tolerance, 11pt is not.
        assert!(!needs_normalization(585.0, 842.0));
        assert!(needs_normalization(584.0, 842.0));
        assert!(!needs_normalization(595.0, 852.0));
        assert!(needs_normalization(595.0, 853.0));
    }

    #[test]
    fn test_fit_wide_image_uses_width() {
        // 1400x800 on a landscape A4: constrained by width.
        let fit = fit_rect(1400.0, 800.0, 842.0, 595.0);
        assert!(approx(fit.width, 802.0));
        assert!(approx(fit.height, 802.0 * 800.0 / 1400.0));
        // Centered on both axes.
        assert!(approx(fit.x, (842.0 - fit.width) / 2.0));
        assert!(approx(fit.y, (595.0 - fit.height) / 2.0));
    }

    #[test]
    fn test_fit_tall_image_uses_height() {
        let fit = fit_rect(500.0, 2000.0, 595.0, 842.0);
        assert!(approx(fit.height, 802.0));
        assert!(approx(fit.width, 802.0 * 500.0 / 2000.0));
        assert!(approx(fit.x, (595.0 - fit.width) / 2.0));
    }

    #[test]
    fn test_fit_never_exceeds_available_area() {
        for &(w, h) in &[
            (1.0, 1.0),
            (10000.0, 1.0),
            (1.0, 10000.0),
            (842.0, 595.0),
            (595.0, 842.0),
        ] {
            let (pw, ph) = target_page_size(w, h);
            let fit = fit_rect(w, h, pw, ph);
            assert!(fit.width <= pw - 2.0 * PAGE_MARGIN + 1e-6);
            assert!(fit.height <= ph - 2.0 * PAGE_MARGIN + 1e-6);
            assert!(fit.x >= PAGE_MARGIN - 1e-6);
            assert!(fit.y >= PAGE_MARGIN - 1e-6);
        }
    }

    #[test]
    fn test_fit_degenerate_image() {
        let fit = fit_rect(0.0, 100.0, 595.0, 842.0);
        assert_eq!(fit.width, 0.0);
        assert_eq!(fit.height, 0.0);
    }

    #[test]
    fn test_fit_preserves_aspect() {
        let fit = fit_rect(1600.0, 900.0, 842.0, 595.0);
        assert!(approx(fit.width / fit.height, 1600.0 / 900.0));
    }
}
