//! Configuration for export operations.
//!
//! This module turns user-supplied options into validated, normalized
//! values that drive assembly and export: the output format, the raster
//! quality tier, page selections and split ranges.

use anyhow::{Context, Result as AnyResult, bail};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PagedeckError;

/// What an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// One combined PDF of the selected pages.
    #[default]
    SingleDocument,
    /// A ZIP archive with one single-page PDF per selected page.
    PdfArchive,
    /// A ZIP archive with one PNG per selected page.
    ImageArchive,
}

impl FromStr for ExportFormat {
    type Err = PagedeckError;

    /// Parse an export format from string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a valid format.
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "single-pdf" | "pdf" => Ok(Self::SingleDocument),
            "pdf-archive" | "separate-pdf" => Ok(Self::PdfArchive),
            "image-archive" | "separate-images" => Ok(Self::ImageArchive),
            _ => Err(PagedeckError::invalid_config(format!(
                "Invalid export format: {s}. Must be one of: single-pdf, pdf-archive, image-archive"
            ))),
        }
    }
}

/// Raster quality tier for pages that must be rasterized on export.
///
/// The tier sets the render scale before the dimension ceiling clamps it;
/// thumbnails and previews have their own fixed scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    /// 3x native size - fast, reasonable fidelity.
    Standard,
    /// 4x native size - the image-archive default.
    #[default]
    High,
    /// 5x native size - slowest, best fidelity.
    Maximum,
}

impl ExportQuality {
    /// The render scale for this tier.
    pub fn scale(self) -> f64 {
        match self {
            Self::Standard => 3.0,
            Self::High => 4.0,
            Self::Maximum => 5.0,
        }
    }
}

impl FromStr for ExportQuality {
    type Err = PagedeckError;

    /// Parse a quality tier from string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a valid tier.
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "high" => Ok(Self::High),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PagedeckError::invalid_config(format!(
                "Invalid quality tier: {s}. Must be one of: standard, high, maximum"
            ))),
        }
    }
}

/// Options driving one export operation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    /// What the export produces.
    pub format: ExportFormat,

    /// Raster quality for pages that need rasterization.
    pub quality: ExportQuality,
}

/// Page selection specification over the working document.
///
/// Supports individual pages and ranges, 1-based:
/// - "3" - single page
/// - "1-5" - inclusive range
/// - "1,3,5" - multiple pages
/// - "1-5,10-15" - combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSet {
    items: Vec<PageSetItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageSetItem {
    Single(u32),
    Range(u32, u32),
}

impl PageSet {
    /// Parse a page set string.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid or contains invalid page
    /// numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagedeck::config::PageSet;
    ///
    /// let set = PageSet::parse("1-3,7").unwrap();
    /// assert!(set.contains(2));
    /// assert!(set.contains(7));
    /// assert!(!set.contains(5));
    /// ```
    pub fn parse(s: &str) -> AnyResult<Self> {
        let mut items = Vec::new();

        for part in s.split(',') {
            let part = part.trim();

            if part.contains('-') {
                let pieces: Vec<&str> = part.split('-').collect();
                if pieces.len() != 2 {
                    bail!("Invalid page range format: {part}. Expected format like '1-5'");
                }

                let start: u32 = pieces[0]
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid page number: {}", pieces[0]))?;
                let end: u32 = pieces[1]
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid page number: {}", pieces[1]))?;

                if start == 0 || end == 0 {
                    bail!("Page numbers must be positive (1-indexed)");
                }
                if start > end {
                    bail!(
                        "Invalid range {start}-{end}: start page must be less than or equal to end page"
                    );
                }

                items.push(PageSetItem::Range(start, end));
            } else {
                let page: u32 = part
                    .parse()
                    .with_context(|| format!("Invalid page number: {part}"))?;
                if page == 0 {
                    bail!("Page numbers must be positive (1-indexed)");
                }
                items.push(PageSetItem::Single(page));
            }
        }

        if items.is_empty() {
            bail!("Page set cannot be empty");
        }

        Ok(Self { items })
    }

    /// Whether the 1-based page number is in the set.
    pub fn contains(&self, page: u32) -> bool {
        self.items.iter().any(|item| match item {
            PageSetItem::Single(p) => *p == page,
            PageSetItem::Range(start, end) => page >= *start && page <= *end,
        })
    }

    /// The 0-based indices selected by this set, ascending, for a document
    /// of `total` pages. Out-of-range entries are dropped.
    pub fn to_indices(&self, total: usize) -> Vec<usize> {
        (1..=total as u32)
            .filter(|p| self.contains(*p))
            .map(|p| (p - 1) as usize)
            .collect()
    }
}

/// An inclusive, 1-based page range for the split operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    /// First page of the range (1-based).
    pub start: u32,
    /// Last page of the range (inclusive).
    pub end: u32,
}

impl SplitRange {
    /// Parse a "start-end" range string.
    ///
    /// # Errors
    ///
    /// Returns an error for anything that is not two positive integers
    /// separated by a dash with `start <= end`.
    pub fn parse(s: &str) -> AnyResult<Self> {
        let pieces: Vec<&str> = s.split('-').map(str::trim).collect();
        if pieces.len() != 2 {
            bail!("Invalid split range: {s}. Expected format like '2-7'");
        }

        let start: u32 = pieces[0]
            .parse()
            .with_context(|| format!("Invalid page number: {}", pieces[0]))?;
        let end: u32 = pieces[1]
            .parse()
            .with_context(|| format!("Invalid page number: {}", pieces[1]))?;

        if start == 0 || end == 0 {
            bail!("Page numbers must be positive (1-indexed)");
        }
        if start > end {
            bail!("Invalid range {start}-{end}: start page must not be after end page");
        }

        Ok(Self { start, end })
    }

    /// Validate the range against a document of `total` pages.
    ///
    /// # Errors
    ///
    /// Returns [`PagedeckError::InvalidRange`] when the range does not fit.
    pub fn validate(&self, total: usize) -> crate::Result<()> {
        if total == 0 || self.start as usize > total || self.end as usize > total {
            return Err(PagedeckError::invalid_range(
                format!("{}-{}", self.start, self.end),
                total,
            ));
        }
        Ok(())
    }

    /// The 0-based indices covered by the range.
    pub fn to_indices(&self) -> Vec<usize> {
        ((self.start - 1) as usize..self.end as usize).collect()
    }
}
