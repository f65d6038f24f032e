//! Input validation.
//!
//! Validates source files before import: existence, supported type, and
//! that the content actually parses (PDF) or decodes (image). Running
//! this first lets the CLI reject a bad batch with one clear message
//! instead of failing halfway through an import.

use lopdf::Document;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PagedeckError, Result};
use crate::store::SourceFileKind;

/// Result of validating a single input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Path to the validated file.
    pub path: PathBuf,

    /// Detected source kind.
    pub kind: ValidatedKind,

    /// Number of pages the file will contribute.
    pub page_count: usize,

    /// Size of the file in bytes.
    pub file_size: u64,

    /// First page or image dimensions (width, height), if available.
    pub dimensions: Option<(f32, f32)>,
}

/// Serializable mirror of [`SourceFileKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatedKind {
    /// A PDF document.
    Pdf,
    /// A raster image.
    Image,
}

impl From<SourceFileKind> for ValidatedKind {
    fn from(kind: SourceFileKind) -> Self {
        match kind {
            SourceFileKind::Pdf => Self::Pdf,
            SourceFileKind::Image => Self::Image,
        }
    }
}

/// Summary of validation results for multiple files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Individual validation results for each file.
    pub results: Vec<ValidationResult>,

    /// Total number of pages across all files.
    pub total_pages: usize,

    /// Total file size in bytes.
    pub total_size: u64,
}

impl ValidationSummary {
    /// Create a summary from validation results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let total_pages = results.iter().map(|r| r.page_count).sum();
        let total_size = results.iter().map(|r| r.file_size).sum();
        Self {
            results,
            total_pages,
            total_size,
        }
    }
}

/// Validator for import inputs.
#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate a single input file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, has an unsupported
    /// type, or its content does not parse.
    pub async fn validate_file(&self, path: &Path) -> Result<ValidationResult> {
        if !path.exists() {
            return Err(PagedeckError::file_not_found(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(PagedeckError::unsupported_file(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let kind = match extension.as_str() {
            "pdf" => SourceFileKind::Pdf,
            "png" | "jpg" | "jpeg" | "gif" | "webp" => SourceFileKind::Image,
            _ => return Err(PagedeckError::unsupported_file(path.to_path_buf())),
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PagedeckError::FileNotAccessible {
                path: path.to_path_buf(),
                source: e,
            })?;
        let file_size = bytes.len() as u64;

        match kind {
            SourceFileKind::Pdf => {
                let document = Document::load_mem(&bytes).map_err(|e| {
                    PagedeckError::failed_to_load_source(path.to_path_buf(), e.to_string())
                })?;
                let pages = document.get_pages();
                if pages.is_empty() {
                    return Err(PagedeckError::failed_to_load_source(
                        path.to_path_buf(),
                        "PDF has no pages",
                    ));
                }

                Ok(ValidationResult {
                    path: path.to_path_buf(),
                    kind: kind.into(),
                    page_count: pages.len(),
                    file_size,
                    dimensions: first_page_dimensions(&document),
                })
            }
            SourceFileKind::Image => {
                let decoded = image::load_from_memory(&bytes).map_err(|e| {
                    PagedeckError::failed_to_load_source(path.to_path_buf(), e.to_string())
                })?;
                let rgb = decoded.to_rgb8();

                Ok(ValidationResult {
                    path: path.to_path_buf(),
                    kind: kind.into(),
                    page_count: 1,
                    file_size,
                    dimensions: Some((rgb.width() as f32, rgb.height() as f32)),
                })
            }
        }
    }

    /// Validate every input, failing on the first bad one.
    ///
    /// # Errors
    ///
    /// Propagates the first per-file validation error.
    pub async fn validate_all(&self, paths: &[PathBuf]) -> Result<ValidationSummary> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.validate_file(path).await?);
        }
        Ok(ValidationSummary::from_results(results))
    }
}

/// MediaBox dimensions of the first page, if cleanly readable.
fn first_page_dimensions(document: &Document) -> Option<(f32, f32)> {
    let (_, page_id) = document.get_pages().into_iter().next()?;
    let page = document.get_dictionary(page_id).ok()?;
    let media_box = page.get(b"MediaBox").ok()?.as_array().ok()?;
    if media_box.len() < 4 {
        return None;
    }
    let coord = |i: usize| media_box[i].as_float().ok();
    let (x0, y0, x1, y1) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);
    Some(((x1 - x0).abs(), (y1 - y0).abs()))
}
