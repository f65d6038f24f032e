//! Error types for pagedeck.
//!
//! This module defines all error types that can occur while importing,
//! reorganizing and exporting pages. Errors carry enough context (page
//! number, source file name) for a caller to present a single aggregate
//! failure to the user.
//!
//! # Error Categories
//!
//! - **I/O Errors**: file not found, permission denied, etc.
//! - **Source Errors**: missing store records, unloadable or unsupported files
//! - **Page Errors**: invalid page indices, rasterization failures
//! - **Export Errors**: archive failures, busy exporter, cancellation

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::store::FileId;

/// Result type alias for pagedeck operations.
pub type Result<T> = std::result::Result<T, PagedeckError>;

/// Main error type for pagedeck operations.
///
/// Per-page failures abort the enclosing document or archive operation; the
/// enclosing operation wraps them with [`PagedeckError::with_page`] so the
/// final error names the page and the file it came from.
#[derive(Debug)]
pub enum PagedeckError {
    /// Input file was not found.
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input file has a type pagedeck cannot import.
    UnsupportedFile {
        /// Path to the rejected file.
        path: PathBuf,
    },

    /// A source file failed to parse or decode during import.
    FailedToLoadSource {
        /// Path to the source file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The file store has no record for a referenced file id.
    SourceFileMissing {
        /// The dangling file id.
        file_id: FileId,
    },

    /// A page reference points outside its source document.
    InvalidPageIndex {
        /// Requested 1-based page number.
        page: u32,
        /// Total pages in the source document.
        total: usize,
        /// Name of the source file.
        file: String,
    },

    /// Rendering or encoding a page raster failed or timed out.
    RasterizeFailure {
        /// Reason for the failure.
        reason: String,
    },

    /// Building the output document failed.
    AssemblyFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// A per-page failure, wrapped with the page's identity.
    PageFailed {
        /// 1-based page number within the source file.
        page: u32,
        /// Name of the source file the page came from.
        file: String,
        /// The underlying failure.
        source: Box<PagedeckError>,
    },

    /// The archive capability is not available at call time.
    ArchiveUnavailable,

    /// Writing or finalizing the archive failed.
    ArchiveFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// An export was requested while another export is running.
    ExportBusy,

    /// No pages are selected for the requested operation.
    NoPagesSelected,

    /// A page range does not fit the working document.
    InvalidRange {
        /// The requested range, as entered.
        range: String,
        /// Total pages in the working document.
        total: usize,
    },

    /// The operation was cancelled between pages.
    Cancelled,

    /// Failed to create or write an output file.
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Invalid configuration.
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    Io {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic error with a custom message.
    Other {
        /// Error message.
        message: String,
    },
}

impl fmt::Display for PagedeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            Self::FileNotAccessible { path, source } => {
                write!(
                    f,
                    "Cannot access file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::UnsupportedFile { path } => {
                write!(
                    f,
                    "Unsupported file type: {}\n  \
                     Supported inputs are PDF documents and PNG/JPEG/GIF/WebP images",
                    path.display()
                )
            }
            Self::FailedToLoadSource { path, reason } => {
                write!(
                    f,
                    "Failed to load source file: {}\n  Reason: {}",
                    path.display(),
                    reason
                )
            }
            Self::SourceFileMissing { file_id } => {
                write!(f, "Source file record missing from store: {file_id}")
            }
            Self::InvalidPageIndex { page, total, file } => {
                write!(
                    f,
                    "Invalid page number {page} for '{file}': source has {total} page(s)"
                )
            }
            Self::RasterizeFailure { reason } => {
                write!(f, "Failed to rasterize page: {reason}")
            }
            Self::AssemblyFailed { reason } => {
                write!(f, "Document assembly failed: {reason}")
            }
            Self::PageFailed { page, file, source } => {
                write!(f, "Page {page} of '{file}': {source}")
            }
            Self::ArchiveUnavailable => {
                write!(f, "Archive capability is not available")
            }
            Self::ArchiveFailed { reason } => {
                write!(f, "Archive operation failed: {reason}")
            }
            Self::ExportBusy => {
                write!(
                    f,
                    "An export is already in progress\n  \
                     Wait for it to finish before starting another"
                )
            }
            Self::NoPagesSelected => {
                write!(f, "No pages selected for export")
            }
            Self::InvalidRange { range, total } => {
                write!(
                    f,
                    "Invalid page range '{range}': the working document has {total} page(s). \
                     Page numbers must be between 1 and {total}"
                )
            }
            Self::Cancelled => {
                write!(f, "Operation cancelled")
            }
            Self::FailedToWrite { path, source } => {
                write!(
                    f,
                    "Failed to write output file: {}\n  Reason: {}",
                    path.display(),
                    source
                )
            }
            Self::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {message}")
            }
            Self::Io { source } => {
                write!(f, "I/O error: {source}")
            }
            Self::Other { message } => {
                write!(f, "{message}")
            }
        }
    }
}

impl std::error::Error for PagedeckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileNotAccessible { source, .. } => Some(source),
            Self::FailedToWrite { source, .. } => Some(source),
            Self::PageFailed { source, .. } => Some(source.as_ref()),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for PagedeckError {
    fn from(err: io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<lopdf::Error> for PagedeckError {
    fn from(err: lopdf::Error) -> Self {
        Self::assembly_failed(err.to_string())
    }
}

impl From<image::ImageError> for PagedeckError {
    fn from(err: image::ImageError) -> Self {
        Self::rasterize_failure(err.to_string())
    }
}

impl From<anyhow::Error> for PagedeckError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PagedeckError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create an UnsupportedFile error.
    pub fn unsupported_file(path: PathBuf) -> Self {
        Self::UnsupportedFile { path }
    }

    /// Create a FailedToLoadSource error.
    pub fn failed_to_load_source(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadSource {
            path,
            reason: reason.into(),
        }
    }

    /// Create an InvalidPageIndex error.
    pub fn invalid_page_index(page: u32, total: usize, file: impl Into<String>) -> Self {
        Self::InvalidPageIndex {
            page,
            total,
            file: file.into(),
        }
    }

    /// Create a RasterizeFailure error.
    pub fn rasterize_failure(reason: impl Into<String>) -> Self {
        Self::RasterizeFailure {
            reason: reason.into(),
        }
    }

    /// Create an AssemblyFailed error.
    pub fn assembly_failed(reason: impl Into<String>) -> Self {
        Self::AssemblyFailed {
            reason: reason.into(),
        }
    }

    /// Create an ArchiveFailed error.
    pub fn archive_failed(reason: impl Into<String>) -> Self {
        Self::ArchiveFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(range: impl Into<String>, total: usize) -> Self {
        Self::InvalidRange {
            range: range.into(),
            total,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Wrap this error with the identity of the page that caused it.
    ///
    /// Already-wrapped errors and cancellations pass through unchanged so
    /// the innermost page context wins.
    pub fn with_page(self, page: u32, file: impl Into<String>) -> Self {
        match self {
            Self::PageFailed { .. } | Self::Cancelled => self,
            other => Self::PageFailed {
                page,
                file: file.into(),
                source: Box::new(other),
            },
        }
    }

    /// Check if this error is recoverable (a retry or different input may succeed).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::FailedToLoadSource { .. }
            | Self::UnsupportedFile { .. }
            | Self::RasterizeFailure { .. }
            | Self::InvalidRange { .. }
            | Self::ExportBusy => true,
            Self::PageFailed { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceFileMissing { .. } | Self::FailedToWrite { .. } | Self::Cancelled
        )
    }

    /// Get the exit code for this error.
    ///
    /// Returns the appropriate process exit code based on error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::UnsupportedFile { .. } => 2,
            Self::FailedToLoadSource { .. } => 3,
            Self::SourceFileMissing { .. } => 3,
            Self::InvalidPageIndex { .. } => 3,
            Self::RasterizeFailure { .. } => 6,
            Self::AssemblyFailed { .. } => 6,
            Self::PageFailed { source, .. } => source.exit_code(),
            Self::ArchiveUnavailable => 6,
            Self::ArchiveFailed { .. } => 6,
            Self::ExportBusy => 4,
            Self::NoPagesSelected => 1,
            Self::InvalidRange { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::FailedToWrite { .. } => 5,
            Self::InvalidConfig { .. } => 1,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
