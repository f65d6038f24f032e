//! pagedeck - reorder, rotate, delete, split and export pages.
//!
//! This library is the core of a desktop page organizer: it takes
//! heterogeneous source pages (PDF pages of arbitrary size and
//! orientation, raster images of arbitrary dimensions) and produces
//! consistent, reflowed output documents. It provides:
//!
//! - An ordered page collection with a selection set that survives every
//!   mutation (delete, rotate, multi-select block moves)
//! - Geometry normalization to A4 with a centered fit-to-page transform
//! - A rasterizer adapter with scale clamping and bounded PNG encoding
//! - A document assembler that copies in-tolerance vector pages as-is and
//!   rasterizes everything else
//! - Per-page archive export (PDF or PNG entries in a ZIP)
//! - Cooperative cancellation and serialized exports
//!
//! # Examples
//!
//! ## Import, reorder, export
//!
//! ```no_run
//! use pagedeck::cancel::CancellationToken;
//! use pagedeck::collection::PageCollection;
//! use pagedeck::config::ExportOptions;
//! use pagedeck::export::Exporter;
//! use pagedeck::io::SourceReader;
//! use pagedeck::progress::NullProgress;
//! use pagedeck::store::FileStore;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = FileStore::new();
//! let mut collection = PageCollection::new();
//!
//! let reader = SourceReader::new();
//! let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("photo.png")];
//! reader
//!     .import_files(&inputs, &mut store, &mut collection, &NullProgress)
//!     .await?;
//!
//! // Move the photo to the front and export everything.
//! let last = collection.len() - 1;
//! collection.move_block(&[last], 0);
//! collection.select_all();
//!
//! let exporter = Exporter::new(ExportOptions::default());
//! let artifact = exporter
//!     .export_document(&collection, &store, &NullProgress, &CancellationToken::new())
//!     .await?;
//! println!("{} ({} bytes)", artifact.suggested_name, artifact.bytes.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assemble;
pub mod cancel;
pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod io;
pub mod progress;
pub mod raster;
pub mod store;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use collection::{PageCollection, PageRef, Rotation, SourceKind};
pub use error::{PagedeckError, Result};
pub use store::{FileId, FileStore, SourceFileKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
