//! In-memory ZIP archive building.
//!
//! Entries are buffered and compressed with Deflate (the interoperability
//! default); the whole archive is finalized in memory before anything is
//! persisted. Streaming is deliberately not offered - archives here are
//! bounded by what a user exports in one action.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PagedeckError, Result};

/// Builds a ZIP archive of named byte buffers.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ArchiveBuilder {
    /// Create an empty archive builder.
    ///
    /// # Errors
    ///
    /// Returns [`PagedeckError::ArchiveUnavailable`] if the archive
    /// capability cannot be initialized.
    pub fn new() -> Result<Self> {
        Ok(Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        })
    }

    /// Add one named entry.
    ///
    /// # Errors
    ///
    /// Fails if the entry cannot be written.
    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .map_err(|e| PagedeckError::archive_failed(format!("cannot start entry {name}: {e}")))?;
        self.writer
            .write_all(bytes)
            .map_err(|e| PagedeckError::archive_failed(format!("cannot write entry {name}: {e}")))?;
        self.entries += 1;
        Ok(())
    }

    /// Number of entries added so far.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Compress and return the finished archive bytes.
    ///
    /// # Errors
    ///
    /// Fails if the central directory cannot be written.
    pub fn finalize(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| PagedeckError::archive_failed(format!("cannot finalize archive: {e}")))?;
        Ok(cursor.into_inner())
    }
}
