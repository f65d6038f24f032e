//! Immutable source-file store.
//!
//! Every imported file is kept here as an immutable byte buffer for the
//! lifetime of the session. Page references hold a [`FileId`] into the
//! store rather than owning bytes, so any number of pages can share one
//! source and exports can re-open the original data at full fidelity.
//!
//! Records are never modified after registration; exports treat the byte
//! buffers as read-only shared data.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{PagedeckError, Result};

/// Kind of a stored source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFileKind {
    /// A PDF document (one or more pages).
    Pdf,
    /// A raster image (always a single page).
    Image,
}

/// Opaque handle to a stored source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file #{}", self.0)
    }
}

/// An immutable record of one uploaded source file.
#[derive(Debug, Clone)]
pub struct SourceFileRecord {
    /// Original file name, as uploaded.
    pub name: String,

    /// The file's bytes, immutable once stored.
    pub bytes: Arc<[u8]>,

    /// Whether the file is a PDF or an image.
    pub kind: SourceFileKind,
}

/// Store of imported source files, keyed by [`FileId`].
#[derive(Debug, Default)]
pub struct FileStore {
    records: HashMap<FileId, SourceFileRecord>,
    next_id: u32,
}

impl FileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new source file and return its handle.
    ///
    /// The bytes are copied into the store once; callers keep no ownership.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        kind: SourceFileKind,
    ) -> FileId {
        self.next_id += 1;
        let id = FileId(self.next_id);
        self.records.insert(
            id,
            SourceFileRecord {
                name: name.into(),
                bytes: bytes.into(),
                kind,
            },
        );
        id
    }

    /// Look up a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`PagedeckError::SourceFileMissing`] if no record exists for
    /// the id, which is fatal to the operation that needed it.
    pub fn get(&self, id: FileId) -> Result<&SourceFileRecord> {
        self.records
            .get(&id)
            .ok_or(PagedeckError::SourceFileMissing { file_id: id })
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no files.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records. Only the explicit "clear" action calls this.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_id = 0;
    }
}
