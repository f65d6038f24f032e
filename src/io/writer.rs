//! Persisting export artifacts.
//!
//! The core hands finished bytes plus a suggested name and MIME type to a
//! [`SaveSink`] and does not care whether they end up behind a native save
//! dialog, a download trigger or a plain directory write. The directory
//! sink here writes atomically: bytes land in a temp file that is renamed
//! into place, so a crashed export never leaves a half-written artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PagedeckError, Result};

/// Abstract "persist bytes with a suggested filename and MIME type"
/// capability.
pub trait SaveSink {
    /// Persist `bytes` under (or derived from) `suggested_name`.
    ///
    /// Returns where the bytes ended up, when the sink has a meaningful
    /// location.
    ///
    /// # Errors
    ///
    /// Fails if the artifact cannot be persisted.
    fn persist(&self, bytes: &[u8], suggested_name: &str, mime: &str) -> Result<PathBuf>;
}

/// Save sink writing artifacts into a fixed directory.
#[derive(Debug, Clone)]
pub struct DirectorySaveSink {
    dir: PathBuf,
}

impl DirectorySaveSink {
    /// Create a sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Pre-flight check that the target directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Fails when the directory is missing or read-only.
    pub fn check_writable(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(PagedeckError::invalid_config(format!(
                "Output directory does not exist: {}",
                self.dir.display()
            )));
        }
        let metadata = std::fs::metadata(&self.dir).map_err(|e| PagedeckError::FileNotAccessible {
            path: self.dir.clone(),
            source: e,
        })?;
        if metadata.permissions().readonly() {
            return Err(PagedeckError::invalid_config(format!(
                "Output directory is not writable: {}",
                self.dir.display()
            )));
        }
        Ok(())
    }
}

impl SaveSink for DirectorySaveSink {
    fn persist(&self, bytes: &[u8], suggested_name: &str, mime: &str) -> Result<PathBuf> {
        let final_path = self.dir.join(suggested_name);
        let temp_path = self.dir.join(format!(".{suggested_name}.tmp"));

        write_all(&temp_path, bytes)?;
        std::fs::rename(&temp_path, &final_path).map_err(|e| {
            // Best effort cleanup; the rename error is what matters.
            let _ = std::fs::remove_file(&temp_path);
            PagedeckError::FailedToWrite {
                path: final_path.clone(),
                source: e,
            }
        })?;

        log::info!(
            "saved {} ({} bytes, {mime})",
            final_path.display(),
            bytes.len()
        );
        Ok(final_path)
    }
}

fn write_all(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| PagedeckError::FailedToWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| PagedeckError::FailedToWrite {
            path: path.to_path_buf(),
            source: e,
        })
}
