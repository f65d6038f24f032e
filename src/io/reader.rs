//! Source file import.
//!
//! Importing reads each input file once, registers its immutable bytes in
//! the [`FileStore`] and appends one [`PageRef`] per page to the working
//! collection. PDF pages arrive without a renderer (rasterization is an
//! external capability); images decode in-crate and carry their own
//! render handle.
//!
//! File bytes are read concurrently, but pages are appended strictly in
//! input order so the working document matches what the user handed over.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use lopdf::Document;

use crate::collection::{PageCollection, PageRef};
use crate::error::{PagedeckError, Result};
use crate::progress::{IMPORT_WINDOW, ProgressSink, ProgressWindow};
use crate::raster::{ImagePage, RenderHandle};
use crate::store::{FileStore, SourceFileKind};

/// How many files are read from disk concurrently.
const READ_CONCURRENCY: usize = 4;

/// Result of one import operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of files imported.
    pub files: usize,

    /// Number of pages appended to the collection.
    pub pages: usize,
}

/// Imports source files into a store and collection.
#[derive(Debug, Clone, Default)]
pub struct SourceReader;

impl SourceReader {
    /// Create a reader with default settings.
    pub fn new() -> Self {
        Self
    }

    /// Import files, appending their pages to `collection`.
    ///
    /// Files are processed in the order given; a PDF contributes one page
    /// reference per source page, an image exactly one. Progress reports
    /// run 0-20 while bytes load and 20-95 while pages are registered.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable, unsupported or unparsable file; the
    /// store and collection keep whatever was imported before the failure.
    pub async fn import_files(
        &self,
        paths: &[PathBuf],
        store: &mut FileStore,
        collection: &mut PageCollection,
        sink: &dyn ProgressSink,
    ) -> Result<ImportSummary> {
        let load_window = ProgressWindow::new(0, IMPORT_WINDOW.start());

        // Read every file's bytes, a few at a time, keeping input order.
        let reads = stream::iter(paths.iter().cloned().map(|path| async move {
            let kind = detect_kind(&path)?;
            let bytes = read_file(&path).await?;
            Ok::<_, PagedeckError>((path, kind, bytes))
        }))
        .buffered(READ_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

        let mut loaded = Vec::with_capacity(reads.len());
        for (done, read) in reads.into_iter().enumerate() {
            loaded.push(read?);
            sink.report(
                load_window.at(done + 1, paths.len()),
                "Loading",
                done + 1,
                paths.len(),
            );
        }

        // Parse PDFs once to know the total page count up front.
        let mut parsed = Vec::with_capacity(loaded.len());
        let mut total_pages = 0usize;
        for (path, kind, bytes) in loaded {
            let pages = match kind {
                SourceFileKind::Pdf => {
                    let document = Document::load_mem(&bytes).map_err(|e| {
                        PagedeckError::failed_to_load_source(path.clone(), e.to_string())
                    })?;
                    let count = document.get_pages().len();
                    if count == 0 {
                        return Err(PagedeckError::failed_to_load_source(
                            path,
                            "PDF has no pages",
                        ));
                    }
                    count
                }
                SourceFileKind::Image => 1,
            };
            total_pages += pages;
            parsed.push((path, kind, bytes, pages));
        }

        // Register files and append page references in input order.
        let mut files = 0usize;
        let mut appended = 0usize;
        for (path, kind, bytes, pages) in parsed {
            let name = file_name(&path);
            match kind {
                SourceFileKind::Pdf => {
                    let file_id = store.register(&name, bytes, SourceFileKind::Pdf);
                    for page_number in 1..=pages as u32 {
                        collection.push_pages([PageRef::pdf_page(file_id, page_number, &name)]);
                        appended += 1;
                        sink.report(
                            IMPORT_WINDOW.at(appended, total_pages),
                            "Importing",
                            appended,
                            total_pages,
                        );
                    }
                }
                SourceFileKind::Image => {
                    let image = ImagePage::decode(&bytes).map_err(|e| {
                        PagedeckError::failed_to_load_source(path.clone(), e.to_string())
                    })?;
                    let file_id = store.register(&name, bytes, SourceFileKind::Image);
                    collection.push_pages([PageRef::image(
                        file_id,
                        &name,
                        RenderHandle::new(image),
                    )]);
                    appended += 1;
                    sink.report(
                        IMPORT_WINDOW.at(appended, total_pages),
                        "Importing",
                        appended,
                        total_pages,
                    );
                }
            }
            files += 1;
            log::info!("imported '{name}' ({pages} page(s))");
        }

        sink.report(100, "Done", appended, total_pages);
        Ok(ImportSummary {
            files,
            pages: appended,
        })
    }
}

/// Read a file fully, mapping I/O failures to import errors.
async fn read_file(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PagedeckError::file_not_found(path.to_path_buf()))
        }
        Err(e) => Err(PagedeckError::FileNotAccessible {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Determine a file's kind from its extension.
fn detect_kind(path: &Path) -> Result<SourceFileKind> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(SourceFileKind::Pdf),
        "png" | "jpg" | "jpeg" | "gif" | "webp" => Ok(SourceFileKind::Image),
        _ => Err(PagedeckError::unsupported_file(path.to_path_buf())),
    }
}

/// The display name of a path, falling back to its full text.
fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
