//! Export orchestration.
//!
//! The [`Exporter`] turns the working collection into output artifacts:
//! one combined PDF, per-page PDF or PNG archives, or a split of a page
//! range. Exports against one exporter are serialized by an explicit busy
//! flag - a second request while one runs fails with
//! [`PagedeckError::ExportBusy`] instead of racing the first.

pub mod archive;
pub mod naming;

pub use archive::ArchiveBuilder;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::assemble::DocumentAssembler;
use crate::cancel::CancellationToken;
use crate::collection::PageCollection;
use crate::config::{ExportOptions, SplitRange};
use crate::error::{PagedeckError, Result};
use crate::progress::{ARCHIVE_WINDOW, ProgressSink};
use crate::store::FileStore;

/// MIME type for PDF artifacts.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type for ZIP artifacts.
pub const ZIP_MIME: &str = "application/zip";

/// A finished export: bytes plus the metadata a save sink needs.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// The serialized output.
    pub bytes: Vec<u8>,

    /// Suggested file name, per the output naming convention.
    pub suggested_name: String,

    /// MIME type of the bytes.
    pub mime: &'static str,
}

/// Runs export operations over a page collection.
pub struct Exporter {
    options: ExportOptions,
    busy: AtomicBool,
}

/// Clears the busy flag when an export finishes, even on error.
struct ExportGuard<'a>(&'a AtomicBool);

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Exporter {
    /// Create an exporter with the given options.
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            busy: AtomicBool::new(false),
        }
    }

    /// Whether an export is currently running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the busy flag for the duration of one export.
    fn begin(&self) -> Result<ExportGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PagedeckError::ExportBusy)?;
        Ok(ExportGuard(&self.busy))
    }

    /// Export the selected pages as one combined PDF.
    ///
    /// Pages are assembled in ascending index order; progress runs 10-90
    /// while pages are added, 95 while finalizing, 100 on completion.
    ///
    /// # Errors
    ///
    /// Fails with [`PagedeckError::NoPagesSelected`] when nothing is
    /// selected, [`PagedeckError::ExportBusy`] when another export runs,
    /// or a page-wrapped error from assembly.
    pub async fn export_document(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let _guard = self.begin()?;

        let selected = collection.selected_indices();
        if selected.is_empty() {
            return Err(PagedeckError::NoPagesSelected);
        }

        let assembler = DocumentAssembler::new(self.options.quality);
        let bytes = assembler
            .assemble(collection, store, &selected, sink, cancel)
            .await?;

        Ok(ExportArtifact {
            bytes,
            suggested_name: naming::document_file_name(),
            mime: PDF_MIME,
        })
    }

    /// Export every page regardless of selection, timestamped.
    ///
    /// # Errors
    ///
    /// As for [`Self::export_document`]; an empty collection fails with
    /// [`PagedeckError::NoPagesSelected`].
    pub async fn export_full_document(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let _guard = self.begin()?;

        if collection.is_empty() {
            return Err(PagedeckError::NoPagesSelected);
        }
        let all: Vec<usize> = (0..collection.len()).collect();

        let assembler = DocumentAssembler::new(self.options.quality);
        let bytes = assembler
            .assemble(collection, store, &all, sink, cancel)
            .await?;

        Ok(ExportArtifact {
            bytes,
            suggested_name: naming::full_document_file_name(),
            mime: PDF_MIME,
        })
    }

    /// Export each selected page as an independent single-page PDF inside
    /// a ZIP archive.
    ///
    /// Entries are named `page-<NNN>-<sanitized source>.pdf`. Progress
    /// runs 0-80 over the pages, 90 while compressing, 100 on completion.
    /// One failing page aborts the whole archive.
    pub async fn export_pdf_archive(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let _guard = self.begin()?;

        let selected = collection.selected_indices();
        if selected.is_empty() {
            return Err(PagedeckError::NoPagesSelected);
        }

        let assembler = DocumentAssembler::new(self.options.quality);
        let mut archive = ArchiveBuilder::new()?;
        let total = selected.len();

        sink.report(ARCHIVE_WINDOW.start(), "Exporting pages", 0, total);
        for (done, &index) in selected.iter().enumerate() {
            cancel.check()?;

            let page = collection
                .page(index)
                .ok_or(PagedeckError::NoPagesSelected)?;
            let bytes = assembler.assemble_single(collection, store, index).await?;
            let name = naming::page_file_name(page.source_page_number, &page.source_name, "pdf");
            archive.add_entry(&name, &bytes)?;

            sink.report(
                ARCHIVE_WINDOW.at(done + 1, total),
                "Exporting pages",
                done + 1,
                total,
            );
        }

        sink.report(90, "Compressing", total, total);
        let bytes = archive.finalize()?;
        sink.report(100, "Done", total, total);

        Ok(ExportArtifact {
            bytes,
            suggested_name: naming::archive_file_name("pages-pdf"),
            mime: ZIP_MIME,
        })
    }

    /// Export each selected page as a PNG inside a ZIP archive.
    ///
    /// Entries are named `page-<NNN>-<sanitized source>.png`; every page
    /// goes through the rasterizer regardless of source kind, so each
    /// needs a render handle. Progress windows match the PDF archive.
    pub async fn export_image_archive(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let _guard = self.begin()?;

        let selected = collection.selected_indices();
        if selected.is_empty() {
            return Err(PagedeckError::NoPagesSelected);
        }

        let assembler = DocumentAssembler::new(self.options.quality);
        let mut archive = ArchiveBuilder::new()?;
        let total = selected.len();

        sink.report(ARCHIVE_WINDOW.start(), "Rendering pages", 0, total);
        for (done, &index) in selected.iter().enumerate() {
            cancel.check()?;

            let page = collection
                .page(index)
                .ok_or(PagedeckError::NoPagesSelected)?;
            // The store record must exist even though pixels come from the
            // render handle.
            store.get(page.source_file)?;

            let png = assembler.rasterize_page(page).await?;
            let name = naming::page_file_name(page.source_page_number, &page.source_name, "png");
            archive.add_entry(&name, &png)?;

            sink.report(
                ARCHIVE_WINDOW.at(done + 1, total),
                "Rendering pages",
                done + 1,
                total,
            );
        }

        sink.report(90, "Compressing", total, total);
        let bytes = archive.finalize()?;
        sink.report(100, "Done", total, total);

        Ok(ExportArtifact {
            bytes,
            suggested_name: naming::archive_file_name("pages-images"),
            mime: ZIP_MIME,
        })
    }

    /// Export a 1-based inclusive page range of the working document as
    /// one PDF.
    ///
    /// The range is taken over the working collection order, not the
    /// original source files, and is assembled exactly like any other
    /// document export.
    ///
    /// # Errors
    ///
    /// Fails with [`PagedeckError::InvalidRange`] when the range does not
    /// fit the collection.
    pub async fn split_range(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        range: SplitRange,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExportArtifact> {
        let _guard = self.begin()?;

        range.validate(collection.len())?;
        let subset = range.to_indices();

        let assembler = DocumentAssembler::new(self.options.quality);
        let bytes = assembler
            .assemble(collection, store, &subset, sink, cancel)
            .await?;

        Ok(ExportArtifact {
            bytes,
            suggested_name: naming::split_file_name(range.start, range.end),
            mime: PDF_MIME,
        })
    }
}
