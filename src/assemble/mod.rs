//! Document assembly.
//!
//! The assembler walks page references in ascending order and builds an
//! output document: vector PDF pages within size tolerance are copied
//! as-is, everything else (oversized vector pages, images) is rasterized
//! and re-embedded centered on a fresh A4 page. One page failing aborts
//! the whole document; no page is ever silently dropped.

pub mod builder;
pub mod embed;

pub use builder::OutputDocument;
pub use embed::{EmbeddedImage, embed_jpeg, embed_png, embed_raster, embed_rgb};

use std::collections::HashMap;
use std::path::PathBuf;

use lopdf::Document;

use crate::cancel::CancellationToken;
use crate::collection::{PageCollection, PageRef, SourceKind};
use crate::config::ExportQuality;
use crate::error::{PagedeckError, Result};
use crate::geometry;
use crate::progress::{DOCUMENT_WINDOW, ProgressSink};
use crate::raster::Rasterizer;
use crate::store::{FileId, FileStore};

/// Parsed source documents, loaded once per assembly run.
struct SourceCache {
    documents: HashMap<FileId, Document>,
}

impl SourceCache {
    fn new() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    /// Parse (or reuse) the source document for a file id.
    fn load(&mut self, store: &FileStore, id: FileId) -> Result<&Document> {
        if !self.documents.contains_key(&id) {
            let record = store.get(id)?;
            let document = Document::load_mem(&record.bytes).map_err(|e| {
                PagedeckError::failed_to_load_source(PathBuf::from(&record.name), e.to_string())
            })?;
            self.documents.insert(id, document);
        }
        Ok(self.documents.get(&id).expect("document just inserted"))
    }
}

/// Assembles output documents from page references.
pub struct DocumentAssembler {
    rasterizer: Rasterizer,
    quality: ExportQuality,
}

impl DocumentAssembler {
    /// Create an assembler rasterizing at the given quality tier.
    pub fn new(quality: ExportQuality) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            quality,
        }
    }

    /// Create an assembler with a custom rasterizer policy.
    pub fn with_rasterizer(quality: ExportQuality, rasterizer: Rasterizer) -> Self {
        Self { rasterizer, quality }
    }

    /// Assemble the pages at `subset` into one document and serialize it.
    ///
    /// Pages are processed in ascending index order regardless of the
    /// order given. Progress is reported into the document window (10-90)
    /// while pages are added, at 95 while finalizing and 100 on
    /// completion. The cancellation token is checked between pages.
    ///
    /// # Errors
    ///
    /// Fails with [`PagedeckError::NoPagesSelected`] for an empty subset,
    /// [`PagedeckError::Cancelled`] when cancelled, or a page-wrapped
    /// error when any single page fails to copy or rasterize.
    pub async fn assemble(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        subset: &[usize],
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut indices: Vec<usize> = subset
            .iter()
            .copied()
            .filter(|&i| i < collection.len())
            .collect();
        indices.sort_unstable();
        indices.dedup();

        if indices.is_empty() {
            return Err(PagedeckError::NoPagesSelected);
        }

        let total = indices.len();
        sink.report(DOCUMENT_WINDOW.start(), "Assembling", 0, total);

        let mut sources = SourceCache::new();
        let mut output = OutputDocument::new();

        for (done, &index) in indices.iter().enumerate() {
            cancel.check()?;

            let page = collection.page(index).expect("index bounds checked");
            self.add_page(&mut output, page, store, &mut sources)
                .await
                .map_err(|e| e.with_page(page.source_page_number, &page.source_name))?;

            sink.report(DOCUMENT_WINDOW.at(done + 1, total), "Assembling", done + 1, total);
        }

        sink.report(95, "Finalizing", total, total);
        let bytes = output.save_to_bytes()?;
        sink.report(100, "Done", total, total);
        Ok(bytes)
    }

    /// Assemble one page into an independent single-page document.
    ///
    /// Used by the archive exporter, which drives this once per selected
    /// page and handles progress and cancellation itself.
    ///
    /// # Errors
    ///
    /// Fails with a page-wrapped error when the page cannot be copied or
    /// rasterized.
    pub async fn assemble_single(
        &self,
        collection: &PageCollection,
        store: &FileStore,
        index: usize,
    ) -> Result<Vec<u8>> {
        let page = collection
            .page(index)
            .ok_or_else(|| PagedeckError::other(format!("page index {index} out of range")))?;

        let mut sources = SourceCache::new();
        let mut output = OutputDocument::new();
        self.add_page(&mut output, page, store, &mut sources)
            .await
            .map_err(|e| e.with_page(page.source_page_number, &page.source_name))?;
        output.save_to_bytes()
    }

    /// Rasterize one page to PNG bytes at this assembler's quality tier.
    ///
    /// Used by the image-archive exporter; the 16384 px ceiling and the
    /// encode bound apply as for embedded rasters.
    pub async fn rasterize_page(&self, page: &PageRef) -> Result<Vec<u8>> {
        let handle = page.render_handle().ok_or_else(|| {
            PagedeckError::rasterize_failure("no rasterizer attached to page")
                .with_page(page.source_page_number, &page.source_name)
        })?;
        self.rasterizer
            .rasterize(handle, self.quality.scale(), page.rotation())
            .await
            .map_err(|e| e.with_page(page.source_page_number, &page.source_name))
    }

    /// Add one page to the output, deciding between vector copy and
    /// rasterization.
    async fn add_page(
        &self,
        output: &mut OutputDocument,
        page: &PageRef,
        store: &FileStore,
        sources: &mut SourceCache,
    ) -> Result<()> {
        match page.source_kind {
            SourceKind::PdfPage => {
                let document = sources.load(store, page.source_file)?;
                let pages = document.get_pages();
                let total = pages.len();
                let number = page.source_page_number;
                let Some(&page_id) = pages.get(&number) else {
                    return Err(PagedeckError::invalid_page_index(
                        number,
                        total,
                        &page.source_name,
                    ));
                };

                let (width, height) = page_media_size(document, page_id).ok_or_else(|| {
                    PagedeckError::assembly_failed("source page has no MediaBox")
                })?;

                if !geometry::needs_normalization(width, height) {
                    output.add_copied_page(document, number, page.rotation())
                } else {
                    log::debug!(
                        "page {number} of '{}' is {width}x{height}, rasterizing to normalize",
                        page.source_name
                    );
                    let handle = page.render_handle().ok_or_else(|| {
                        PagedeckError::rasterize_failure(
                            "page needs normalization but no rasterizer is attached",
                        )
                    })?;
                    let png = self
                        .rasterizer
                        .rasterize(handle, self.quality.scale(), page.rotation())
                        .await?;
                    output.add_raster_page(embed_raster(&png)?)
                }
            }
            SourceKind::Image => {
                // The record must still exist even though pixels come from
                // the render handle; a dangling id is a fatal store error.
                store.get(page.source_file)?;

                let handle = page.render_handle().ok_or_else(|| {
                    PagedeckError::rasterize_failure("no rasterizer attached to image page")
                })?;
                let png = self
                    .rasterizer
                    .rasterize(handle, self.quality.scale(), page.rotation())
                    .await?;
                output.add_raster_page(embed_raster(&png)?)
            }
        }
    }
}

/// Effective media size of a page, following inherited attributes.
fn page_media_size(document: &Document, page_id: lopdf::ObjectId) -> Option<(f64, f64)> {
    let mut current = document.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(media_box) = current.get(b"MediaBox") {
            let array = media_box.as_array().ok()?;
            if array.len() < 4 {
                return None;
            }
            let coord = |i: usize| array[i].as_float().map(f64::from).ok();
            let (x0, y0, x1, y1) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);
            return Some(((x1 - x0).abs(), (y1 - y0).abs()));
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = document.get_dictionary(parent_id).ok()?;
    }
    None
}
