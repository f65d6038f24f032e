//! Archive exports: entry naming, entry content, and the image archive
//! render path.

use std::io::{Cursor, Read};

use lopdf::Document;
use zip::ZipArchive;

use pagedeck::cancel::CancellationToken;
use pagedeck::collection::PageCollection;
use pagedeck::config::{ExportOptions, ExportQuality};
use pagedeck::export::Exporter;
use pagedeck::io::SourceReader;
use pagedeck::progress::NullProgress;
use pagedeck::store::FileStore;

use crate::common::{make_png, pdf_collection};

fn exporter() -> Exporter {
    Exporter::new(ExportOptions {
        quality: ExportQuality::Standard,
        ..Default::default()
    })
}

#[tokio::test]
async fn pdf_archive_three_selected_pages() {
    // Three selected pages produce exactly three entries with zero-padded
    // page numbers and the sanitized source name.
    let (store, mut collection) = pdf_collection("My Scan (final).pdf", 5, 595.0, 842.0);
    collection.select_page(0);
    collection.select_page(2);
    collection.select_page(4);

    let artifact = exporter()
        .export_pdf_archive(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    for expected in [
        "page-001-My_Scan__final_.pdf",
        "page-003-My_Scan__final_.pdf",
        "page-005-My_Scan__final_.pdf",
    ] {
        assert!(archive.by_name(expected).is_ok(), "missing entry {expected}");
    }
}

#[tokio::test]
async fn pdf_archive_entries_are_independent_documents() {
    let (store, mut collection) = pdf_collection("doc.pdf", 3, 595.0, 842.0);
    collection.select_all();

    let artifact = exporter()
        .export_pdf_archive(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    for i in 0..archive.len() {
        let mut bytes = Vec::new();
        archive.by_index(i).unwrap().read_to_end(&mut bytes).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1, "entry {i} is a one-page document");
    }
}

#[tokio::test]
async fn image_archive_renders_imported_images() {
    // Import two images from disk; the image archive renders each at the
    // export scale and stores decodable PNG entries.
    let dir = tempfile::TempDir::new().unwrap();
    let first = dir.path().join("photo one.png");
    let second = dir.path().join("photo_two.png");
    std::fs::write(&first, make_png(100, 60)).unwrap();
    std::fs::write(&second, make_png(40, 80)).unwrap();

    let mut store = FileStore::new();
    let mut collection = PageCollection::new();
    SourceReader::new()
        .import_files(
            &[first, second],
            &mut store,
            &mut collection,
            &NullProgress,
        )
        .await
        .unwrap();
    collection.select_all();

    let artifact = exporter()
        .export_image_archive(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert!(artifact.suggested_name.starts_with("pages-images-"));
    let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
    assert_eq!(archive.len(), 2);

    let mut bytes = Vec::new();
    archive
        .by_name("page-001-photo_one.png")
        .unwrap()
        .read_to_end(&mut bytes)
        .unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    // Rendered at 3x native size.
    assert_eq!(decoded.width(), 300);
    assert_eq!(decoded.height(), 180);

    // Images are single-page sources, so both entries carry page 001.
    assert!(archive.by_name("page-001-photo_two.png").is_ok());
}

#[tokio::test]
async fn archive_names_carry_flattened_timestamp() {
    let (store, mut collection) = pdf_collection("doc.pdf", 1, 595.0, 842.0);
    collection.select_all();

    let artifact = exporter()
        .export_pdf_archive(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let name = &artifact.suggested_name;
    assert!(name.starts_with("pages-pdf-"));
    assert!(name.ends_with(".zip"));
    assert!(!name.contains(':'));
    assert!(!name.contains('T'));
    // Timestamp shape: pages-pdf-YYYY-MM-DD-HH-MM-SS.zip
    let stamp = name
        .trim_start_matches("pages-pdf-")
        .trim_end_matches(".zip");
    assert_eq!(stamp.split('-').count(), 6);
}
