//! End-to-end export: vector round-trips, normalization geometry, split,
//! and the full import-reorder-export path through the save sink.

use lopdf::Document;
use lopdf::content::Content;

use pagedeck::cancel::CancellationToken;
use pagedeck::collection::PageCollection;
use pagedeck::config::{ExportOptions, ExportQuality, SplitRange};
use pagedeck::export::Exporter;
use pagedeck::io::{DirectorySaveSink, SaveSink, SourceReader};
use pagedeck::progress::NullProgress;
use pagedeck::store::FileStore;

use crate::common::{has_image_xobject, make_pdf, make_png, pdf_collection, solid_handle};

fn exporter() -> Exporter {
    Exporter::new(ExportOptions {
        quality: ExportQuality::Standard,
        ..Default::default()
    })
}

#[tokio::test]
async fn in_tolerance_page_round_trips_as_vector() {
    // A source page within 10pt of A4 must keep its vector content: one
    // output page, no raster image object anywhere in the document.
    let (store, mut collection) = pdf_collection("near-a4.pdf", 1, 600.0, 848.0);
    collection.select_all();

    let artifact = exporter()
        .export_document(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    assert!(!has_image_xobject(&doc));
}

#[tokio::test]
async fn oversized_landscape_page_normalizes_to_a4() {
    // 1400x800 is far outside tolerance: the output page must be 842x595
    // with the raster drawn fit-to-width (802pt wide) and centered.
    let (store, mut collection) = pdf_collection("wide.pdf", 1, 1400.0, 800.0);
    collection
        .page_mut(0)
        .unwrap()
        .attach_render_handle(solid_handle(1400, 800));
    collection.select_all();

    let artifact = exporter()
        .export_document(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let mut doc = Document::load_mem(&artifact.bytes).unwrap();
    doc.decompress();
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();

    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_float().unwrap(), 842.0);
    assert_eq!(media_box[3].as_float().unwrap(), 595.0);
    assert!(has_image_xobject(&doc));

    // Decode the content stream and inspect the draw matrix.
    let content_bytes = doc.get_page_content(page_id).unwrap();
    let content = Content::decode(&content_bytes).unwrap();
    let cm = content
        .operations
        .iter()
        .find(|op| op.operator == "cm")
        .expect("draw matrix present");

    let operand = |i: usize| cm.operands[i].as_float().unwrap();
    let draw_width = operand(0);
    let draw_height = operand(3);
    let x = operand(4);
    let y = operand(5);

    assert!((draw_width - 802.0).abs() < 0.5, "fit-to-width: {draw_width}");
    let expected_height = 802.0 * 800.0 / 1400.0;
    assert!((f64::from(draw_height) - expected_height).abs() < 1.0);
    assert!((x - 20.0).abs() < 0.5, "centered horizontally: {x}");
    let expected_y = (595.0 - expected_height) / 2.0;
    assert!((f64::from(y) - expected_y).abs() < 1.0, "centered vertically: {y}");
}

#[tokio::test]
async fn rotation_survives_vector_copy() {
    let (store, mut collection) = pdf_collection("doc.pdf", 2, 595.0, 842.0);
    collection.rotate_page(1);
    collection.select_all();

    let artifact = exporter()
        .export_document(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    let pages: Vec<_> = doc.get_pages().into_values().collect();

    let first = doc.get_dictionary(pages[0]).unwrap();
    assert!(first.get(b"Rotate").is_err());

    let second = doc.get_dictionary(pages[1]).unwrap();
    assert_eq!(second.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
}

#[tokio::test]
async fn reorder_changes_export_order() {
    // Two sources with distinguishable page sizes, reordered before export.
    let mut store = FileStore::new();
    let a = store.register(
        "a.pdf",
        make_pdf(1, 500.0, 700.0),
        pagedeck::SourceFileKind::Pdf,
    );
    let b = store.register(
        "b.pdf",
        make_pdf(1, 450.0, 650.0),
        pagedeck::SourceFileKind::Pdf,
    );

    let mut collection = PageCollection::new();
    collection.push_pages([
        pagedeck::PageRef::pdf_page(a, 1, "a.pdf"),
        pagedeck::PageRef::pdf_page(b, 1, "b.pdf"),
    ]);
    // Out-of-tolerance sizes would rasterize; attach renderers.
    collection.page_mut(0).unwrap().attach_render_handle(solid_handle(500, 700));
    collection.page_mut(1).unwrap().attach_render_handle(solid_handle(450, 650));

    // Move b's page first, then export everything.
    collection.move_block(&[1], 0);
    collection.select_all();

    let artifact = exporter()
        .export_document(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn split_range_exports_working_order_slice() {
    let (store, collection) = pdf_collection("doc.pdf", 5, 595.0, 842.0);

    let artifact = exporter()
        .split_range(
            &collection,
            &store,
            SplitRange { start: 2, end: 4 },
            &NullProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(artifact.suggested_name, "split_2-4.pdf");
    let doc = Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
}

#[tokio::test]
async fn full_pipeline_from_files_to_saved_artifact() {
    // Import real files from disk, reorder, export, persist via the sink.
    let dir = tempfile::TempDir::new().unwrap();
    let pdf_path = dir.path().join("doc.pdf");
    let png_path = dir.path().join("photo.png");
    std::fs::write(&pdf_path, make_pdf(2, 595.0, 842.0)).unwrap();
    std::fs::write(&png_path, make_png(300, 400)).unwrap();

    let mut store = FileStore::new();
    let mut collection = PageCollection::new();
    SourceReader::new()
        .import_files(
            &[pdf_path, png_path],
            &mut store,
            &mut collection,
            &NullProgress,
        )
        .await
        .unwrap();
    assert_eq!(collection.len(), 3);

    // Photo to the front.
    collection.move_block(&[2], 0);
    collection.select_all();

    let artifact = exporter()
        .export_document(&collection, &store, &NullProgress, &CancellationToken::new())
        .await
        .unwrap();

    let out_dir = tempfile::TempDir::new().unwrap();
    let sink = DirectorySaveSink::new(out_dir.path());
    let saved = sink
        .persist(&artifact.bytes, &artifact.suggested_name, artifact.mime)
        .unwrap();

    let doc = Document::load_mem(&std::fs::read(&saved).unwrap()).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    // The image page became a raster page in the output.
    assert!(has_image_xobject(&doc));
}
