//! Shared helpers for pagedeck integration tests.
//!
//! Source documents are built synthetically with lopdf so no binary
//! fixtures are needed.

use image::RgbImage;
use lopdf::{Document, Object, Stream, dictionary};
use pagedeck::Rotation;
use pagedeck::collection::{PageCollection, PageRef};
use pagedeck::raster::{RenderHandle, RenderSource, encode_png};
use pagedeck::store::{FileStore, SourceFileKind};

/// Serialize a synthetic PDF with `pages` blank pages of the given size.
pub fn make_pdf(pages: usize, width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            b"0 0 m".to_vec(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(width),
                Object::Real(height),
            ],
            "Contents" => content_id
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture serializes");
    bytes
}

/// PNG bytes of a solid-color image.
pub fn make_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&RgbImage::new(width, height)).expect("png encodes")
}

/// A render source producing solid rasters of a fixed native size.
pub struct SolidSource {
    pub width: u32,
    pub height: u32,
}

impl RenderSource for SolidSource {
    fn native_size(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }

    fn render(&self, scale: f64, rotation: Rotation) -> pagedeck::Result<RgbImage> {
        let w = ((f64::from(self.width) * scale).round() as u32).max(1);
        let h = ((f64::from(self.height) * scale).round() as u32).max(1);
        let (w, h) = match rotation {
            Rotation::Clockwise90 | Rotation::Clockwise270 => (h, w),
            _ => (w, h),
        };
        Ok(RgbImage::from_pixel(w, h, image::Rgb([128, 128, 128])))
    }
}

/// A handle over a [`SolidSource`].
pub fn solid_handle(width: u32, height: u32) -> RenderHandle {
    RenderHandle::new(SolidSource { width, height })
}

/// Register one synthetic PDF and build a collection over its pages.
pub fn pdf_collection(name: &str, pages: usize, width: f32, height: f32) -> (FileStore, PageCollection) {
    let mut store = FileStore::new();
    let file = store.register(name, make_pdf(pages, width, height), SourceFileKind::Pdf);

    let mut collection = PageCollection::new();
    collection.push_pages((1..=pages as u32).map(|p| PageRef::pdf_page(file, p, name)));
    (store, collection)
}

/// Whether a document contains an image XObject anywhere.
pub fn has_image_xobject(doc: &Document) -> bool {
    doc.objects.values().any(|obj| {
        let Object::Stream(stream) = obj else {
            return false;
        };
        stream
            .dict
            .get(b"Subtype")
            .and_then(|s| s.as_name())
            .map(|name| name == b"Image")
            .unwrap_or(false)
    })
}
