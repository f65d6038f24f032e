//! Output document construction.
//!
//! [`OutputDocument`] wraps a `lopdf::Document` being built page by page.
//! Vector pages are copied out of their source document together with
//! every object they reference; rasterized pages get a fresh A4 page with
//! the image drawn centered through the shared fit routine.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::collection::Rotation;
use crate::error::{PagedeckError, Result};
use crate::geometry;
use crate::utils::copy_references;

use super::embed::EmbeddedImage;

/// Inheritable page-tree attributes that must be materialized onto a page
/// before it is detached from its source tree.
const INHERITED_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// A PDF document being assembled one page at a time.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    image_count: usize,
}

impl OutputDocument {
    /// Create an empty output document with a catalog and page tree.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Object::Array(Vec::new()),
                "Count" => 0
            }),
        );
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            image_count: 0,
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Copy a vector page out of `source` into this document as-is.
    ///
    /// The page keeps its native content; inherited attributes are
    /// materialized, every referenced object is pulled across, and
    /// `rotation` is combined into the page-level `/Rotate` property.
    ///
    /// # Arguments
    ///
    /// * `source` - the parsed source document
    /// * `page_number` - 1-based page number within `source`
    /// * `rotation` - additional rotation to apply
    ///
    /// # Errors
    ///
    /// Fails if the page does not exist or the source page tree is
    /// malformed.
    pub fn add_copied_page(
        &mut self,
        source: &Document,
        page_number: u32,
        rotation: Rotation,
    ) -> Result<()> {
        // Renumber a working copy past our ids so the two object spaces
        // cannot collide when references are pulled across.
        let mut src = source.clone();
        src.renumber_objects_with(self.doc.max_id + 1);
        self.doc.max_id = src.max_id;

        let pages = src.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            PagedeckError::assembly_failed(format!("page {page_number} not found in source"))
        })?;

        let mut page_dict = src
            .get_dictionary(page_id)
            .map_err(|e| PagedeckError::assembly_failed(format!("invalid page object: {e}")))?
            .clone();

        materialize_inherited(&src, &mut page_dict);
        page_dict.remove(b"Parent");

        // Pull every object the page references into this document.
        let values: Vec<Object> = page_dict.iter().map(|(_, value)| value.clone()).collect();
        for value in &values {
            copy_references(&mut self.doc, &src, value);
        }

        let current = page_dict.get(b"Rotate").and_then(|r| r.as_i64()).unwrap_or(0);
        let combined = (current + rotation.as_degrees()).rem_euclid(360);
        if combined != 0 {
            page_dict.set("Rotate", Object::Integer(combined));
        } else {
            page_dict.remove(b"Rotate");
        }

        page_dict.set("Parent", Object::Reference(self.pages_id));
        self.doc.objects.insert(page_id, Object::Dictionary(page_dict));
        self.append_page(page_id)
    }

    /// Add a new normalized page with `image` drawn on it.
    ///
    /// The page gets the A4 size matching the raster's orientation; the
    /// raster is drawn centered through the shared fit-to-page routine.
    /// Rotation is already baked into the raster by the render step, so no
    /// draw-time rotation is applied here.
    ///
    /// # Errors
    ///
    /// Fails if the content stream cannot be encoded.
    pub fn add_raster_page(&mut self, image: EmbeddedImage) -> Result<()> {
        let (page_w, page_h) =
            geometry::target_page_size(f64::from(image.width), f64::from(image.height));
        let fit = geometry::fit_rect(
            f64::from(image.width),
            f64::from(image.height),
            page_w,
            page_h,
        );

        let image_id = self.doc.add_object(Object::Stream(image.stream));
        let image_name = format!("Im{}", self.image_count);
        self.image_count += 1;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(fit.width as f32),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(fit.height as f32),
                        Object::Real(fit.x as f32),
                        Object::Real(fit.y as f32),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(image_name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PagedeckError::assembly_failed(format!("content encode failed: {e}")))?;
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, encoded)));

        let mut xobjects = Dictionary::new();
        xobjects.set(image_name, Object::Reference(image_id));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(page_w as f32),
                Object::Real(page_h as f32),
            ],
            "Resources" => dictionary! { "XObject" => xobjects },
            "Contents" => content_id
        });
        self.append_page(page_id)
    }

    /// Finish the document and serialize it to bytes.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be serialized.
    pub fn save_to_bytes(mut self) -> Result<Vec<u8>> {
        self.doc.renumber_objects();
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| PagedeckError::assembly_failed(format!("serialize failed: {e}")))?;
        Ok(bytes)
    }

    /// Hand out the assembled document without serializing, for inspection.
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Append a page object to the page tree, bumping the count.
    fn append_page(&mut self, page_id: ObjectId) -> Result<()> {
        let pages = self
            .doc
            .get_object_mut(self.pages_id)
            .map_err(|e| PagedeckError::assembly_failed(format!("missing page tree: {e}")))?;

        let Object::Dictionary(dict) = pages else {
            return Err(PagedeckError::assembly_failed(
                "Pages object is not a dictionary",
            ));
        };

        match dict.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            _ => {
                return Err(PagedeckError::assembly_failed(
                    "Pages dictionary missing Kids array",
                ));
            }
        }

        let count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
        dict.set("Count", Object::Integer(count + 1));
        Ok(())
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy inheritable attributes from ancestor page-tree nodes onto the page
/// dictionary, innermost ancestor first.
fn materialize_inherited(src: &Document, page_dict: &mut Dictionary) {
    let mut parent = page_dict
        .get(b"Parent")
        .ok()
        .and_then(|p| p.as_reference().ok());

    // Depth guard against cyclic Parent chains in malformed documents.
    let mut depth = 0;
    while let Some(parent_id) = parent {
        depth += 1;
        if depth > 32 {
            break;
        }
        let Ok(parent_dict) = src.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITED_KEYS {
            if !page_dict.has(key)
                && let Ok(value) = parent_dict.get(key)
            {
                page_dict.set(key, value.clone());
            }
        }
        parent = parent_dict
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok());
    }
}
