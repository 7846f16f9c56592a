//! Document handling shared by the PDF operations
//!
//! Thin layer over lopdf that maps open/save failures onto the library's
//! error taxonomy and answers geometry questions about pages.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::layout::{PageBox, PageFrame};

/// Page attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic Parent links in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Load a PDF, reporting any failure as [`Error::DocumentOpen`]
pub fn open_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::open(path, "file not found"));
    }

    let doc = Document::load(path).map_err(|e| Error::open(path, e))?;
    debug!(path = %path.display(), pages = doc.get_pages().len(), "opened document");
    Ok(doc)
}

/// Compress and write a document, reporting any failure as [`Error::DocumentSave`]
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    doc.compress();
    doc.save(path).map_err(|e| Error::save(path, e))?;
    debug!(path = %path.display(), "saved document");
    Ok(())
}

/// Count the pages of a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = open_document(path)?;
    Ok(doc.get_pages().len())
}

/// Page object IDs in page order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Look up a page attribute, following Parent links for inherited values
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Resolve an indirect reference to the object it points at
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// A rectangle attribute (MediaBox, CropBox, ...) of the page, inherited if
/// need be
fn inherited_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<PageBox> {
    let rect = inherited_attribute(doc, page_id, key)?;

    let corners: Vec<f32> = resolve(doc, &rect)?
        .as_array()
        .ok()?
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(|v| v.as_float().ok()))
        .collect();

    match corners.as_slice() {
        [x0, y0, x1, y1] => Some(PageBox::from_corners(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

/// The page's MediaBox, or US Letter when the page tree does not define one
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    inherited_box(doc, page_id, b"MediaBox").unwrap_or_else(|| {
        debug!(?page_id, "page has no usable MediaBox, assuming Letter");
        PageBox::letter()
    })
}

/// The page as a viewer shows it: the CropBox clipped to the MediaBox
/// (MediaBox alone when there is no usable CropBox), turned by `/Rotate`
pub fn page_frame(doc: &Document, page_id: ObjectId) -> PageFrame {
    let media = page_box(doc, page_id);
    let visible = inherited_box(doc, page_id, b"CropBox")
        .and_then(|crop| crop.intersect(&media))
        .unwrap_or(media);

    let rotate = inherited_attribute(doc, page_id, b"Rotate")
        .as_ref()
        .and_then(|object| resolve(doc, object))
        .and_then(|object| object.as_i64().ok())
        .unwrap_or(0);

    PageFrame::new(visible, rotate)
}
