//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::path::PathBuf;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pdf::document::{inherited_attribute, open_document, page_ids, save_document, INHERITABLE_KEYS};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge PDF files into a single PDF, returning the merged page count
///
/// Pages appear in input order: every page of the first file, then every page
/// of the second, and so on. Page content is carried over untouched. All
/// inputs are loaded before anything is written, so an unreadable input
/// leaves the destination alone.
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use pdf_tools::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![PathBuf::from("first.pdf"), PathBuf::from("second.pdf")],
///     output_path: PathBuf::from("merged.pdf"),
/// };
///
/// let pages = merge_pdfs(&options).expect("Failed to merge");
/// println!("{pages} pages");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<usize> {
    if options.input_paths.is_empty() {
        return Err(Error::MissingArgument("at least one input document".to_string()));
    }

    // Load everything up front
    let documents = options
        .input_paths
        .iter()
        .map(|path| open_document(path))
        .collect::<Result<Vec<Document>>>()?;

    let mut max_id = 1;
    let mut page_order: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (mut doc, path) in documents.into_iter().zip(&options.input_paths) {
        // Pages are about to lose their old Parent, so pin inherited attributes first
        flatten_inherited_attributes(&mut doc);

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages = page_ids(&doc);
        debug!(path = %path.display(), pages = pages.len(), "collected pages");
        page_order.extend(pages);

        // The old catalog and page tree nodes are replaced below
        objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_tree_node(object)),
        );
    }

    let mut merged_doc = Document::with_version("1.5");
    merged_doc.objects.extend(objects);

    // new_object_id() must hand out IDs above everything we just inserted
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();
    let catalog_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_order.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_order.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_order {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    save_document(&mut merged_doc, &options.output_path)?;

    info!(
        inputs = options.input_paths.len(),
        pages = page_order.len(),
        output = %options.output_path.display(),
        "merged documents"
    );

    Ok(page_order.len())
}

/// Copy inherited MediaBox/CropBox/Resources/Rotate values onto each page
fn flatten_inherited_attributes(doc: &mut Document) {
    for page_id in page_ids(doc) {
        let missing: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|key| {
                doc.get_dictionary(page_id)
                    .map(|page| !page.has(key))
                    .unwrap_or(false)
            })
            .filter_map(|key| inherited_attribute(doc, page_id, key).map(|value| (*key, value)))
            .collect();

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in missing {
                page.set(key, value);
            }
        }
    }
}

fn is_tree_node(object: &Object) -> bool {
    let type_name = match object {
        Object::Dictionary(dict) => dict.get(b"Type").and_then(|t| t.as_name()).ok(),
        _ => None,
    };
    matches!(type_name, Some(b"Catalog") | Some(b"Pages"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use std::path::Path;

    #[test]
    fn test_merge_options_creation() {
        let options = MergeOptions {
            input_paths: vec![PathBuf::from("test1.pdf"), PathBuf::from("test2.pdf")],
            output_path: PathBuf::from("merged.pdf"),
        };

        assert_eq!(options.input_paths.len(), 2);
        assert_eq!(options.output_path, Path::new("merged.pdf"));
    }

    #[test]
    fn test_empty_input_list() {
        let options = MergeOptions {
            input_paths: vec![],
            output_path: PathBuf::from("merged.pdf"),
        };
        assert!(matches!(merge_pdfs(&options), Err(Error::MissingArgument(_))));
    }

    #[test]
    fn test_tree_nodes_detected() {
        assert!(is_tree_node(&Object::Dictionary(dictionary! { "Type" => "Catalog" })));
        assert!(is_tree_node(&Object::Dictionary(dictionary! { "Type" => "Pages" })));
        assert!(!is_tree_node(&Object::Dictionary(dictionary! { "Type" => "Page" })));
        assert!(!is_tree_node(&Object::Integer(3)));
    }

    #[test]
    fn test_flatten_copies_parent_media_box() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Rotate" => 90,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 300.into()],
                "Rotate" => 180,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        flatten_inherited_attributes(&mut doc);

        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        // The page's own value wins over the inherited one
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
    }
}
