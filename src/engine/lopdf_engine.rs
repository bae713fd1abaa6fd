//! [`PdfEngine`] implementation backed by `lopdf`.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};

use crate::config::CompressionLevel;
use crate::engine::PdfEngine;
use crate::error::{PdfMergeError, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// A page imported into a destination document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LopdfPage {
    id: ObjectId,
}

impl LopdfPage {
    /// Object id of the page dictionary in the destination document.
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

/// `lopdf`-based PDF engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine {
    compression: CompressionLevel,
}

impl LopdfEngine {
    /// Create an engine that applies `compression` when saving.
    pub fn new(compression: CompressionLevel) -> Self {
        Self { compression }
    }

    /// Object id of the root `Pages` node.
    fn pages_root(doc: &Document) -> Result<ObjectId> {
        let catalog = doc
            .catalog()
            .map_err(|e| PdfMergeError::merge_failed(format!("Failed to get catalog: {e}")))?;

        catalog
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|e| PdfMergeError::merge_failed(format!("Failed to get pages reference: {e}")))
    }
}

impl PdfEngine for LopdfEngine {
    type Document = Document;
    type Page = LopdfPage;

    fn create(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.7");

        let pages_id = doc.new_object_id();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => Object::Integer(0),
        };
        doc.objects.insert(pages_id, pages.into());

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }

    fn load(&self, name: &str, bytes: &[u8]) -> Result<Document> {
        let doc = Document::load_mem(bytes).map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("encrypt") || err_msg.contains("password") {
                PdfMergeError::Encrypted {
                    name: name.to_string(),
                }
            } else {
                PdfMergeError::parse(name, err_msg)
            }
        })?;

        if doc.is_encrypted() {
            return Err(PdfMergeError::Encrypted {
                name: name.to_string(),
            });
        }

        Ok(doc)
    }

    fn page_indices(&self, doc: &Document) -> Vec<usize> {
        (0..doc.get_pages().len()).collect()
    }

    fn copy_pages(
        &self,
        dest: &mut Document,
        src: &Document,
        indices: &[usize],
    ) -> Result<Vec<LopdfPage>> {
        // Shift the source into an id range the destination has not used.
        let mut source = src.clone();
        source.renumber_objects_with(dest.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        let mut copied = Vec::with_capacity(indices.len());

        for &index in indices {
            let page_id = *page_ids.get(index).ok_or_else(|| {
                PdfMergeError::merge_failed(format!(
                    "Page index {index} out of range ({} pages)",
                    page_ids.len()
                ))
            })?;

            let mut page = source
                .get_dictionary(page_id)
                .map_err(|e| PdfMergeError::merge_failed(format!("Failed to get page: {e}")))?
                .clone();

            inherit_attributes(&source, &mut page);
            page.remove(b"Parent");

            let values: Vec<Object> = page.iter().map(|(_, value)| value.clone()).collect();
            dest.objects.insert(page_id, Object::Dictionary(page));
            for value in &values {
                copy_references(dest, &source, value);
            }

            copied.push(LopdfPage { id: page_id });
        }

        dest.max_id = dest.max_id.max(source.max_id);
        Ok(copied)
    }

    fn add_page(&self, dest: &mut Document, page: LopdfPage) -> Result<()> {
        let pages_id = Self::pages_root(dest)?;

        dest.get_object_mut(page.id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfMergeError::merge_failed(format!("Failed to get page: {e}")))?
            .set("Parent", pages_id);

        let pages_obj = dest
            .get_object_mut(pages_id)
            .map_err(|e| PdfMergeError::merge_failed(format!("Failed to get pages object: {e}")))?;

        let Object::Dictionary(dict) = pages_obj else {
            return Err(PdfMergeError::merge_failed(
                "Pages object is not a dictionary",
            ));
        };

        match dict.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => kids.push(Object::Reference(page.id)),
            Ok(_) => return Err(PdfMergeError::merge_failed("Kids is not an array")),
            Err(_) => {
                return Err(PdfMergeError::merge_failed(
                    "Pages dictionary missing Kids array",
                ));
            }
        }

        let current_count = dict.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        dict.set("Count", Object::Integer(current_count + 1));

        Ok(())
    }

    fn save(&self, doc: &mut Document) -> Result<Vec<u8>> {
        match self.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => doc.compress(),
            CompressionLevel::Maximum => {
                doc.compress();
                doc.prune_objects();
            }
        }

        doc.renumber_objects();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfMergeError::merge_failed(format!("Failed to save merged PDF: {e}")))?;

        Ok(buffer)
    }

    fn page_count(&self, doc: &Document) -> usize {
        doc.get_pages().len()
    }
}

/// Copy attributes the page inherits from its ancestors onto the page itself.
///
/// A copied page is detached from its source tree, so anything it used to
/// inherit has to travel with it.
fn inherit_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };

        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
}

/// Copy object references from one PDF document to another.
///
/// If `obj` is a reference, this walks the structure recursively and inserts
/// missing referenced objects into the `target` document.
fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    match obj {
        Object::Reference(ref_id) => {
            if !target.objects.contains_key(ref_id)
                && let Ok(referenced_obj) = source.get_object(*ref_id)
            {
                target.objects.insert(*ref_id, referenced_obj.clone());
                copy_references(target, source, referenced_obj);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                copy_references(target, source, value);
            }
        }
        Object::Array(arr) => {
            for item in arr {
                copy_references(target, source, item);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                copy_references(target, source, value);
            }
        }
        _ => {}
    }
}
