//! Generated PDF fixtures.
//!
//! Every page of a generated PDF draws the text `<label>-<n>`, so the page
//! order of a merged document can be read back from its content streams.
//! Shared by the library's unit tests and the integration tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};

/// Build a PDF with labelled pages.
///
/// # Arguments
///
/// * `label` - Text drawn on every page, followed by `-<page number>`
/// * `pages` - Number of pages to generate
///
/// # Returns
///
/// The serialized PDF.
pub fn labelled_pdf(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{label}-{n}").into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("Failed to encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages as i64),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to save fixture");
    buffer
}

/// Labels drawn on each page of `doc`, in page order.
pub fn page_labels(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .into_values()
        .map(|id| {
            let content = doc.get_page_content(id).expect("Failed to read page content");
            let content = Content::decode(&content).expect("Failed to decode page content");
            content
                .operations
                .iter()
                .find(|op| op.operator == "Tj")
                .and_then(|op| op.operands.first())
                .and_then(|obj| obj.as_str().ok())
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .expect("Page carries no label")
        })
        .collect()
}
