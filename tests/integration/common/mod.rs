//! Shared helpers for integration tests.

mod fixtures;

use std::path::PathBuf;
use std::sync::Arc;

use lopdf::Document;
use pdfmerge::source::{FileSource, MemoryFile};
use tempfile::TempDir;

pub use fixtures::{labelled_pdf, page_labels};

/// Labels of a serialized PDF.
pub fn labels_of(bytes: &[u8]) -> Vec<String> {
    page_labels(&Document::load_mem(bytes).expect("Failed to load merged output"))
}

/// In-memory PDF named `<label>.pdf`.
pub fn memory_pdf(label: &str, pages: usize) -> Arc<dyn FileSource> {
    Arc::new(MemoryFile::pdf(
        format!("{label}.pdf"),
        labelled_pdf(label, pages),
    ))
}

/// In-memory file with an arbitrary declared type.
pub fn memory_file(name: &str, mime_type: &str, bytes: &[u8]) -> Arc<dyn FileSource> {
    Arc::new(MemoryFile::new(name, mime_type, bytes.to_vec()))
}

/// Write `<label>.pdf` into `dir` and return its path as a string.
pub fn write_pdf(dir: &TempDir, label: &str, pages: usize) -> String {
    let path: PathBuf = dir.path().join(format!("{label}.pdf"));
    std::fs::write(&path, labelled_pdf(label, pages)).expect("Failed to write fixture");
    path.display().to_string()
}
