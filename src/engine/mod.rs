//! PDF engine capability used by the merge pipeline.
//!
//! The merge pipeline never looks inside a PDF. Everything it needs is
//! expressed by [`PdfEngine`]: create an empty document, parse bytes, list
//! page indices, copy pages across documents, append them and serialize.
//! [`LopdfEngine`] implements it on top of `lopdf`.

mod lopdf_engine;
#[cfg(test)]
#[path = "../../tests/integration/common/fixtures.rs"]
pub(crate) mod testing;

pub use lopdf_engine::{LopdfEngine, LopdfPage};

use crate::error::Result;

/// Black-box PDF parse/copy/serialize capability.
pub trait PdfEngine: Send + Sync + 'static {
    /// Parsed or newly created document.
    type Document: Send + 'static;

    /// Handle to a page copied into a destination document but not yet
    /// attached to its page tree.
    type Page: Send + 'static;

    /// Create an empty destination document.
    fn create(&self) -> Result<Self::Document>;

    /// Parse `bytes` read from the entry called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PdfMergeError::Parse`] or
    /// [`crate::PdfMergeError::Encrypted`] if the bytes cannot be used.
    fn load(&self, name: &str, bytes: &[u8]) -> Result<Self::Document>;

    /// Zero-based page indices in document order.
    fn page_indices(&self, doc: &Self::Document) -> Vec<usize>;

    /// Copy the pages at `indices` from `src` into `dest`'s object space.
    ///
    /// The returned handles are in the order of `indices`.
    fn copy_pages(
        &self,
        dest: &mut Self::Document,
        src: &Self::Document,
        indices: &[usize],
    ) -> Result<Vec<Self::Page>>;

    /// Append a copied page to the end of `dest`'s page tree.
    fn add_page(&self, dest: &mut Self::Document, page: Self::Page) -> Result<()>;

    /// Serialize the document.
    fn save(&self, doc: &mut Self::Document) -> Result<Vec<u8>>;

    /// Number of pages in `doc`.
    fn page_count(&self, doc: &Self::Document) -> usize {
        self.page_indices(doc).len()
    }
}
