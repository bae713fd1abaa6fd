//! Raw file handles offered to the file list.
//!
//! A [`FileSource`] is what a file picker or a drop gesture hands over: a name,
//! a byte size, a declared MIME type and a way to read the content later. The
//! content is never read when a file is staged, only when a merge reaches it.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PdfMergeError, Result};

/// MIME type accepted by the file list.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A user-selected file whose content is read lazily.
pub trait FileSource: Send + Sync + fmt::Debug {
    /// Display name, also the dedup key in the file list.
    fn name(&self) -> &str;

    /// Size in bytes, for display only.
    fn size(&self) -> u64;

    /// Declared MIME type. Empty when unknown.
    fn mime_type(&self) -> &str;

    /// Read the complete content.
    fn read_all(&self) -> BoxFuture<'_, io::Result<Vec<u8>>>;

    /// Whether the declared type is exactly `application/pdf`.
    fn is_pdf(&self) -> bool {
        self.mime_type() == PDF_MIME_TYPE
    }
}

/// Guess the declared MIME type of a path from its extension.
///
/// Mirrors what a browser reports for a picked file: the extension decides,
/// the content is not inspected.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("pdf") => PDF_MIME_TYPE,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        _ => "",
    }
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: &'static str,
}

impl DiskFile {
    /// Stat a file and build a handle for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a regular file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let metadata =
            tokio::fs::metadata(&path)
                .await
                .map_err(|source| PdfMergeError::ReadFailed {
                    name: name.clone(),
                    source,
                })?;

        if !metadata.is_file() {
            return Err(PdfMergeError::ReadFailed {
                name,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        Ok(Self {
            mime_type: mime_type_for_path(&path),
            size: metadata.len(),
            name,
            path,
        })
    }
}

impl FileSource for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        self.mime_type
    }

    fn read_all(&self) -> BoxFuture<'_, io::Result<Vec<u8>>> {
        async move { tokio::fs::read(&self.path).await }.boxed()
    }
}

/// An in-memory file, used for generated content and in tests.
#[derive(Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    /// Create a handle with an explicit MIME type.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Create a handle declared as `application/pdf`.
    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, PDF_MIME_TYPE, bytes)
    }
}

impl fmt::Debug for MemoryFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn read_all(&self) -> BoxFuture<'_, io::Result<Vec<u8>>> {
        futures::future::ready(Ok(self.bytes.clone())).boxed()
    }
}
