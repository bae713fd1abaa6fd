//! Writing merged artifacts to disk.
//!
//! The merged bytes are already serialized by the engine; this module only
//! puts them on disk. Writes go to a temporary sibling first and are renamed
//! into place, so an interrupted write never leaves a truncated PDF under
//! the final name.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::io::ArtifactWriter;
//! use pdfmerge::merge::MergedArtifact;
//! use std::path::Path;
//!
//! # async fn example(artifact: MergedArtifact) -> pdfmerge::Result<()> {
//! let writer = ArtifactWriter::new();
//! writer.save(&artifact, Path::new("merged.pdf")).await?;
//! # Ok(())
//! # }
//! ```

use futures::FutureExt;
use futures::future::BoxFuture;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::OverwriteMode;
use crate::error::{PdfMergeError, Result};
use crate::list::Confirm;
use crate::merge::{Deliver, MergedArtifact};
use crate::utils::format_file_size;

/// Options for writing artifacts.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file, then rename.
    pub atomic: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes [`MergedArtifact`]s to the filesystem.
#[derive(Debug, Clone, Default)]
pub struct ArtifactWriter {
    options: WriteOptions,
}

impl ArtifactWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer that writes straight to the final path.
    pub fn non_atomic() -> Self {
        Self {
            options: WriteOptions {
                atomic: false,
                ..Default::default()
            },
        }
    }

    /// Write `artifact` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::FailedToWrite`] if the file cannot be created,
    /// written or renamed into place.
    pub async fn save(&self, artifact: &MergedArtifact, path: &Path) -> Result<()> {
        self.save_with_stats(artifact, path).await.map(|_| ())
    }

    /// Write `artifact` to `path` and report how it went.
    ///
    /// # Errors
    ///
    /// Same as [`ArtifactWriter::save`].
    pub async fn save_with_stats(
        &self,
        artifact: &MergedArtifact,
        path: &Path,
    ) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();
        let bytes = artifact.bytes.clone();

        let stats = task::spawn_blocking(move || {
            let start = Instant::now();

            let write_path = if options.atomic {
                temp_path_for(&path_buf)
            } else {
                path_buf.clone()
            };

            let result = write_bytes(&write_path, &bytes, options.buffer_size);
            if result.is_err() && options.atomic {
                std::fs::remove_file(&write_path).ok();
            }
            result?;

            if options.atomic {
                std::fs::rename(&write_path, &path_buf).map_err(|e| {
                    std::fs::remove_file(&write_path).ok();
                    PdfMergeError::FailedToWrite {
                        path: path_buf.clone(),
                        source: e,
                    }
                })?;
            }

            let file_size = std::fs::metadata(&path_buf)
                .map(|m| m.len())
                .unwrap_or(bytes.len() as u64);

            Ok::<_, PdfMergeError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PdfMergeError::other(format!("Write task failed: {e}")))??;

        tracing::debug!(
            path = %stats.output_path.display(),
            bytes = stats.file_size,
            "wrote artifact"
        );
        Ok(stats)
    }

    /// Check that the parent directory of `path` exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::InvalidConfig`] if it does not.
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let metadata = tokio::fs::metadata(parent).await.map_err(|_| {
            PdfMergeError::invalid_config(format!(
                "Output directory does not exist: {}",
                parent.display()
            ))
        })?;

        if !metadata.is_dir() {
            return Err(PdfMergeError::invalid_config(format!(
                "Output directory is not a directory: {}",
                parent.display()
            )));
        }

        if metadata.permissions().readonly() {
            return Err(PdfMergeError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }
}

/// Writes the artifact of a running merge to a fixed path.
///
/// Pass it to [`crate::workspace::Workspace::merge_into`] so the file is on
/// disk before the merge reports `Done`.
#[derive(Debug)]
pub struct FileDelivery<'a> {
    writer: &'a ArtifactWriter,
    path: &'a Path,
    stats: Option<WriteStatistics>,
}

impl<'a> FileDelivery<'a> {
    /// Deliver to `path` using `writer`.
    pub fn new(writer: &'a ArtifactWriter, path: &'a Path) -> Self {
        Self {
            writer,
            path,
            stats: None,
        }
    }

    /// Statistics of the write, once the artifact has been delivered.
    pub fn into_statistics(self) -> Option<WriteStatistics> {
        self.stats
    }
}

impl Deliver for FileDelivery<'_> {
    fn deliver<'b>(&'b mut self, artifact: &'b MergedArtifact) -> BoxFuture<'b, Result<()>> {
        async move {
            let stats = self.writer.save_with_stats(artifact, self.path).await?;
            self.stats = Some(stats);
            Ok(())
        }
        .boxed()
    }
}

/// Decide whether writing to `path` may go ahead.
///
/// Nothing to decide if `path` does not exist. Otherwise `mode` applies;
/// [`OverwriteMode::Prompt`] asks `confirm`.
///
/// # Errors
///
/// [`PdfMergeError::OutputExists`] under [`OverwriteMode::NoClobber`],
/// [`PdfMergeError::Cancelled`] if the prompt is declined.
pub async fn resolve_overwrite(
    path: &Path,
    mode: OverwriteMode,
    confirm: &mut dyn Confirm,
) -> Result<()> {
    if tokio::fs::metadata(path).await.is_err() {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfMergeError::OutputExists {
            path: path.to_path_buf(),
        }),
        OverwriteMode::Prompt => {
            let prompt = format!(
                "Output file already exists: {}. Overwrite?",
                path.display()
            );
            if confirm.confirm(&prompt) {
                Ok(())
            } else {
                Err(PdfMergeError::Cancelled)
            }
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_bytes(path: &Path, bytes: &[u8], buffer_size: usize) -> Result<()> {
    let to_write_error = |source| PdfMergeError::FailedToWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(to_write_error)?;
    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);
    writer.write_all(bytes).map_err(to_write_error)?;
    writer.flush().map_err(to_write_error)?;
    Ok(())
}
