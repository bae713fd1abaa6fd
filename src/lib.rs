//! pdfmerge - Stage, reorder and merge PDF files into a single document.
//!
//! The crate models a small merge workbench:
//!
//! - a [`list::FileList`] of staged files, deduplicated by name and ordered
//!   the way pages should appear in the result
//! - a [`drag::DragSession`] that turns pointer gestures into single-entry
//!   moves
//! - a [`merge::MergeOrchestrator`] that reads, parses and copies each file
//!   in turn through a [`engine::PdfEngine`], reporting progress
//! - a [`workspace::Workspace`] tying them together for a front end
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::engine::LopdfEngine;
//! use pdfmerge::merge::NoProgress;
//! use pdfmerge::source::{DiskFile, FileSource};
//! use pdfmerge::workspace::Workspace;
//! use std::sync::Arc;
//!
//! # async fn example() -> pdfmerge::Result<()> {
//! let mut workspace = Workspace::new(LopdfEngine::default());
//! let files: Vec<Arc<dyn FileSource>> = vec![
//!     Arc::new(DiskFile::open("a.pdf").await?),
//!     Arc::new(DiskFile::open("b.pdf").await?),
//! ];
//! workspace.add_files(files)?;
//! workspace.set_output_name("report");
//!
//! let artifact = workspace.merge(&mut NoProgress).await?;
//! assert_eq!(artifact.file_name, "report.pdf");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod cli;
pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod io;
pub mod list;
pub mod merge;
pub mod output;
pub mod shell;
pub mod source;
pub mod utils;
pub mod workspace;

// Re-export commonly used types
pub use config::Config;
pub use error::{PdfMergeError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
