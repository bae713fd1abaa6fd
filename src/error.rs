//! Error types for pdfmerge.
//!
//! Every failure a user can trigger ends up as a [`PdfMergeError`] and is
//! surfaced through an alert. Nothing here is retried automatically and no
//! variant is fatal to an interactive session: after any error the workspace
//! returns to its pre-merge state.
//!
//! # Error Categories
//!
//! - **Selection Errors**: no PDF in a selection, too few files to merge
//! - **Merge Failures**: unreadable or unparsable sources, copy/save failures
//! - **List Errors**: out-of-range positions and stale entry ids
//! - **Output Errors**: existing artifact, failed writes

use std::io;
use std::path::PathBuf;

/// Lead-in of the alert shown when a running merge fails.
pub const MERGE_FAILED_ALERT: &str = "Error merging PDFs";

/// Result type alias for pdfmerge operations.
pub type Result<T> = std::result::Result<T, PdfMergeError>;

/// Main error type for pdfmerge operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfMergeError {
    /// A selection contained no item declared as `application/pdf`.
    #[error("Please select PDF files only! ({rejected} file(s) ignored)")]
    NoValidFiles {
        /// Number of candidates that were filtered out.
        rejected: usize,
    },

    /// A merge was attempted with fewer than two entries.
    #[error("Please add at least 2 PDF files to merge! ({count} staged)")]
    InsufficientFiles {
        /// Number of entries currently staged.
        count: usize,
    },

    /// A source file could not be parsed as a PDF document.
    #[error("Failed to parse PDF: {name}\n  Reason: {reason}")]
    Parse {
        /// Name of the offending entry.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// A source file is encrypted and cannot be merged.
    #[error(
        "PDF is encrypted and cannot be processed: {name}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools"
    )]
    Encrypted {
        /// Name of the encrypted entry.
        name: String,
    },

    /// Reading the content of an entry failed.
    #[error("Failed to read {name}\n  Reason: {source}")]
    ReadFailed {
        /// Name of the entry being read.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Page copy or serialization failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// A list position was outside `0..len`.
    #[error("Index {index} is out of range for a list of {len} file(s)")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// List length at the time of the request.
        len: usize,
    },

    /// An entry id no longer refers to a staged file.
    #[error("No staged file with id {id}")]
    UnknownEntry {
        /// The stale id.
        id: u64,
    },

    /// The list was touched while a merge was running.
    #[error("A merge is already in progress")]
    MergeInProgress,

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output name",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to write the merged artifact.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for PdfMergeError {
    fn from(err: lopdf::Error) -> Self {
        Self::merge_failed(err.to_string())
    }
}

impl From<anyhow::Error> for PdfMergeError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PdfMergeError {
    /// Create a Parse error.
    pub fn parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error aborted an in-flight merge.
    ///
    /// Writing the artifact is the last merge step, so a failed write counts.
    pub fn is_merge_failure(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::Encrypted { .. }
                | Self::ReadFailed { .. }
                | Self::MergeFailed { .. }
                | Self::FailedToWrite { .. }
        )
    }

    /// Text of the alert shown to the user for this error.
    ///
    /// Merge failures are introduced with [`MERGE_FAILED_ALERT`]; everything
    /// else is shown as is.
    pub fn alert(&self) -> String {
        if self.is_merge_failure() {
            format!("{MERGE_FAILED_ALERT}: {self}")
        } else {
            self.to_string()
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoValidFiles { .. } => 2,
            Self::InsufficientFiles { .. } => 1,
            Self::Parse { .. } => 3,
            Self::Encrypted { .. } => 3,
            Self::ReadFailed { .. } => 2,
            Self::MergeFailed { .. } => 6,
            Self::IndexOutOfRange { .. } => 1,
            Self::UnknownEntry { .. } => 1,
            Self::MergeInProgress => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToWrite { .. } => 5,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
