//! Configuration module for pdfmerge.
//!
//! This module holds the validated, normalized settings that drive a session:
//! where artifacts are written, how existing files are treated, how the merged
//! document is compressed and how chatty the output is. A [`Config`] is usually
//! produced from CLI arguments by [`crate::cli::Cli::to_config`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PdfMergeError, Result};

/// Name used when the requested output name is blank.
pub const DEFAULT_OUTPUT_NAME: &str = "merged";

/// Extension appended to every artifact name.
pub const PDF_EXTENSION: &str = "pdf";

/// How long the success state stays visible before the workspace resets.
pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_secs(2);

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression - streams are written as loaded.
    None,
    /// Compress streams (default).
    #[default]
    Standard,
    /// Compress streams and prune unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = PdfMergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PdfMergeError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Complete configuration for a pdfmerge session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the merged artifact is written into.
    pub output_dir: PathBuf,

    /// Raw output name as typed by the user; resolved with [`output_file_name`].
    pub output_name: String,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Answer every confirmation prompt with "yes".
    pub assume_yes: bool,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Delay before the success state is cleared.
    pub display_delay: Duration,

    /// Emit machine-readable reports instead of prose.
    pub json: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_name: String::new(),
            overwrite_mode: OverwriteMode::default(),
            assume_yes: false,
            compression: CompressionLevel::default(),
            display_delay: DEFAULT_DISPLAY_DELAY,
            json: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if verbose and quiet are both enabled or the output
    /// directory path is empty.
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            return Err(PdfMergeError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(PdfMergeError::invalid_config(
                "Output directory cannot be empty",
            ));
        }

        Ok(())
    }

    /// Full path of the artifact produced for `raw_name`.
    pub fn output_path(&self, raw_name: &str) -> PathBuf {
        self.output_dir.join(output_file_name(raw_name))
    }
}

/// Resolve the artifact file name for a user-supplied output name.
///
/// Surrounding whitespace is trimmed; a blank name falls back to
/// [`DEFAULT_OUTPUT_NAME`]. The `.pdf` extension is always appended.
///
/// # Examples
///
/// ```
/// use pdfmerge::config::output_file_name;
///
/// assert_eq!(output_file_name("  report "), "report.pdf");
/// assert_eq!(output_file_name("   "), "merged.pdf");
/// ```
pub fn output_file_name(raw_name: &str) -> String {
    let trimmed = raw_name.trim();
    let stem = if trimmed.is_empty() {
        DEFAULT_OUTPUT_NAME
    } else {
        trimmed
    };
    format!("{stem}.{PDF_EXTENSION}")
}
