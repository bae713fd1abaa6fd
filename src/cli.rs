//! CLI argument parsing for pdfmerge.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Staging {} inputs", cli.inputs.len());
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{CompressionLevel, Config, OverwriteMode};
use crate::error::{PdfMergeError, Result};

/// Stage, reorder and merge PDF files into a single document.
///
/// In batch mode the inputs are merged in the order given. With
/// --interactive, an interactive shell lets you add, remove and reorder
/// files before merging.
#[derive(Parser, Debug)]
#[command(name = "pdfmerge")]
#[command(version)]
#[command(about = "Stage, reorder and merge PDF files into a single document", long_about = None)]
#[command(author)]
pub struct Cli {
    /// Input PDF files to merge (in order)
    ///
    /// Specify multiple files or use glob patterns. Files whose name is
    /// already staged are skipped. In interactive mode these are staged
    /// before the shell starts.
    ///
    /// Examples:
    ///   pdfmerge a.pdf b.pdf -o combined
    ///   pdfmerge 'chapter*.pdf' -o book
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output name, without extension
    ///
    /// Surrounding whitespace is trimmed and ".pdf" is appended.
    /// A blank name produces "merged.pdf".
    #[arg(short = 'o', long, value_name = "NAME", env = "PDFMERGE_OUTPUT_NAME", default_value = "")]
    pub output_name: String,

    /// Directory the merged PDF is written into
    #[arg(short = 'd', long, value_name = "DIR", env = "PDFMERGE_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Start the interactive shell
    #[arg(short, long)]
    pub interactive: bool,

    /// Force overwrite of existing output file without confirmation
    ///
    /// By default, pdfmerge will prompt before overwriting an existing file.
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    ///
    /// If the output file already exists, exit with an error
    /// instead of prompting or overwriting.
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress streams (default)
    /// - maximum: Compress streams and drop unreachable objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// How long the finished progress stays visible, in milliseconds
    ///
    /// Only used by the interactive shell.
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    pub display_delay_ms: u64,

    /// Print machine-readable JSON instead of prose
    #[arg(long)]
    pub json: bool,

    /// Verbose output - show detailed information about each file
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    /// Useful for scripts and automation.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if the compression level is invalid or the resulting
    /// configuration fails validation.
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        // Batch runs have no screen to hold the finished state on.
        let display_delay = if self.interactive {
            Duration::from_millis(self.display_delay_ms)
        } else {
            Duration::ZERO
        };

        let config = Config {
            output_dir: self.output_dir.clone(),
            output_name: self.output_name.clone(),
            overwrite_mode,
            assume_yes: self.yes,
            compression,
            display_delay,
            json: self.json,
            verbose: self.verbose,
            quiet: self.quiet,
        };

        config.validate().map_err(|e| {
            PdfMergeError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if batch mode has no inputs or a flag combination is
    /// invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.interactive && self.inputs.is_empty() {
            return Err(PdfMergeError::invalid_config(
                "No input files specified (use --interactive to start the shell)",
            ));
        }

        if self.force && self.no_clobber {
            return Err(PdfMergeError::invalid_config(
                "Cannot use both --force and --no-clobber",
            ));
        }

        if !["none", "standard", "maximum"].contains(&self.compression.as_str()) {
            return Err(PdfMergeError::invalid_config(format!(
                "Invalid compression level: {}",
                self.compression
            )));
        }

        Ok(())
    }
}
