//! Output formatting and display for pdfmerge.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages and alerts
//! - The merge progress bar
//! - The rendered file list
//! - Merge summaries, as prose or JSON
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::output::OutputFormatter;
//! use pdfmerge::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Staging files");
//! formatter.success("Merge completed successfully");
//! # }
//! ```

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::ProgressBar;

use crate::io::WriteStatistics;
use crate::list::AddOutcome;
use crate::merge::MergedArtifact;
use crate::workspace::WorkspaceView;

/// Show what happened to a selection.
pub fn display_add_outcome(formatter: &OutputFormatter, outcome: &AddOutcome) {
    if outcome.rejected > 0 {
        formatter.warning(&format!(
            "Ignored {} file(s) that are not PDFs",
            outcome.rejected
        ));
    }

    for name in &outcome.duplicates {
        formatter.warning(&format!("Already added, skipping: {name}"));
    }

    if !outcome.added.is_empty() {
        formatter.success(&format!("Added {} file(s)", outcome.added.len()));
    }
}

/// Render the staged file list.
pub fn display_list(formatter: &OutputFormatter, view: &WorkspaceView) {
    if !view.list_visible {
        formatter.info("No files added yet.");
        return;
    }

    formatter.section(&format!(
        "Files to merge ({}, {})",
        view.file_count, view.total_size
    ));
    for row in &view.rows {
        formatter.list_item(row.position, &format!("{} ({})", row.name, row.size_display));
        formatter.detail("id", &row.id.to_string());
    }

    if !view.merge_enabled && !view.merging {
        formatter.info("Add at least one more PDF to enable merging.");
    }
}

/// Summarize a merge whose artifact has been written.
pub fn display_merge_summary(
    formatter: &OutputFormatter,
    artifact: &MergedArtifact,
    write_stats: &WriteStatistics,
) {
    let stats = &artifact.statistics;

    formatter.success(&format!(
        "Successfully created {} ({})",
        write_stats.output_path.display(),
        write_stats.format_file_size()
    ));
    formatter.info(&format!(
        "Merged {} file(s) into {} pages in {:.2}s",
        stats.files_merged,
        stats.total_pages,
        stats.merge_time.as_secs_f64()
    ));

    if formatter.is_verbose() {
        formatter.section("Statistics");
        formatter.detail("Input files", &stats.files_merged.to_string());
        formatter.detail("Total pages", &stats.total_pages.to_string());
        formatter.detail("Input size", &stats.format_input_size());
        formatter.detail("Output size", &write_stats.format_file_size());
        formatter.detail(
            "Merge time",
            &format!("{:.2}s", stats.merge_time.as_secs_f64()),
        );
        formatter.detail(
            "Write time",
            &format!("{:.2}s", write_stats.write_time.as_secs_f64()),
        );
        formatter.detail("MIME type", artifact.mime_type);
    }
}
