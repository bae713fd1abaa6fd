//! Application wiring: a [`Workspace`] plus the disk-facing pieces around it.
//!
//! [`App`] resolves input patterns into [`DiskFile`]s, stages them, and writes
//! the merged artifact into the configured output directory under the
//! configured overwrite policy. Both the batch command line and the
//! interactive shell drive an `App`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, OverwriteMode, output_file_name};
use crate::engine::{LopdfEngine, PdfEngine};
use crate::error::{PdfMergeError, Result};
use crate::io::{ArtifactWriter, FileDelivery, WriteStatistics, resolve_overwrite};
use crate::list::{AddOutcome, Confirm, MIN_MERGE_FILES};
use crate::merge::{MergedArtifact, NoProgress};
use crate::output::{OutputFormatter, ProgressBar};
use crate::source::{DiskFile, FileSource};
use crate::utils::collect_paths_for_patterns;
use crate::workspace::Workspace;

/// A merge written to disk.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged artifact.
    pub artifact: MergedArtifact,
    /// How the artifact was written.
    pub write_stats: WriteStatistics,
}

/// Workspace bound to the filesystem and the terminal.
#[derive(Debug)]
pub struct App<E> {
    config: Config,
    workspace: Workspace<E>,
    formatter: OutputFormatter,
    writer: ArtifactWriter,
}

impl App<LopdfEngine> {
    /// Create an app merging with [`LopdfEngine`].
    pub fn new(config: Config) -> Self {
        let engine = LopdfEngine::new(config.compression);
        Self::with_engine(config, engine)
    }
}

impl<E: PdfEngine> App<E> {
    /// Create an app merging with `engine`.
    pub fn with_engine(config: Config, engine: E) -> Self {
        let mut workspace = Workspace::new(engine).with_display_delay(config.display_delay);
        workspace.set_output_name(config.output_name.clone());

        Self {
            formatter: OutputFormatter::from_config(&config),
            writer: ArtifactWriter::new(),
            workspace,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Formatter for user-visible messages.
    pub fn formatter(&self) -> &OutputFormatter {
        &self.formatter
    }

    /// The workspace.
    pub fn workspace(&self) -> &Workspace<E> {
        &self.workspace
    }

    /// The workspace, mutably.
    pub fn workspace_mut(&mut self) -> &mut Workspace<E> {
        &mut self.workspace
    }

    /// Path the artifact for the current output name is written to.
    pub fn output_path(&self) -> PathBuf {
        self.config.output_path(self.workspace.output_name())
    }

    /// Stage the files named by `patterns`, expanding globs in order.
    ///
    /// Every path is opened before anything is staged; if one cannot be
    /// opened the list is left untouched.
    ///
    /// # Errors
    ///
    /// Glob errors, [`PdfMergeError::ReadFailed`] for unreadable paths, and
    /// whatever [`Workspace::add_files`] reports.
    pub async fn add_paths<T>(&mut self, patterns: T) -> Result<AddOutcome>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let paths = collect_paths_for_patterns(patterns)?;
        if paths.is_empty() {
            return Err(PdfMergeError::NoValidFiles { rejected: 0 });
        }

        let mut sources: Vec<Arc<dyn FileSource>> = Vec::with_capacity(paths.len());
        for path in &paths {
            let file = DiskFile::open(path).await?;
            self.formatter
                .debug(&format!("Found {} ({} bytes)", path.display(), file.size()));
            sources.push(Arc::new(file));
        }

        self.workspace.add_files(sources)
    }

    /// Merge the staged files and write the artifact.
    ///
    /// The overwrite policy is checked before any file is merged. The file
    /// is written before the merge reports `Done`, so a failed write never
    /// shows as a success. `confirm` answers the overwrite prompt unless
    /// `assume_yes` is set.
    ///
    /// # Errors
    ///
    /// [`PdfMergeError::InsufficientFiles`], overwrite refusals, merge
    /// failures and write failures.
    pub async fn merge_to_disk(&mut self, confirm: &mut dyn Confirm) -> Result<MergeOutcome> {
        let count = self.workspace.list().len();
        if count < MIN_MERGE_FILES {
            return Err(PdfMergeError::InsufficientFiles { count });
        }

        let path = self.output_path();
        self.writer.can_write(&path).await?;
        self.check_overwrite(&path, confirm).await?;

        let mut delivery = FileDelivery::new(&self.writer, &path);
        let artifact = if self.formatter.should_print() && !self.config.json {
            let mut progress = ProgressBar::new();
            self.workspace.merge_into(&mut progress, &mut delivery).await?
        } else {
            self.workspace.merge_into(&mut NoProgress, &mut delivery).await?
        };

        let write_stats = delivery
            .into_statistics()
            .ok_or_else(|| PdfMergeError::other("Merged PDF was not written"))?;
        tracing::info!(path = %path.display(), "artifact written");

        Ok(MergeOutcome {
            artifact,
            write_stats,
        })
    }

    async fn check_overwrite(&self, path: &Path, confirm: &mut dyn Confirm) -> Result<()> {
        let mode = match self.config.overwrite_mode {
            OverwriteMode::Prompt if self.config.assume_yes => OverwriteMode::Force,
            // Nobody to ask in quiet mode.
            OverwriteMode::Prompt if self.formatter.is_quiet() => OverwriteMode::NoClobber,
            mode => mode,
        };
        resolve_overwrite(path, mode, confirm).await
    }

    /// Print the result of a merge the way the configuration asks for.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON report cannot be serialized.
    pub fn report(&self, outcome: &MergeOutcome) -> Result<()> {
        if self.config.json {
            let mut report = serde_json::to_value(outcome.artifact.report())
                .map_err(|e| PdfMergeError::other(format!("Failed to serialize report: {e}")))?;
            report["output_path"] = outcome.write_stats.output_path.display().to_string().into();
            return self.formatter.json(&report);
        }

        crate::output::display_merge_summary(
            &self.formatter,
            &outcome.artifact,
            &outcome.write_stats,
        );
        Ok(())
    }

    /// Artifact file name for the current output name.
    pub fn artifact_name(&self) -> String {
        output_file_name(self.workspace.output_name())
    }
}
