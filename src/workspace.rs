//! Workspace: the state behind one merge screen.
//!
//! A [`Workspace`] owns the staged [`FileList`], the active [`DragSession`],
//! the output-name field and the merge-in-flight flag. Front ends (the
//! interactive shell, the batch CLI) translate user events into calls on it
//! and render [`Workspace::view`] afterwards.
//!
//! While a merge is running the list is frozen: every mutator returns
//! [`PdfMergeError::MergeInProgress`]. The merge itself works on a snapshot
//! taken by [`Workspace::begin_merge`], so a front end that drives the job on
//! its own still cannot change what is being merged.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_DISPLAY_DELAY;
use crate::drag::DragSession;
use crate::engine::PdfEngine;
use crate::error::{PdfMergeError, Result};
use crate::list::{
    AddOutcome, Confirm, DocumentEntry, EntryId, EntryRow, FileList, MIN_MERGE_FILES, Visibility,
};
use crate::merge::{Deliver, KeepArtifact, MergeOrchestrator, MergedArtifact, ProgressSink};
use crate::source::FileSource;
use crate::utils::format_file_size;

/// Snapshot of what a front end should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceView {
    /// The list section has entries to show.
    pub list_visible: bool,
    /// The merge action can be triggered right now.
    pub merge_enabled: bool,
    /// A merge is running; progress is shown instead of the merge action.
    pub merging: bool,
    /// Number of staged files.
    pub file_count: usize,
    /// Combined size of the staged files.
    pub total_size: String,
    /// Raw output name as typed.
    pub output_name: String,
    /// Rendered rows in merge order.
    pub rows: Vec<EntryRow>,
}

/// A merge detached from the workspace that started it.
///
/// Created by [`Workspace::begin_merge`]. The entries are a snapshot; later
/// list changes do not affect the job.
#[derive(Debug)]
pub struct MergeJob<E> {
    orchestrator: MergeOrchestrator<E>,
    entries: Vec<DocumentEntry>,
    output_name: String,
}

impl<E: PdfEngine> MergeJob<E> {
    /// Entries being merged, in order.
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    /// Run the merge.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`MergeOrchestrator::merge`].
    pub async fn run(&self, sink: &mut dyn ProgressSink) -> Result<MergedArtifact> {
        self.run_into(sink, &mut KeepArtifact).await
    }

    /// Run the merge, handing the artifact to `delivery` before `Done`.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`MergeOrchestrator::merge_into`].
    pub async fn run_into(
        &self,
        sink: &mut dyn ProgressSink,
        delivery: &mut dyn Deliver,
    ) -> Result<MergedArtifact> {
        self.orchestrator
            .merge_into(&self.entries, &self.output_name, sink, delivery)
            .await
    }
}

/// State of one merge screen.
#[derive(Debug)]
pub struct Workspace<E> {
    list: FileList,
    drag: DragSession,
    orchestrator: MergeOrchestrator<E>,
    output_name: String,
    merging: bool,
    display_delay: Duration,
}

impl<E: PdfEngine> Workspace<E> {
    /// Create an empty workspace merging through `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            list: FileList::new(),
            drag: DragSession::new(),
            orchestrator: MergeOrchestrator::new(engine),
            output_name: String::new(),
            merging: false,
            display_delay: DEFAULT_DISPLAY_DELAY,
        }
    }

    /// Set how long the finished progress stays visible after a success.
    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = delay;
        self
    }

    /// The staged files.
    pub fn list(&self) -> &FileList {
        &self.list
    }

    /// The drag session.
    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// Raw output name as typed.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Whether a merge is running.
    pub fn is_merging(&self) -> bool {
        self.merging
    }

    /// Replace the output-name field. Trimming happens when the merge names
    /// its artifact.
    pub fn set_output_name(&mut self, name: impl Into<String>) {
        self.output_name = name.into();
    }

    /// Stage files from a picker or drop gesture.
    ///
    /// # Errors
    ///
    /// [`PdfMergeError::NoValidFiles`] if nothing in the selection is a PDF,
    /// [`PdfMergeError::MergeInProgress`] while merging.
    pub fn add_files<I>(&mut self, candidates: I) -> Result<AddOutcome>
    where
        I: IntoIterator<Item = Arc<dyn FileSource>>,
    {
        self.ensure_idle()?;
        self.list.add(candidates)
    }

    /// Remove the entry at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<DocumentEntry> {
        self.ensure_idle()?;
        let entry = self.list.remove_at(index)?;
        self.drag.leave(entry.id());
        Ok(entry)
    }

    /// Remove the entry with `id`.
    pub fn remove(&mut self, id: EntryId) -> Result<DocumentEntry> {
        self.ensure_idle()?;
        let entry = self.list.remove(id)?;
        self.drag.leave(id);
        Ok(entry)
    }

    /// Empty the list after confirmation. Returns whether it was cleared.
    pub fn clear_all(&mut self, confirm: &mut dyn Confirm) -> Result<bool> {
        self.ensure_idle()?;
        let cleared = self.list.clear_all(confirm);
        if cleared {
            self.drag.end();
        }
        Ok(cleared)
    }

    /// Move the entry at `from` to position `to`.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<bool> {
        self.ensure_idle()?;
        self.list.reorder(from, to)
    }

    /// Start dragging the entry `id`.
    ///
    /// # Errors
    ///
    /// [`PdfMergeError::UnknownEntry`] if `id` is not staged.
    pub fn drag_start(&mut self, id: EntryId) -> Result<()> {
        self.ensure_idle()?;
        self.list.position_of(id)?;
        self.drag.start(id);
        Ok(())
    }

    /// Pointer entered the row of `id`. Returns whether it is highlighted.
    pub fn drag_over(&mut self, id: EntryId) -> bool {
        self.drag.hover(id)
    }

    /// Pointer left the row of `id`.
    pub fn drag_leave(&mut self, id: EntryId) {
        self.drag.leave(id);
    }

    /// Drag released outside any row.
    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    /// Drag released over the row of `id`. Returns whether the list changed.
    pub fn drop_on(&mut self, id: EntryId) -> Result<bool> {
        if self.merging {
            self.drag.end();
            return Err(PdfMergeError::MergeInProgress);
        }
        self.drag.drop_on(&mut self.list, id)
    }

    /// Rows for display.
    pub fn rows(&self) -> Vec<EntryRow> {
        self.list.rows()
    }

    /// Current display state.
    pub fn view(&self) -> WorkspaceView {
        let Visibility {
            list_visible,
            merge_enabled,
        } = self.list.visibility();

        WorkspaceView {
            list_visible,
            merge_enabled: merge_enabled && !self.merging,
            merging: self.merging,
            file_count: self.list.len(),
            total_size: format_file_size(self.list.total_size()),
            output_name: self.output_name.clone(),
            rows: self.list.rows(),
        }
    }

    /// Freeze the list and snapshot it for a merge.
    ///
    /// Pair every successful call with [`Workspace::finish_merge`].
    ///
    /// # Errors
    ///
    /// [`PdfMergeError::InsufficientFiles`] with fewer than two entries,
    /// [`PdfMergeError::MergeInProgress`] if a merge is already running.
    /// Neither changes any state.
    pub fn begin_merge(&mut self) -> Result<MergeJob<E>> {
        self.ensure_idle()?;
        if self.list.len() < MIN_MERGE_FILES {
            return Err(PdfMergeError::InsufficientFiles {
                count: self.list.len(),
            });
        }

        self.drag.end();
        self.merging = true;
        Ok(MergeJob {
            orchestrator: self.orchestrator.clone(),
            entries: self.list.snapshot(),
            output_name: self.output_name.clone(),
        })
    }

    /// Unfreeze the list after a merge.
    pub fn finish_merge(&mut self) {
        self.merging = false;
    }

    /// Merge the staged files and return the artifact.
    ///
    /// On success the finished progress stays visible for the display delay
    /// before `sink` is reset; on failure it is reset at once. The workspace
    /// is back to its pre-merge state in both cases.
    ///
    /// # Errors
    ///
    /// Anything [`Workspace::begin_merge`] or [`MergeJob::run`] returns.
    pub async fn merge(&mut self, sink: &mut dyn ProgressSink) -> Result<MergedArtifact> {
        self.merge_into(sink, &mut KeepArtifact).await
    }

    /// Merge the staged files and hand the artifact to `delivery`.
    ///
    /// Delivery happens before `Done` is reported and before the display
    /// delay starts; a failed delivery takes the failure path.
    ///
    /// # Errors
    ///
    /// Anything [`Workspace::begin_merge`] or [`MergeJob::run_into`] returns.
    pub async fn merge_into(
        &mut self,
        sink: &mut dyn ProgressSink,
        delivery: &mut dyn Deliver,
    ) -> Result<MergedArtifact> {
        let job = self.begin_merge()?;
        let result = job.run_into(sink, delivery).await;

        if result.is_ok() && !self.display_delay.is_zero() {
            tokio::time::sleep(self.display_delay).await;
        }
        sink.reset();
        self.finish_merge();

        result
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.merging {
            return Err(PdfMergeError::MergeInProgress);
        }
        Ok(())
    }
}
