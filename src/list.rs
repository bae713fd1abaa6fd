//! The ordered list of staged PDF files.
//!
//! [`FileList`] owns every [`DocumentEntry`] a user has selected. Order is
//! insertion order until the user reorders it, and it is the order pages end
//! up in the merged document. Names are unique: a second file with a name
//! already present is dropped without replacing the first.
//!
//! Entries carry a stable [`EntryId`] so callers (the drag session, rendered
//! rows) can refer to an entry without holding on to a position that a
//! reorder may have invalidated.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{PdfMergeError, Result};
use crate::source::FileSource;
use crate::utils::format_file_size;

/// Prompt shown before the list is emptied.
pub const CLEAR_ALL_PROMPT: &str = "Are you sure you want to remove all files?";

/// Minimum number of entries needed to merge.
pub const MIN_MERGE_FILES: usize = 2;

/// Stable identifier of a staged entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One file staged for merging.
///
/// The content is not loaded when the entry is created; it is read through
/// [`DocumentEntry::read_content`] when a merge reaches the entry.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    id: EntryId,
    source: Arc<dyn FileSource>,
}

impl DocumentEntry {
    /// Stable identifier.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// File name, unique within the list.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.source.size()
    }

    /// Underlying file handle.
    pub fn source(&self) -> &Arc<dyn FileSource> {
        &self.source
    }

    /// Read the full content of the file.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::ReadFailed`] if the handle cannot be read.
    pub async fn read_content(&self) -> Result<Vec<u8>> {
        self.source
            .read_all()
            .await
            .map_err(|source| PdfMergeError::ReadFailed {
                name: self.name().to_string(),
                source,
            })
    }
}

/// What happened to a batch of candidates passed to [`FileList::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOutcome {
    /// Ids of newly appended entries, in append order.
    pub added: Vec<EntryId>,
    /// Names skipped because an entry with that name already exists.
    pub duplicates: Vec<String>,
    /// Number of candidates whose declared type was not `application/pdf`.
    pub rejected: usize,
}

/// Which parts of the workspace should be shown for the current list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    /// The list section has at least one entry to show.
    pub list_visible: bool,
    /// The merge action is available.
    pub merge_enabled: bool,
}

impl Visibility {
    /// Compute visibility for a list of `len` entries.
    pub fn for_len(len: usize) -> Self {
        Self {
            list_visible: len >= 1,
            merge_enabled: len >= MIN_MERGE_FILES,
        }
    }
}

/// A rendered list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRow {
    /// 1-based position in the list.
    pub position: usize,
    /// Stable entry id.
    pub id: EntryId,
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Human-readable size.
    pub size_display: String,
}

/// Yes/no confirmation used before destructive list operations.
pub trait Confirm {
    /// Ask `prompt`; `true` means the user agreed.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Ordered, name-deduplicated collection of staged files.
#[derive(Debug, Default)]
pub struct FileList {
    entries: Vec<DocumentEntry>,
    next_id: u64,
}

impl FileList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a batch of candidate files.
    ///
    /// Only candidates declared as `application/pdf` are considered. Each one
    /// is appended unless an entry with the same name already exists, in which
    /// case it is skipped and the existing entry is kept.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::NoValidFiles`] and leaves the list untouched if
    /// no candidate is a PDF.
    pub fn add<I>(&mut self, candidates: I) -> Result<AddOutcome>
    where
        I: IntoIterator<Item = Arc<dyn FileSource>>,
    {
        let (valid, rejected): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|file| file.is_pdf());

        if valid.is_empty() {
            tracing::debug!(rejected = rejected.len(), "selection contained no PDF");
            return Err(PdfMergeError::NoValidFiles {
                rejected: rejected.len(),
            });
        }

        let mut outcome = AddOutcome {
            rejected: rejected.len(),
            ..AddOutcome::default()
        };

        for source in valid {
            if self.contains_name(source.name()) {
                tracing::debug!(name = source.name(), "skipping duplicate name");
                outcome.duplicates.push(source.name().to_string());
                continue;
            }

            let id = EntryId(self.next_id);
            self.next_id += 1;
            tracing::debug!(%id, name = source.name(), "staged file");
            self.entries.push(DocumentEntry { id, source });
            outcome.added.push(id);
        }

        Ok(outcome)
    }

    /// Remove the entry at `index`, shifting later entries left.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::IndexOutOfRange`] without touching the list if
    /// `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> Result<DocumentEntry> {
        self.check_index(index)?;
        let entry = self.entries.remove(index);
        tracing::debug!(index, name = entry.name(), "removed file");
        Ok(entry)
    }

    /// Remove the entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::UnknownEntry`] if no entry has that id.
    pub fn remove(&mut self, id: EntryId) -> Result<DocumentEntry> {
        let index = self.position_of(id)?;
        self.remove_at(index)
    }

    /// Empty the list if `confirm` agrees to [`CLEAR_ALL_PROMPT`].
    ///
    /// Returns whether the list was cleared.
    pub fn clear_all(&mut self, confirm: &mut dyn Confirm) -> bool {
        if !confirm.confirm(CLEAR_ALL_PROMPT) {
            return false;
        }
        tracing::debug!(count = self.entries.len(), "cleared all files");
        self.entries.clear();
        true
    }

    /// Move the entry at `from` so that it ends up at position `to`.
    ///
    /// This is a single-element move: the entry is taken out and reinserted at
    /// `to`, every other entry keeps its relative order. Equal indices are a
    /// no-op. Returns whether the list changed.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::IndexOutOfRange`] without touching the list if
    /// either index is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool> {
        self.check_index(from)?;
        self.check_index(to)?;

        if from == to {
            return Ok(false);
        }

        let entry = self.entries.remove(from);
        tracing::debug!(from, to, name = entry.name(), "moved file");
        self.entries.insert(to, entry);
        Ok(true)
    }

    /// Current position of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`PdfMergeError::UnknownEntry`] if no entry has that id.
    pub fn position_of(&self, id: EntryId) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(PdfMergeError::UnknownEntry { id: id.0 })
    }

    /// Entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&DocumentEntry> {
        self.entries.get(index)
    }

    /// All entries in merge order.
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    /// Number of staged entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the sizes of all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(DocumentEntry::size).sum()
    }

    /// Visibility of the list section and merge action.
    pub fn visibility(&self) -> Visibility {
        Visibility::for_len(self.entries.len())
    }

    /// Copy of the entries, detached from later list mutations.
    pub fn snapshot(&self) -> Vec<DocumentEntry> {
        self.entries.clone()
    }

    /// Rows for display.
    pub fn rows(&self) -> Vec<EntryRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| EntryRow {
                position: index + 1,
                id: entry.id,
                name: entry.name().to_string(),
                size: entry.size(),
                size_display: format_file_size(entry.size()),
            })
            .collect()
    }

    fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name() == name)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(PdfMergeError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }
}
