//! Drag-to-reorder interaction state.
//!
//! A [`DragSession`] follows one pointer gesture over the file list:
//!
//! ```text
//! Idle --start(i)--> Dragging(i) --drop(j)--> Idle   (reorder i -> j if i != j)
//!                    Dragging(i) --end()----> Idle   (no change)
//! ```
//!
//! Sessions are keyed by [`EntryId`], not by position, so a row rendered
//! before a reorder still refers to the right entry afterwards. Hovering only
//! tracks drop-target highlights; it never touches the list.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::list::{EntryId, FileList};

/// Current phase of the drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// An entry is being dragged.
    Dragging {
        /// Entry picked up at drag start.
        source: EntryId,
    },
}

/// Drag session over a [`FileList`].
#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
    drop_targets: BTreeSet<EntryId>,
}

impl DragSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Entry being dragged, if any.
    pub fn source(&self) -> Option<EntryId> {
        match self.state {
            DragState::Dragging { source } => Some(source),
            DragState::Idle => None,
        }
    }

    /// Entries currently highlighted as drop targets.
    pub fn drop_targets(&self) -> &BTreeSet<EntryId> {
        &self.drop_targets
    }

    /// Pick up an entry. A session already in progress is replaced.
    pub fn start(&mut self, source: EntryId) {
        if let Some(previous) = self.source() {
            tracing::debug!(%previous, %source, "replacing active drag");
        }
        self.drop_targets.clear();
        self.state = DragState::Dragging { source };
    }

    /// Pointer moved over `target`.
    ///
    /// Returns whether `target` is now highlighted. The dragged entry itself
    /// is never a drop target, and nothing is highlighted while idle.
    pub fn hover(&mut self, target: EntryId) -> bool {
        match self.state {
            DragState::Dragging { source } if source != target => {
                self.drop_targets.insert(target);
                true
            }
            _ => false,
        }
    }

    /// Pointer left `target`.
    pub fn leave(&mut self, target: EntryId) {
        self.drop_targets.remove(&target);
    }

    /// Drag abandoned without a drop. The list is not modified.
    pub fn end(&mut self) {
        self.state = DragState::Idle;
        self.drop_targets.clear();
    }

    /// Drop the dragged entry onto `target`.
    ///
    /// Moves the dragged entry to the target's current position when the two
    /// differ. The session returns to idle and every highlight is cleared
    /// whatever the outcome. Returns whether the list changed; dropping while
    /// idle changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PdfMergeError::UnknownEntry`] if either entry is no
    /// longer in the list.
    pub fn drop_on(&mut self, list: &mut FileList, target: EntryId) -> Result<bool> {
        let state = std::mem::take(&mut self.state);
        self.drop_targets.clear();

        let DragState::Dragging { source } = state else {
            return Ok(false);
        };

        if source == target {
            return Ok(false);
        }

        let from = list.position_of(source)?;
        let to = list.position_of(target)?;
        list.reorder(from, to)
    }
}
