//! # Undo/Redo Stack
//!
//! Tracks committed changes so they can be undone and redone.
//!
//! ## Design
//!
//! - Every saved transaction is recorded as one [`DocumentChange`]
//! - Undo takes the latest change; the document applies its inverse and
//!   parks the inverse on the redo side
//! - Redo is symmetric: inverting a parked inverse yields the original
//! - Recording a fresh change clears the redo side
//! - The undo side is capped at `max_levels` (oldest entries are dropped)

use crate::change::DocumentChange;

/// Default number of undo levels kept
pub const DEFAULT_UNDO_LEVELS: usize = 100;

/// `done` / `undone` stacks of document changes
#[derive(Debug)]
pub struct UndoStack {
    /// Applied changes (most recent last)
    done: Vec<DocumentChange>,

    /// Inverses of undone changes (most recent last)
    undone: Vec<DocumentChange>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    /// Stack capped at [`DEFAULT_UNDO_LEVELS`]
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_UNDO_LEVELS)
    }

    /// Stack capped at `max_levels` (0 = unlimited)
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            max_levels,
        }
    }

    /// Records a freshly saved change and clears the redo side
    pub fn record(&mut self, change: DocumentChange) {
        self.push_done(change);
        self.undone.clear();
    }

    /// Change the next undo reverts
    pub fn take_undo(&mut self) -> Option<DocumentChange> {
        self.done.pop()
    }

    /// Change the next redo re-applies
    pub fn take_redo(&mut self) -> Option<DocumentChange> {
        self.undone.pop()
    }

    /// Pushes onto the undo side, leaving the redo side alone
    pub fn push_done(&mut self, change: DocumentChange) {
        self.done.push(change);

        if self.max_levels > 0 && self.done.len() > self.max_levels {
            self.done.remove(0);
        }
    }

    pub fn push_undone(&mut self, change: DocumentChange) {
        self.undone.push(change);
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.done.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.undone.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// The change the next undo would revert
    pub fn last_done(&self) -> Option<&DocumentChange> {
        self.done.last()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
