//! Multi-selection that follows reordered entries
//!
//! Selected positions are logical indices into the unified order. After
//! every order mutation the set is remapped through the same primitive
//! edits the mutation applied, so the selection stays on the entries the
//! user picked rather than on the positions they used to occupy.

use std::collections::BTreeSet;

use crate::order::IndexEdit;

/// Remaps a selection after moving the entry at `old` to final position `new`
///
/// Indices strictly between the two positions (plus the far boundary) shift
/// one step opposite to the move; the moved entry's membership follows it.
#[must_use]
pub fn remap_after_move(old: usize, new: usize, selection: &BTreeSet<usize>) -> BTreeSet<usize> {
    selection
        .iter()
        .map(|&index| {
            if index == old {
                new
            } else if old < new && index > old && index <= new {
                index - 1
            } else if new < old && index >= new && index < old {
                index + 1
            } else {
                index
            }
        })
        .collect()
}

/// Tracks selected logical indices across order mutations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<usize>,
}

impl SelectionTracker {
    /// Creates an empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selection from indices
    #[must_use]
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            selected: indices.into_iter().collect(),
        }
    }

    /// Selected indices in ascending order
    #[must_use]
    pub const fn indices(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    /// Returns true if the index is selected
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Number of selected entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns true if nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Adds an index
    pub fn select(&mut self, index: usize) {
        self.selected.insert(index);
    }

    /// Removes an index
    pub fn deselect(&mut self, index: usize) {
        self.selected.remove(&index);
    }

    /// Flips an index, returning whether it is now selected
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.selected.remove(&index) {
            false
        } else {
            self.selected.insert(index);
            true
        }
    }

    /// Replaces the whole selection
    pub fn set(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.selected = indices.into_iter().collect();
    }

    /// Clears the selection
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Follows a move of `old` to final position `new`
    pub fn remap_after_move(&mut self, old: usize, new: usize) {
        if old != new {
            self.selected = remap_after_move(old, new, &self.selected);
        }
    }

    /// Follows the removal of the entry at `index`; its selection is dropped
    pub fn remap_after_remove(&mut self, index: usize) {
        self.selected = self
            .selected
            .iter()
            .filter(|&&i| i != index)
            .map(|&i| if i > index { i - 1 } else { i })
            .collect();
    }

    /// Follows an insertion at `index`; the new entry is not selected
    pub fn remap_after_insert(&mut self, index: usize) {
        self.selected = self
            .selected
            .iter()
            .map(|&i| if i >= index { i + 1 } else { i })
            .collect();
    }

    /// Applies edits in the order they were made
    pub fn apply_edits(&mut self, edits: &[IndexEdit]) {
        for edit in edits {
            match *edit {
                IndexEdit::Removed(index) => self.remap_after_remove(index),
                IndexEdit::Inserted(index) => self.remap_after_insert(index),
                IndexEdit::Moved { from, to } => self.remap_after_move(from, to),
            }
        }
    }

    /// Drops indices at or past `len`
    pub fn truncate(&mut self, len: usize) {
        self.selected.retain(|&i| i < len);
    }
}
