//! Descriptions of applied order mutations
//!
//! Each successful mutation reports what it did as an [`OrderChange`]. The
//! change carries the primitive index edits in application order so that
//! index-based state (the selection) can follow along.

use crate::models::{LeafId, OrderEntry};

/// A primitive edit of the logical sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEdit {
    /// The entry at this index was removed
    Removed(usize),
    /// An entry was inserted at this index
    Inserted(usize),
    /// The entry at `from` now sits at `to` (final position)
    Moved {
        /// Index before the move
        from: usize,
        /// Index after the move
        to: usize,
    },
}

/// A completed order mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderChange {
    /// An entry changed position
    Moved {
        /// The moved entry
        entry: OrderEntry,
        /// Logical index before the move
        from: usize,
        /// Logical index after the move
        to: usize,
    },
    /// A leaf joined a group
    Merged {
        /// The leaf
        leaf: LeafId,
        /// The group it joined
        group: String,
        /// Index of the leaf's removed top-level entry
        removed: Option<usize>,
    },
    /// A leaf left its group and sits at top level
    Ungrouped {
        /// The leaf
        leaf: LeafId,
        /// Index where its top-level entry was appended
        appended: Option<usize>,
    },
    /// Two leaves were stacked into a new group
    Stacked {
        /// Synthesized group name
        group: String,
        /// The dragged leaf and the stack target
        members: Vec<LeafId>,
        /// Edits in application order
        edits: Vec<IndexEdit>,
    },
    /// A group was renamed in place
    GroupRenamed {
        /// Previous name
        old: String,
        /// New name
        new: String,
    },
    /// A group was removed and its members surfaced at top level
    GroupRemoved {
        /// Removed group
        group: String,
        /// Edits in application order
        edits: Vec<IndexEdit>,
    },
    /// An entry was removed from the order
    EntryRemoved {
        /// The removed entry
        entry: OrderEntry,
        /// Its former index
        index: usize,
    },
    /// Nothing changed
    Unchanged,
}

impl OrderChange {
    /// Index edits in application order
    #[must_use]
    pub fn edits(&self) -> Vec<IndexEdit> {
        match self {
            Self::Moved { from, to, .. } if from != to => vec![IndexEdit::Moved {
                from: *from,
                to: *to,
            }],
            Self::Merged {
                removed: Some(index),
                ..
            } => vec![IndexEdit::Removed(*index)],
            Self::Ungrouped {
                appended: Some(index),
                ..
            } => vec![IndexEdit::Inserted(*index)],
            Self::Stacked { edits, .. } | Self::GroupRemoved { edits, .. } => edits.clone(),
            Self::EntryRemoved { index, .. } => vec![IndexEdit::Removed(*index)],
            _ => Vec::new(),
        }
    }

    /// Returns true if the order or any group assignment changed
    #[must_use]
    pub fn is_change(&self) -> bool {
        match self {
            Self::Unchanged => false,
            Self::Moved { from, to, .. } => from != to,
            _ => true,
        }
    }
}
