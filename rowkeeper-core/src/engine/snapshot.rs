//! Reversible order snapshots

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{LeafId, OrderEntry};
use crate::provider::ItemProvider;

/// The unified order plus every group assignment at one point in time
///
/// Restoring a snapshot is the hook an undo stack needs: take one before a
/// mutation, restore it to revert the mutation as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub(crate) entries: Vec<OrderEntry>,
    pub(crate) groups: BTreeSet<String>,
    pub(crate) assignments: BTreeMap<LeafId, Option<String>>,
}

impl OrderSnapshot {
    pub(crate) fn capture(entries: &[OrderEntry], provider: &dyn ItemProvider) -> Self {
        Self {
            entries: entries.to_vec(),
            groups: provider.list_groups().into_iter().collect(),
            assignments: provider
                .list_leaves()
                .into_iter()
                .map(|leaf| (leaf.id, leaf.group_name))
                .collect(),
        }
    }

    /// Captured order
    #[must_use]
    pub fn entries(&self) -> &[OrderEntry] {
        &self.entries
    }

    /// Captured group names
    #[must_use]
    pub const fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Captured group of a leaf
    #[must_use]
    pub fn group_of(&self, leaf: &LeafId) -> Option<&str> {
        self.assignments.get(leaf).and_then(|g| g.as_deref())
    }
}
