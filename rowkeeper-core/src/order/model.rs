//! Unified order model and its mutations

use std::collections::HashSet;

use super::edit::{IndexEdit, OrderChange};
use crate::error::{OrderError, OrderResult};
use crate::models::{LeafId, OrderEntry};
use crate::provider::{ItemProvider, LiveItems};

/// Upper bound on numeric suffixes tried by [`unique_group_name`]
const MAX_NAME_SUFFIX: u32 = 10_000;

/// The logical top-level sequence of groups and ungrouped leaves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderModel {
    entries: Vec<OrderEntry>,
}

impl OrderModel {
    /// Creates a model from an already repaired order
    #[must_use]
    pub fn new(entries: Vec<OrderEntry>) -> Self {
        Self { entries }
    }

    /// The logical sequence
    #[must_use]
    pub fn entries(&self) -> &[OrderEntry] {
        &self.entries
    }

    /// Number of logical entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the order is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical index of an entry
    #[must_use]
    pub fn position(&self, entry: &OrderEntry) -> Option<usize> {
        self.entries.iter().position(|e| e == entry)
    }

    /// Returns true if the entry is part of the order
    #[must_use]
    pub fn contains(&self, entry: &OrderEntry) -> bool {
        self.position(entry).is_some()
    }

    /// Replaces the whole sequence, e.g. after a repair pass
    pub fn replace(&mut self, entries: Vec<OrderEntry>) {
        self.entries = entries;
    }

    // ========== Index Translation ==========

    /// Position of an entry among the visible top-level rows
    ///
    /// Returns `None` if the entry is not currently visible at top level.
    #[must_use]
    pub fn top_level_visual_index_of(
        &self,
        entry: &OrderEntry,
        visible: &HashSet<OrderEntry>,
    ) -> Option<usize> {
        if !visible.contains(entry) {
            return None;
        }
        let mut visual = 0;
        for e in &self.entries {
            if e == entry {
                return Some(visual);
            }
            if visible.contains(e) {
                visual += 1;
            }
        }
        None
    }

    /// Translates a visual insertion point back into a logical index
    ///
    /// Walks the order, skipping entries that are not visible at top level
    /// and the excluded entry (the one being dragged), and returns the logical
    /// index of the visible entry currently occupying `target_visual`. Past the
    /// last visible row the result is the end of the order.
    #[must_use]
    pub fn insertion_logical_index_for(
        &self,
        target_visual: usize,
        excluding: Option<&OrderEntry>,
        visible: &HashSet<OrderEntry>,
    ) -> usize {
        let mut visual = 0;
        for (logical, entry) in self.entries.iter().enumerate() {
            if Some(entry) == excluding || !visible.contains(entry) {
                continue;
            }
            if visual == target_visual {
                return logical;
            }
            visual += 1;
        }
        self.entries.len()
    }

    /// Number of visible top-level rows, ignoring the excluded entry
    #[must_use]
    pub fn visible_count(
        &self,
        excluding: Option<&OrderEntry>,
        visible: &HashSet<OrderEntry>,
    ) -> usize {
        self.entries
            .iter()
            .filter(|e| Some(*e) != excluding && visible.contains(*e))
            .count()
    }

    // ========== Reordering ==========

    /// Moves an entry so it lands before whatever sits at `to_logical`
    ///
    /// Remove-then-insert: when the removal index is before the insertion
    /// index the insertion index is decremented, so the result does not
    /// depend on the direction of the move.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EntryNotFound` if the entry is not in the order.
    pub fn move_entry(&mut self, entry: &OrderEntry, to_logical: usize) -> OrderResult<OrderChange> {
        let from = self
            .position(entry)
            .ok_or_else(|| OrderError::EntryNotFound(entry.to_string()))?;

        let mut to = to_logical.min(self.entries.len());
        if from < to {
            to -= 1;
        }

        let moved = self.entries.remove(from);
        self.entries.insert(to, moved);

        tracing::debug!(entry = %entry, from, to, "Moved order entry");
        Ok(OrderChange::Moved {
            entry: entry.clone(),
            from,
            to,
        })
    }

    /// Removes an entry from the order
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EntryNotFound` if the entry is not in the order.
    pub fn remove_entry(&mut self, entry: &OrderEntry) -> OrderResult<OrderChange> {
        let index = self
            .position(entry)
            .ok_or_else(|| OrderError::EntryNotFound(entry.to_string()))?;
        self.entries.remove(index);
        Ok(OrderChange::EntryRemoved {
            entry: entry.clone(),
            index,
        })
    }

    // ========== Grouping ==========

    /// Assigns a leaf to a group, or makes it ungrouped with `None`
    ///
    /// Joining a group drops the leaf's top-level entry. Leaving a group
    /// appends a top-level entry if the leaf has none.
    ///
    /// # Errors
    ///
    /// Returns `LeafNotFound` or `GroupNotFound` for stale identifiers.
    pub fn assign_to_group(
        &mut self,
        provider: &mut dyn ItemProvider,
        leaf_id: &LeafId,
        group: Option<&str>,
    ) -> OrderResult<OrderChange> {
        let leaf = provider
            .leaf(leaf_id)
            .ok_or_else(|| OrderError::LeafNotFound(leaf_id.to_string()))?;
        let entry = OrderEntry::leaf(leaf_id.as_str());

        let Some(group) = group else {
            if leaf.group_name.is_some() {
                provider.set_leaf_group_name(leaf_id, None)?;
            }
            let appended = if self.contains(&entry) {
                None
            } else {
                self.entries.push(entry);
                Some(self.entries.len() - 1)
            };
            if leaf.group_name.is_none() && appended.is_none() {
                return Ok(OrderChange::Unchanged);
            }
            tracing::debug!(leaf = %leaf_id, "Leaf ungrouped");
            return Ok(OrderChange::Ungrouped {
                leaf: leaf_id.clone(),
                appended,
            });
        };

        if !provider.has_group(group) {
            return Err(OrderError::GroupNotFound(group.to_string()));
        }

        let current = leaf
            .group_name
            .as_deref()
            .filter(|name| provider.has_group(name));
        if current == Some(group) {
            return Ok(OrderChange::Unchanged);
        }

        provider.set_leaf_group_name(leaf_id, Some(group))?;
        let removed = self.position(&entry);
        if let Some(index) = removed {
            self.entries.remove(index);
        }

        tracing::debug!(leaf = %leaf_id, group, "Leaf merged into group");
        Ok(OrderChange::Merged {
            leaf: leaf_id.clone(),
            group: group.to_string(),
            removed,
        })
    }

    /// Creates a group holding two leaves
    ///
    /// The new group takes `leaf_a`'s top-level position (or `leaf_b`'s if
    /// `leaf_a` had none, or the end). Both leaves lose their top-level
    /// entries. The name is derived from `base_name` and made unique.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if both leaves are the same, `LeafNotFound`
    /// for stale leaves, or a provider error. On error neither the model nor
    /// the provider is changed.
    pub fn create_group_from_stack(
        &mut self,
        provider: &mut dyn ItemProvider,
        leaf_a: &LeafId,
        leaf_b: &LeafId,
        base_name: &str,
    ) -> OrderResult<OrderChange> {
        if leaf_a == leaf_b {
            return Err(OrderError::InvalidOperation(
                "cannot stack a leaf onto itself".to_string(),
            ));
        }
        let a = provider
            .leaf(leaf_a)
            .ok_or_else(|| OrderError::LeafNotFound(leaf_a.to_string()))?;
        let b = provider
            .leaf(leaf_b)
            .ok_or_else(|| OrderError::LeafNotFound(leaf_b.to_string()))?;

        let name = unique_group_name(base_name, |candidate| provider.has_group(candidate));
        provider.create_group(&name)?;

        let assigned = provider
            .set_leaf_group_name(leaf_a, Some(&name))
            .and_then(|()| provider.set_leaf_group_name(leaf_b, Some(&name)));
        if let Err(e) = assigned {
            // Removing the group clears both assignments before they are restored.
            let rollback = provider
                .remove_group(&name)
                .and_then(|()| provider.set_leaf_group_name(leaf_a, a.group_name.as_deref()))
                .and_then(|()| provider.set_leaf_group_name(leaf_b, b.group_name.as_deref()));
            if let Err(rollback_err) = rollback {
                tracing::warn!(error = %rollback_err, group = %name, "Stack rollback incomplete");
            }
            return Err(e);
        }

        let group_entry = OrderEntry::group(name.clone());
        let entry_a = OrderEntry::leaf(leaf_a.as_str());
        let entry_b = OrderEntry::leaf(leaf_b.as_str());
        let mut edits = Vec::with_capacity(3);

        if let Some(index) = self.position(&entry_a) {
            self.entries[index] = group_entry;
            edits.push(IndexEdit::Removed(index));
            edits.push(IndexEdit::Inserted(index));
            if let Some(b_index) = self.position(&entry_b) {
                self.entries.remove(b_index);
                edits.push(IndexEdit::Removed(b_index));
            }
        } else if let Some(index) = self.position(&entry_b) {
            self.entries[index] = group_entry;
            edits.push(IndexEdit::Removed(index));
            edits.push(IndexEdit::Inserted(index));
        } else {
            self.entries.push(group_entry);
            edits.push(IndexEdit::Inserted(self.entries.len() - 1));
        }

        tracing::info!(group = %name, leaf_a = %leaf_a, leaf_b = %leaf_b, "Stacked leaves into new group");
        Ok(OrderChange::Stacked {
            group: name,
            members: vec![leaf_a.clone(), leaf_b.clone()],
            edits,
        })
    }

    /// Renames a group in place, keeping its position and members
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a blank name, `GroupNotFound` or
    /// `GroupExists` from the provider.
    pub fn rename_group(
        &mut self,
        provider: &mut dyn ItemProvider,
        old: &str,
        new: &str,
    ) -> OrderResult<OrderChange> {
        let new = new.trim();
        if new.is_empty() {
            return Err(OrderError::InvalidOperation(
                "group name cannot be empty".to_string(),
            ));
        }
        if old == new {
            return Ok(OrderChange::Unchanged);
        }

        provider.rename_group(old, new)?;
        self.rename_group_entry(old, new);

        tracing::info!(old, new, "Group renamed");
        Ok(OrderChange::GroupRenamed {
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// Rewrites a group entry's identifier after the provider renamed it
    ///
    /// Returns true if an entry was rewritten.
    pub fn rename_group_entry(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.position(&OrderEntry::group(old)) else {
            return false;
        };
        if self.contains(&OrderEntry::group(new)) {
            self.entries.remove(index);
        } else {
            self.entries[index] = OrderEntry::group(new);
        }
        true
    }

    /// Deletes a group; its members are appended as top-level leaves
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if the group is not live.
    pub fn remove_group(
        &mut self,
        provider: &mut dyn ItemProvider,
        name: &str,
    ) -> OrderResult<OrderChange> {
        if !provider.has_group(name) {
            return Err(OrderError::GroupNotFound(name.to_string()));
        }
        let members: Vec<LeafId> = LiveItems::capture(provider)
            .members(name)
            .into_iter()
            .map(|leaf| leaf.id.clone())
            .collect();

        provider.remove_group(name)?;

        let mut edits = Vec::with_capacity(members.len() + 1);
        if let Some(index) = self.position(&OrderEntry::group(name)) {
            self.entries.remove(index);
            edits.push(IndexEdit::Removed(index));
        }
        for id in members {
            let entry = OrderEntry::leaf(id.as_str());
            if !self.contains(&entry) {
                self.entries.push(entry);
                edits.push(IndexEdit::Inserted(self.entries.len() - 1));
            }
        }

        tracing::info!(group = name, "Group removed");
        Ok(OrderChange::GroupRemoved {
            group: name.to_string(),
            edits,
        })
    }
}

/// Returns `base` if it is free, otherwise `base 2`, `base 3`, ...
///
/// `exists` reports whether a candidate name is taken.
#[must_use]
pub fn unique_group_name(base: &str, exists: impl Fn(&str) -> bool) -> String {
    let base = base.trim();
    if !exists(base) {
        return base.to_string();
    }
    for counter in 2..=MAX_NAME_SUFFIX {
        let candidate = format!("{base} {counter}");
        if !exists(&candidate) {
            return candidate;
        }
    }
    // Every suffix taken; fall back to a timestamped name.
    format!("{base} {}", chrono::Utc::now().timestamp_millis())
}
