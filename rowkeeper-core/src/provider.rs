//! Item provider collaborator
//!
//! The engine never owns the items it orders. It reads them through
//! [`ItemProvider`] and re-checks existence by identifier on every lookup,
//! so nothing it holds can outlive an external deletion. Hosts report
//! external mutations back to the engine as [`ItemChange`] notifications.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{OrderError, OrderResult};
use crate::models::{Leaf, LeafId, compare_leaves_by_name};

/// Access to the externally-owned item set
pub trait ItemProvider {
    /// Returns every live leaf
    fn list_leaves(&self) -> Vec<Leaf>;

    /// Returns every live group name
    fn list_groups(&self) -> Vec<String>;

    /// Returns the stored group name of a leaf, even if it names no live group
    fn leaf_group_name(&self, id: &LeafId) -> Option<String>;

    /// Sets or clears the group name of a leaf
    ///
    /// # Errors
    ///
    /// Returns `OrderError::LeafNotFound` if the leaf no longer exists.
    fn set_leaf_group_name(&mut self, id: &LeafId, name: Option<&str>) -> OrderResult<()>;

    /// Creates an empty group
    ///
    /// # Errors
    ///
    /// Returns `OrderError::GroupExists` if the name is taken.
    fn create_group(&mut self, name: &str) -> OrderResult<()>;

    /// Renames a group and every member's `group_name`
    ///
    /// # Errors
    ///
    /// Returns `OrderError::GroupNotFound` if `old` is not live, or
    /// `OrderError::GroupExists` if `new` is taken.
    fn rename_group(&mut self, old: &str, new: &str) -> OrderResult<()>;

    /// Removes a group; its members become ungrouped
    ///
    /// # Errors
    ///
    /// Returns `OrderError::GroupNotFound` if the group is not live.
    fn remove_group(&mut self, name: &str) -> OrderResult<()>;

    /// Looks up a single leaf
    fn leaf(&self, id: &LeafId) -> Option<Leaf> {
        self.list_leaves().into_iter().find(|leaf| &leaf.id == id)
    }

    /// Returns true if the group is live
    fn has_group(&self, name: &str) -> bool {
        self.list_groups().iter().any(|g| g == name)
    }
}

/// External mutation of the item set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    /// A leaf was added
    LeafAdded(LeafId),
    /// A leaf was deleted
    LeafRemoved(LeafId),
    /// A leaf's display name changed
    LeafRenamed(LeafId),
    /// A leaf's group assignment changed outside the engine
    LeafRegrouped(LeafId),
    /// A group was created
    GroupAdded(String),
    /// A group was deleted
    GroupRemoved(String),
    /// A group was renamed
    GroupRenamed {
        /// Previous name
        old: String,
        /// New name
        new: String,
    },
}

/// Immutable view of the live item set taken at one point in time
///
/// All order logic works against a snapshot so a single pass sees a
/// consistent item set.
#[derive(Debug, Clone, Default)]
pub struct LiveItems {
    leaves: BTreeMap<LeafId, Leaf>,
    groups: BTreeSet<String>,
}

impl LiveItems {
    /// Builds a snapshot from raw parts
    #[must_use]
    pub fn new(leaves: impl IntoIterator<Item = Leaf>, groups: impl IntoIterator<Item = String>) -> Self {
        Self {
            leaves: leaves.into_iter().map(|l| (l.id.clone(), l)).collect(),
            groups: groups.into_iter().collect(),
        }
    }

    /// Takes a snapshot of a provider
    #[must_use]
    pub fn capture(provider: &dyn ItemProvider) -> Self {
        Self::new(provider.list_leaves(), provider.list_groups())
    }

    /// Looks up a leaf
    #[must_use]
    pub fn leaf(&self, id: &str) -> Option<&Leaf> {
        self.leaves.get(&LeafId::new(id))
    }

    /// Returns true if the group is live
    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    /// Live group names in sorted order
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// All live leaves
    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.leaves.values()
    }

    /// The group a leaf is rendered under
    ///
    /// A `group_name` that names no live group is an orphan and the leaf is
    /// treated as ungrouped.
    #[must_use]
    pub fn effective_group<'a>(&self, leaf: &'a Leaf) -> Option<&'a str> {
        leaf.group_name
            .as_deref()
            .filter(|name| self.groups.contains(*name))
    }

    /// Returns true if the leaf sits at top level
    #[must_use]
    pub fn is_ungrouped(&self, leaf: &Leaf) -> bool {
        self.effective_group(leaf).is_none()
    }

    /// Members of a group sorted by display name
    #[must_use]
    pub fn members(&self, group: &str) -> Vec<&Leaf> {
        let mut members: Vec<&Leaf> = self
            .leaves
            .values()
            .filter(|leaf| self.effective_group(leaf) == Some(group))
            .collect();
        members.sort_by(|a, b| compare_leaves_by_name(a, b));
        members
    }

    /// Ungrouped leaves sorted by display name
    #[must_use]
    pub fn ungrouped_sorted(&self) -> Vec<&Leaf> {
        let mut leaves: Vec<&Leaf> = self.leaves.values().filter(|l| self.is_ungrouped(l)).collect();
        leaves.sort_by(|a, b| compare_leaves_by_name(a, b));
        leaves
    }

    /// Number of live leaves
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }
}

/// Provider that keeps the item set in memory
///
/// Its inherent mutators model changes made by other parts of the host and
/// return the notification to forward to the engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    leaves: HashMap<LeafId, Leaf>,
    groups: BTreeSet<String>,
}

impl InMemoryProvider {
    /// Creates an empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider from leaves and group names
    #[must_use]
    pub fn with_items<L, G, S>(leaves: L, groups: G) -> Self
    where
        L: IntoIterator<Item = Leaf>,
        G: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            leaves: leaves.into_iter().map(|l| (l.id.clone(), l)).collect(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds or replaces a leaf
    pub fn add_leaf(&mut self, leaf: Leaf) -> ItemChange {
        let id = leaf.id.clone();
        self.leaves.insert(id.clone(), leaf);
        ItemChange::LeafAdded(id)
    }

    /// Deletes a leaf
    pub fn remove_leaf(&mut self, id: &LeafId) -> ItemChange {
        self.leaves.remove(id);
        ItemChange::LeafRemoved(id.clone())
    }

    /// Changes a leaf's display name
    pub fn rename_leaf(&mut self, id: &LeafId, name: impl Into<String>) -> ItemChange {
        if let Some(leaf) = self.leaves.get_mut(id) {
            leaf.name = name.into();
        }
        ItemChange::LeafRenamed(id.clone())
    }

    /// Sets a leaf's group name without going through the engine
    pub fn regroup_leaf(&mut self, id: &LeafId, group: Option<&str>) -> ItemChange {
        if let Some(leaf) = self.leaves.get_mut(id) {
            leaf.group_name = group.map(str::to_string);
        }
        ItemChange::LeafRegrouped(id.clone())
    }

    /// Adds a group name
    pub fn add_group(&mut self, name: impl Into<String>) -> ItemChange {
        let name = name.into();
        self.groups.insert(name.clone());
        ItemChange::GroupAdded(name)
    }

    /// Deletes a group name, leaving members' `group_name` dangling
    pub fn drop_group(&mut self, name: &str) -> ItemChange {
        self.groups.remove(name);
        ItemChange::GroupRemoved(name.to_string())
    }
}

impl ItemProvider for InMemoryProvider {
    fn list_leaves(&self) -> Vec<Leaf> {
        self.leaves.values().cloned().collect()
    }

    fn list_groups(&self) -> Vec<String> {
        self.groups.iter().cloned().collect()
    }

    fn leaf_group_name(&self, id: &LeafId) -> Option<String> {
        self.leaves.get(id).and_then(|l| l.group_name.clone())
    }

    fn set_leaf_group_name(&mut self, id: &LeafId, name: Option<&str>) -> OrderResult<()> {
        let leaf = self
            .leaves
            .get_mut(id)
            .ok_or_else(|| OrderError::LeafNotFound(id.to_string()))?;
        leaf.group_name = name.map(str::to_string);
        Ok(())
    }

    fn create_group(&mut self, name: &str) -> OrderResult<()> {
        if !self.groups.insert(name.to_string()) {
            return Err(OrderError::GroupExists(name.to_string()));
        }
        Ok(())
    }

    fn rename_group(&mut self, old: &str, new: &str) -> OrderResult<()> {
        if !self.groups.contains(old) {
            return Err(OrderError::GroupNotFound(old.to_string()));
        }
        if self.groups.contains(new) {
            return Err(OrderError::GroupExists(new.to_string()));
        }
        self.groups.remove(old);
        self.groups.insert(new.to_string());
        for leaf in self.leaves.values_mut() {
            if leaf.group_name.as_deref() == Some(old) {
                leaf.group_name = Some(new.to_string());
            }
        }
        Ok(())
    }

    fn remove_group(&mut self, name: &str) -> OrderResult<()> {
        if !self.groups.remove(name) {
            return Err(OrderError::GroupNotFound(name.to_string()));
        }
        for leaf in self.leaves.values_mut() {
            if leaf.group_name.as_deref() == Some(name) {
                leaf.group_name = None;
            }
        }
        Ok(())
    }

    fn leaf(&self, id: &LeafId) -> Option<Leaf> {
        self.leaves.get(id).cloned()
    }

    fn has_group(&self, name: &str) -> bool {
        self.groups.contains(name)
    }
}
