//! Filtering and sorting into the visual sequence
//!
//! [`build_visual_rows`] is a pure function of the live items, the unified
//! order, the filter criteria, the sort key and the collapsed-group set.
//!
//! Manual placement and algorithmic sorting are mutually exclusive per
//! pass. With [`SortKey::Custom`] the unified order is honored exactly and
//! groups nest their members. With any other key grouping is bypassed and
//! every filtered leaf is listed flat, ordered by that key with a
//! tie-break chain that always ends on the leaf ID.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{EntryKind, Leaf, LeafId, OrderEntry, compare_leaves_by_name};
use crate::provider::LiveItems;

/// How the visual sequence is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Manual unified order with nested groups
    #[default]
    Custom,
    /// Display name, ascending
    Name,
    /// Numeric version, newest first
    Version,
    /// Last activity, most recent first
    LastActivity,
    /// Usage count, most used first
    UsageCount,
}

impl SortKey {
    /// Returns true if manual placement is honored
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Custom => "custom",
            Self::Name => "name",
            Self::Version => "version",
            Self::LastActivity => "last_activity",
            Self::UsageCount => "usage_count",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "custom" | "manual" => Ok(Self::Custom),
            "name" => Ok(Self::Name),
            "version" => Ok(Self::Version),
            "last_activity" | "recent" => Ok(Self::LastActivity),
            "usage_count" | "usage" => Ok(Self::UsageCount),
            _ => Err(()),
        }
    }
}

/// Active search, tag and group filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against name, ID, tags and group
    pub search: Option<String>,
    /// Tags a leaf must all carry (case-insensitive)
    pub tags: Vec<String>,
    /// Only leaves rendered under this group
    pub group: Option<String>,
}

impl FilterCriteria {
    /// No filtering
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Sets the search query
    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Adds a required tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Restricts to one group
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Returns true if any filter narrows the item set
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.search.as_deref().is_some_and(|q| !q.trim().is_empty())
            || !self.tags.is_empty()
            || self.group.is_some()
    }

    /// Returns true if the leaf passes every active filter
    #[must_use]
    pub fn matches(&self, leaf: &Leaf, live: &LiveItems) -> bool {
        let group = live.effective_group(leaf);

        if let Some(wanted) = self.group.as_deref()
            && group != Some(wanted)
        {
            return false;
        }

        if !self.tags.is_empty() {
            let leaf_tags: Vec<String> = leaf.tags.iter().map(|t| t.to_lowercase()).collect();
            if !self
                .tags
                .iter()
                .all(|tag| leaf_tags.contains(&tag.to_lowercase()))
            {
                return false;
            }
        }

        if let Some(query) = self.search.as_deref().map(str::trim)
            && !query.is_empty()
        {
            let query = query.to_lowercase();
            let hit = leaf.name.to_lowercase().contains(&query)
                || leaf.id.as_str().to_lowercase().contains(&query)
                || leaf.tags.iter().any(|t| t.to_lowercase().contains(&query))
                || group.is_some_and(|g| g.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// One rendered top-level row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisualRow {
    /// A group header with its visible members in internal sort order
    Group {
        /// Group name
        name: String,
        /// Members that pass the filters, sorted by name
        members: Vec<LeafId>,
        /// Whether members are shown beneath the header
        expanded: bool,
    },
    /// An ungrouped leaf, or any leaf in a flat sorted list
    Leaf {
        /// Leaf ID
        id: LeafId,
    },
}

impl VisualRow {
    /// The order entry this row stands for
    #[must_use]
    pub fn entry(&self) -> OrderEntry {
        match self {
            Self::Group { name, .. } => OrderEntry::group(name.clone()),
            Self::Leaf { id } => OrderEntry::leaf(id.as_str()),
        }
    }

    /// Returns true for group rows
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }
}

/// Output of one filter/sort pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisualLayout {
    rows: Vec<VisualRow>,
    sort_key: SortKey,
}

impl VisualLayout {
    /// Top-level rows in display order
    #[must_use]
    pub fn rows(&self) -> &[VisualRow] {
        &self.rows
    }

    /// Sort key the layout was built with
    #[must_use]
    pub const fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Returns true if rows follow the manual order
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        self.sort_key.is_manual()
    }

    /// Entries that occupy a top-level row
    #[must_use]
    pub fn top_level_entries(&self) -> HashSet<OrderEntry> {
        self.rows.iter().map(VisualRow::entry).collect()
    }

    /// Visual index of an entry
    #[must_use]
    pub fn position_of(&self, entry: &OrderEntry) -> Option<usize> {
        self.rows.iter().position(|row| &row.entry() == entry)
    }

    /// Every leaf shown, nested members included, in display order
    #[must_use]
    pub fn visible_leaves(&self) -> Vec<LeafId> {
        let mut out = Vec::new();
        for row in &self.rows {
            match row {
                VisualRow::Leaf { id } => out.push(id.clone()),
                VisualRow::Group {
                    members, expanded, ..
                } if *expanded => out.extend(members.iter().cloned()),
                VisualRow::Group { .. } => {}
            }
        }
        out
    }

    /// Number of top-level rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing is shown
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds the visual sequence
#[must_use]
pub fn build_visual_rows(
    live: &LiveItems,
    order: &[OrderEntry],
    criteria: &FilterCriteria,
    sort_key: SortKey,
    collapsed: &BTreeSet<String>,
) -> VisualLayout {
    let rows = if sort_key.is_manual() {
        manual_rows(live, order, criteria, collapsed)
    } else {
        sorted_rows(live, criteria, sort_key)
    };
    VisualLayout { rows, sort_key }
}

fn manual_rows(
    live: &LiveItems,
    order: &[OrderEntry],
    criteria: &FilterCriteria,
    collapsed: &BTreeSet<String>,
) -> Vec<VisualRow> {
    let filtering = criteria.is_active();
    let mut rows = Vec::with_capacity(order.len());

    for entry in order {
        match entry.kind {
            EntryKind::Group => {
                if !live.has_group(&entry.identifier) {
                    continue;
                }
                let members: Vec<LeafId> = live
                    .members(&entry.identifier)
                    .into_iter()
                    .filter(|leaf| criteria.matches(leaf, live))
                    .map(|leaf| leaf.id.clone())
                    .collect();
                if filtering && members.is_empty() {
                    continue;
                }
                rows.push(VisualRow::Group {
                    name: entry.identifier.clone(),
                    members,
                    expanded: filtering || !collapsed.contains(&entry.identifier),
                });
            }
            EntryKind::Leaf => {
                let Some(leaf) = live.leaf(&entry.identifier) else {
                    continue;
                };
                if live.is_ungrouped(leaf) && criteria.matches(leaf, live) {
                    rows.push(VisualRow::Leaf {
                        id: leaf.id.clone(),
                    });
                }
            }
        }
    }

    rows
}

fn sorted_rows(live: &LiveItems, criteria: &FilterCriteria, sort_key: SortKey) -> Vec<VisualRow> {
    let mut leaves: Vec<&Leaf> = live
        .leaves()
        .filter(|leaf| criteria.matches(leaf, live))
        .collect();
    leaves.sort_by(|a, b| compare_by_key(a, b, sort_key));
    leaves
        .into_iter()
        .map(|leaf| VisualRow::Leaf {
            id: leaf.id.clone(),
        })
        .collect()
}

/// Total order for a sort key; never returns `Equal` for distinct leaves
#[must_use]
pub fn compare_by_key(a: &Leaf, b: &Leaf, sort_key: SortKey) -> Ordering {
    let primary = match sort_key {
        SortKey::Custom | SortKey::Name => Ordering::Equal,
        SortKey::Version => {
            version_key(b.version.as_deref()).cmp(&version_key(a.version.as_deref()))
        }
        SortKey::LastActivity => Reverse(a.last_activity).cmp(&Reverse(b.last_activity)),
        SortKey::UsageCount => b.usage_count.cmp(&a.usage_count),
    };
    primary.then_with(|| compare_leaves_by_name(a, b))
}

/// Numeric components of a version string; `None` sorts below any version
fn version_key(version: Option<&str>) -> Option<Vec<u64>> {
    let version = version?;
    let parts: Vec<u64> = version
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().unwrap_or(u64::MAX))
        .collect();
    if parts.is_empty() { None } else { Some(parts) }
}
