//! Items, order entries and their identities
//!
//! Leaves are identified by a stable opaque ID that survives renames.
//! Groups are identified by their display name, so renaming a group is a
//! rename-in-place rather than a new group. Group membership lives on the
//! leaf (`group_name`), never in the order entry.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable opaque identifier of a leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeafId(String);

impl LeafId {
    /// Creates a leaf identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeafId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LeafId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An externally-owned record managed by the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// Stable identifier
    pub id: LeafId,
    /// Display name, may change at any time
    pub name: String,
    /// Name of the group this leaf belongs to, if any
    pub group_name: Option<String>,
    /// Free-form tags used by filters
    #[serde(default)]
    pub tags: Vec<String>,
    /// Version string used by the version sort
    #[serde(default)]
    pub version: Option<String>,
    /// Last time the leaf was used
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    /// Number of times the leaf was used
    #[serde(default)]
    pub usage_count: u64,
}

impl Leaf {
    /// Creates an ungrouped leaf with no metadata
    #[must_use]
    pub fn new(id: impl Into<LeafId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group_name: None,
            tags: Vec::new(),
            version: None,
            last_activity: None,
            usage_count: 0,
        }
    }

    /// Sets the group name
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_name = Some(group.into());
        self
    }

    /// Sets the tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the version string
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the last activity timestamp
    #[must_use]
    pub const fn with_last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity = Some(at);
        self
    }

    /// Sets the usage count
    #[must_use]
    pub const fn with_usage_count(mut self, count: u64) -> Self {
        self.usage_count = count;
        self
    }
}

/// Kind of a top-level entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// An ungrouped leaf, identified by its `LeafId`
    Leaf,
    /// A group, identified by its name
    Group,
}

/// One position in the unified order
///
/// Serialized as `{"isGroup": bool, "identifier": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredEntry", into = "StoredEntry")]
pub struct OrderEntry {
    /// Leaf or group
    pub kind: EntryKind,
    /// Leaf ID or group name
    pub identifier: String,
}

impl OrderEntry {
    /// Entry for a top-level leaf
    #[must_use]
    pub fn leaf(id: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Leaf,
            identifier: id.into(),
        }
    }

    /// Entry for a group
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Group,
            identifier: name.into(),
        }
    }

    /// Returns true for group entries
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.kind == EntryKind::Group
    }

    /// Returns the leaf ID for leaf entries
    #[must_use]
    pub fn leaf_id(&self) -> Option<LeafId> {
        match self.kind {
            EntryKind::Leaf => Some(LeafId::new(self.identifier.clone())),
            EntryKind::Group => None,
        }
    }
}

impl fmt::Display for OrderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Leaf => write!(f, "Leaf:{}", self.identifier),
            EntryKind::Group => write!(f, "Group:{}", self.identifier),
        }
    }
}

/// Wire shape of an order entry
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    is_group: bool,
    identifier: String,
}

impl From<StoredEntry> for OrderEntry {
    fn from(stored: StoredEntry) -> Self {
        if stored.is_group {
            Self::group(stored.identifier)
        } else {
            Self::leaf(stored.identifier)
        }
    }
}

impl From<OrderEntry> for StoredEntry {
    fn from(entry: OrderEntry) -> Self {
        Self {
            is_group: entry.is_group(),
            identifier: entry.identifier,
        }
    }
}

/// Alphabetical comparison used wherever a deterministic default order is needed
///
/// Case-insensitive first, then case-sensitive, so two distinct names never
/// compare equal.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Alphabetical leaf comparison with the leaf ID as final tie-break
#[must_use]
pub fn compare_leaves_by_name(a: &Leaf, b: &Leaf) -> Ordering {
    compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id))
}
