//! Durable, versioned unified order
//!
//! The stored form is a small JSON envelope:
//!
//! ```json
//! {"version": 1, "entries": [{"isGroup": true, "identifier": "Favorites"}]}
//! ```
//!
//! A bare entry list (the pre-envelope format) is still accepted and is
//! upgraded on the next save. Whatever is stored, the order handed to the
//! engine has always been through [`validate_and_repair`].

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::kv::KeyValueStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{EntryKind, LeafId, OrderEntry, compare_names};
use crate::provider::LiveItems;
use crate::trace_operation;
use crate::tracing::span_names;

/// Key holding the serialized unified order
pub const ORDER_KEY: &str = "unified_order";
/// Key holding the "legacy migration done" flag
pub const MIGRATION_FLAG_KEY: &str = "legacy_migration_done";
/// Key holding the collapsed-group set
pub const COLLAPSED_KEY: &str = "collapsed_groups";
/// Key holding the legacy flat leaf order read by the one-time migration
pub const LEGACY_ORDER_KEY: &str = "legacy_leaf_order";
/// Current envelope version
pub const ORDER_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct OrderEnvelope {
    version: u32,
    entries: Vec<OrderEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredOrder {
    Envelope(OrderEnvelope),
    Bare(Vec<OrderEntry>),
}

/// Result of [`OrderStore::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedOrder {
    /// Repaired unified order
    pub entries: Vec<OrderEntry>,
    /// True when no usable stored order existed and a default was synthesized
    pub first_run: bool,
    /// True when the backend could not be read; the stored value is unknown
    /// and must not be overwritten by the default
    pub read_failed: bool,
}

#[derive(Debug)]
pub struct OrderStore<S> {
    backend: S,
}

impl<S: KeyValueStore> OrderStore<S> {
    /// Wraps a key/value backend
    #[must_use]
    pub const fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Borrows the backend
    #[must_use]
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Mutably borrows the backend
    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Loads the stored order and repairs it against the live item set
    ///
    /// An absent, unreadable or corrupt order yields the default order with
    /// `first_run` set; an unreadable one also sets `read_failed`. Never fails.
    pub fn load(&self, live: &LiveItems) -> LoadedOrder {
        let raw = match self.backend.get_string(ORDER_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stored order, using default");
                return LoadedOrder {
                    entries: default_order(live),
                    first_run: true,
                    read_failed: true,
                };
            }
        };

        let Some(raw) = raw else {
            tracing::info!("No stored order, synthesizing default");
            return LoadedOrder {
                entries: default_order(live),
                first_run: true,
                read_failed: false,
            };
        };

        match decode_order(&raw) {
            Ok(entries) => LoadedOrder {
                entries: validate_and_repair(&entries, live),
                first_run: false,
                read_failed: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Stored order is corrupt, synthesizing default");
                LoadedOrder {
                    entries: default_order(live),
                    first_run: true,
                    read_failed: false,
                }
            }
        }
    }

    /// Serializes and writes the full order
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails. The caller
    /// keeps its in-memory order; the next save rewrites everything.
    pub fn save(&mut self, entries: &[OrderEntry]) -> StoreResult<()> {
        let encoded = encode_order(entries)?;
        self.backend.set_string(ORDER_KEY, &encoded)?;
        tracing::debug!(entry_count = entries.len(), "Order saved");
        Ok(())
    }

    /// Runs the legacy migration once
    ///
    /// Returns the migrated order if migration ran. The persisted flag is set
    /// whether or not a legacy order existed, so this never runs twice.
    pub fn migrate_if_needed(&mut self, live: &LiveItems) -> Option<Vec<OrderEntry>> {
        let _span = trace_operation!(span_names::ORDER_MIGRATE).entered();
        match self.backend.get_string(MIGRATION_FLAG_KEY) {
            Ok(Some(flag)) if flag.trim() == "true" => return None,
            Ok(_) => {}
            Err(e) => {
                // Flag state unknown; migrating could overwrite a newer order.
                tracing::warn!(error = %e, "Cannot read migration flag, skipping migration");
                return None;
            }
        }

        let legacy = match self.backend.get_string(LEGACY_ORDER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LeafId>>(&raw) {
                Ok(ids) => Some(ids),
                Err(e) => {
                    tracing::warn!(error = %e, "Legacy order is corrupt, ignoring it");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read legacy order");
                None
            }
        };

        let migrated = legacy.map(|ids| {
            let entries = migrate_legacy(&ids, live);
            tracing::info!(
                legacy_count = ids.len(),
                entry_count = entries.len(),
                "Migrated legacy leaf order"
            );
            if let Err(e) = self.save(&entries) {
                tracing::error!(error = %e, "Failed to persist migrated order");
            }
            entries
        });

        if let Err(e) = self.backend.set_string(MIGRATION_FLAG_KEY, "true") {
            tracing::error!(error = %e, "Failed to persist migration flag");
        }

        migrated
    }

    /// Loads the collapsed-group set; unreadable data yields an empty set
    pub fn load_collapsed(&self) -> BTreeSet<String> {
        match self.backend.get_string(COLLAPSED_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Collapsed group set is corrupt, resetting");
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read collapsed groups");
                BTreeSet::new()
            }
        }
    }

    /// Writes the collapsed-group set
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub fn save_collapsed(&mut self, collapsed: &BTreeSet<String>) -> StoreResult<()> {
        let encoded = serde_json::to_string(collapsed)?;
        self.backend.set_string(COLLAPSED_KEY, &encoded)
    }
}

/// Default order: all groups by name, then all ungrouped leaves by name
#[must_use]
pub fn default_order(live: &LiveItems) -> Vec<OrderEntry> {
    let mut groups: Vec<&str> = live.groups().collect();
    groups.sort_by(|a, b| compare_names(a, b));

    groups
        .into_iter()
        .map(OrderEntry::group)
        .chain(
            live.ungrouped_sorted()
                .into_iter()
                .map(|leaf| OrderEntry::leaf(leaf.id.as_str())),
        )
        .collect()
}

/// Drops stale entries and appends missing ones
///
/// - entries whose identifier no longer resolves are dropped
/// - leaf entries for leaves now rendered inside a live group are dropped
/// - duplicates keep their first occurrence
/// - missing groups, then missing ungrouped leaves, are appended
///   alphabetically
///
/// Empty groups are kept. The function is idempotent.
#[must_use]
pub fn validate_and_repair(order: &[OrderEntry], live: &LiveItems) -> Vec<OrderEntry> {
    let mut seen: HashSet<&OrderEntry> = HashSet::with_capacity(order.len());
    let mut repaired: Vec<OrderEntry> = Vec::with_capacity(order.len());
    let mut dropped = 0usize;

    for entry in order {
        let live_entry = match entry.kind {
            EntryKind::Group => live.has_group(&entry.identifier),
            EntryKind::Leaf => live
                .leaf(&entry.identifier)
                .is_some_and(|leaf| live.is_ungrouped(leaf)),
        };
        if live_entry && seen.insert(entry) {
            repaired.push(entry.clone());
        } else {
            dropped += 1;
        }
    }

    let present: HashSet<OrderEntry> = repaired.iter().cloned().collect();
    let appended: Vec<OrderEntry> = default_order(live)
        .into_iter()
        .filter(|entry| !present.contains(entry))
        .collect();

    if dropped > 0 || !appended.is_empty() {
        tracing::debug!(
            dropped,
            appended = appended.len(),
            "Repaired unified order"
        );
    }

    repaired.extend(appended);
    repaired
}

/// Builds a unified order from a legacy flat leaf order
///
/// Groups come first alphabetically, then the legacy leaves that are still
/// live and ungrouped in their legacy order, then any remaining ungrouped
/// leaves alphabetically.
#[must_use]
pub fn migrate_legacy(legacy: &[LeafId], live: &LiveItems) -> Vec<OrderEntry> {
    let mut groups: Vec<&str> = live.groups().collect();
    groups.sort_by(|a, b| compare_names(a, b));

    let mut entries: Vec<OrderEntry> = groups.into_iter().map(OrderEntry::group).collect();
    let mut placed: HashSet<&str> = HashSet::new();

    for id in legacy {
        let Some(leaf) = live.leaf(id.as_str()) else {
            continue;
        };
        if live.is_ungrouped(leaf) && placed.insert(id.as_str()) {
            entries.push(OrderEntry::leaf(id.as_str()));
        }
    }

    for leaf in live.ungrouped_sorted() {
        if !placed.contains(leaf.id.as_str()) {
            entries.push(OrderEntry::leaf(leaf.id.as_str()));
        }
    }

    entries
}

/// Encodes an order into the current envelope format
///
/// # Errors
///
/// Returns `StoreError::Serialization` if encoding fails.
pub fn encode_order(entries: &[OrderEntry]) -> StoreResult<String> {
    let envelope = OrderEnvelope {
        version: ORDER_FORMAT_VERSION,
        entries: entries.to_vec(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes an order from the envelope or bare-list format
///
/// Order and duplicates are preserved exactly; repair is a separate step.
///
/// # Errors
///
/// Returns `StoreError::Serialization` for malformed input and
/// `StoreError::UnsupportedVersion` for envelopes newer than this build.
pub fn decode_order(raw: &str) -> StoreResult<Vec<OrderEntry>> {
    match serde_json::from_str::<StoredOrder>(raw)? {
        StoredOrder::Envelope(envelope) if envelope.version > ORDER_FORMAT_VERSION => {
            Err(StoreError::UnsupportedVersion(envelope.version))
        }
        StoredOrder::Envelope(envelope) => Ok(envelope.entries),
        StoredOrder::Bare(entries) => Ok(entries),
    }
}
