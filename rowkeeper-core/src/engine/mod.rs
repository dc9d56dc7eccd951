//! Engine orchestration
//!
//! [`ListEngine`] wires the pieces together for a single list view:
//!
//! - the item provider and order store it was opened with
//! - the in-memory [`OrderModel`] and the derived [`VisualLayout`]
//! - the [`DragController`] fed by pointer events and the [`GapAnimator`]
//!   fed by frame ticks
//! - the [`SelectionTracker`], remapped after every mutation
//!
//! Every mutation either completes and is persisted or leaves the order
//! untouched. Save failures are logged and the in-memory order stays
//! authoritative; the next successful save rewrites the whole order.

mod observer;
mod snapshot;

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

pub use observer::{EngineObserver, ObservedEvent, RecordingObserver};
pub use snapshot::OrderSnapshot;

use crate::animation::GapAnimator;
use crate::config::EngineSettings;
use crate::drag::{
    CancelReason, DragConfig, DragController, DragResolution, MoveOutcome, PressOutcome,
    RowGeometry,
};
use crate::error::{OrderError, OrderResult};
use crate::filter::{FilterCriteria, SortKey, VisualLayout, build_visual_rows};
use crate::models::{EntryKind, LeafId, OrderEntry, Point};
use crate::order::{IndexEdit, OrderChange, OrderModel};
use crate::provider::{ItemChange, ItemProvider, LiveItems};
use crate::selection::SelectionTracker;
use crate::store::{KeyValueStore, ORDER_KEY, OrderStore, encode_order, validate_and_repair};
use crate::trace_operation;
use crate::tracing::span_names;

/// Ordered-list engine for one list view
pub struct ListEngine<P, S> {
    provider: P,
    store: OrderStore<S>,
    settings: EngineSettings,
    model: OrderModel,
    collapsed: BTreeSet<String>,
    criteria: FilterCriteria,
    sort_key: SortKey,
    layout: VisualLayout,
    drag: DragController,
    gaps: GapAnimator,
    selection: SelectionTracker,
    observer: Option<Box<dyn EngineObserver>>,
    first_run: bool,
}

impl<P, S> fmt::Debug for ListEngine<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListEngine")
            .field("entries", &self.model.len())
            .field("sort_key", &self.sort_key)
            .field("drag", &self.drag.phase())
            .field("selected", &self.selection.len())
            .finish_non_exhaustive()
    }
}

impl<P: ItemProvider, S: KeyValueStore> ListEngine<P, S> {
    /// Opens the engine: migrate once, load, repair, persist if needed
    ///
    /// Never fails. Invalid settings fall back to defaults and an unusable
    /// stored order falls back to the default order.
    pub fn open(provider: P, backend: S, settings: EngineSettings) -> Self {
        let _span = trace_operation!(span_names::ENGINE_OPEN).entered();

        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid engine settings, using defaults");
                EngineSettings::default()
            }
        };

        let mut store = OrderStore::new(backend);
        let live = LiveItems::capture(&provider);

        let (entries, first_run, read_failed) = match store.migrate_if_needed(&live) {
            Some(migrated) => (validate_and_repair(&migrated, &live), false, false),
            None => {
                let _load = trace_operation!(span_names::ORDER_LOAD).entered();
                let loaded = store.load(&live);
                (loaded.entries, loaded.first_run, loaded.read_failed)
            }
        };

        let mut collapsed = store.load_collapsed();
        collapsed.retain(|group| live.has_group(group));

        // An unreadable store may still hold the user's order; leave it alone.
        let needs_save = !read_failed && {
            let stored = store.backend().get_string(ORDER_KEY).ok().flatten();
            first_run || stored != encode_order(&entries).ok()
        };

        let mut engine = Self {
            provider,
            store,
            drag: DragController::new(DragConfig::from_settings(&settings)),
            gaps: GapAnimator::from_settings(&settings),
            settings,
            model: OrderModel::new(entries),
            collapsed,
            criteria: FilterCriteria::none(),
            sort_key: SortKey::Custom,
            layout: VisualLayout::default(),
            selection: SelectionTracker::new(),
            observer: None,
            first_run,
        };

        if needs_save {
            engine.persist();
        }
        engine.rebuild_layout();
        tracing::info!(
            entry_count = engine.model.len(),
            first_run,
            "Ordered list opened"
        );
        engine
    }

    /// Installs a presentation observer
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn EngineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replaces the presentation observer
    pub fn set_observer(&mut self, observer: Option<Box<dyn EngineObserver>>) {
        self.observer = observer;
    }

    // ========== Accessors ==========

    /// The item provider
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutable item provider access
    ///
    /// Report every change made through it with [`Self::handle_item_change`].
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// The order store
    pub const fn store(&self) -> &OrderStore<S> {
        &self.store
    }

    /// Settings in effect
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The unified order
    pub fn order(&self) -> &[OrderEntry] {
        self.model.entries()
    }

    /// The order model
    pub const fn model(&self) -> &OrderModel {
        &self.model
    }

    /// Current visual layout
    pub const fn layout(&self) -> &VisualLayout {
        &self.layout
    }

    /// Returns true if no usable stored order existed at open
    pub const fn is_first_run(&self) -> bool {
        self.first_run
    }

    /// Collapsed group names
    pub const fn collapsed(&self) -> &BTreeSet<String> {
        &self.collapsed
    }

    /// Active filters
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Active sort key
    pub const fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// The drag controller
    pub const fn drag(&self) -> &DragController {
        &self.drag
    }

    /// The gap animator
    pub const fn gaps(&self) -> &GapAnimator {
        &self.gaps
    }

    /// Selected logical indices
    pub const fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Mutable selection
    pub fn selection_mut(&mut self) -> &mut SelectionTracker {
        &mut self.selection
    }

    /// Entries at the selected logical indices
    pub fn selected_entries(&self) -> Vec<OrderEntry> {
        self.selection
            .indices()
            .iter()
            .filter_map(|&i| self.model.entries().get(i).cloned())
            .collect()
    }

    // ========== Filters and Presentation ==========

    /// Replaces the filters; an active drag is cancelled
    pub fn set_filters(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        self.cancel_drag(CancelReason::LayoutChanged);
        self.criteria = criteria;
        self.rebuild_layout();
        self.notify(|o| o.on_layout_changed());
    }

    /// Replaces the sort key; an active drag is cancelled
    ///
    /// The unified order is never touched, so switching back to
    /// [`SortKey::Custom`] restores the manual layout unchanged.
    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        if sort_key == self.sort_key {
            return;
        }
        self.cancel_drag(CancelReason::LayoutChanged);
        self.sort_key = sort_key;
        self.rebuild_layout();
        tracing::debug!(%sort_key, "Sort key changed");
        self.notify(|o| o.on_layout_changed());
    }

    /// Flips a group between collapsed and expanded
    ///
    /// Returns the new collapsed state, or `None` if the group is not live.
    pub fn toggle_collapsed(&mut self, group: &str) -> Option<bool> {
        let collapsed = !self.collapsed.contains(group);
        self.set_collapsed(group, collapsed).then_some(collapsed)
    }

    /// Collapses or expands a group
    ///
    /// Returns false if the group is not live.
    pub fn set_collapsed(&mut self, group: &str, collapsed: bool) -> bool {
        if !self.provider.has_group(group) {
            return false;
        }
        let changed = if collapsed {
            self.collapsed.insert(group.to_string())
        } else {
            self.collapsed.remove(group)
        };
        if changed {
            self.cancel_drag(CancelReason::LayoutChanged);
            self.persist_collapsed();
            self.rebuild_layout();
            self.notify(|o| o.on_layout_changed());
        }
        true
    }

    // ========== Pointer Events ==========

    /// Handles a press on a top-level row
    ///
    /// Drags only arm under [`SortKey::Custom`]; a press during an active
    /// gesture cancels that gesture and is otherwise dropped.
    pub fn pointer_down(
        &mut self,
        entry: &OrderEntry,
        position: Point,
        rows: &[RowGeometry],
    ) -> PressOutcome {
        if !self.layout.is_manual() && !self.drag.is_active() {
            return PressOutcome::Ignored;
        }
        if !self.drag.is_active() && self.layout.position_of(entry).is_none() {
            return PressOutcome::Ignored;
        }

        let source_group = self.effective_group_of(entry);
        let outcome = self
            .drag
            .pointer_down(entry.clone(), source_group, position, rows);
        match &outcome {
            PressOutcome::Armed => self.notify(|o| o.on_pointer_capture(true)),
            PressOutcome::Superseded(_) => self.end_gesture(),
            PressOutcome::Ignored => {}
        }
        outcome
    }

    /// Handles pointer movement
    pub fn pointer_move(&mut self, position: Point, rows: &[RowGeometry], now: Instant) -> MoveOutcome {
        let outcome = self.drag.pointer_move(position, rows, now);
        if outcome == MoveOutcome::Started
            && let Some(origin) = self.drag.origin_gap()
        {
            self.gaps.open_at(origin.index, origin.size);
        }
        outcome
    }

    /// Handles pointer release and applies the gesture
    ///
    /// Returns what was applied. A gesture that no longer matches the item
    /// set resolves as cancelled and changes nothing.
    pub fn pointer_up(&mut self, now: Instant) -> Option<DragResolution> {
        let resolution = self.drag.pointer_up(now)?;
        self.end_gesture();
        Some(self.commit(resolution))
    }

    /// Abandons the active gesture without touching the order
    ///
    /// Used for escape, loss of pointer capture or window focus.
    pub fn cancel_drag(&mut self, reason: CancelReason) -> Option<DragResolution> {
        let cancelled = self.drag.cancel(reason)?;
        let _span = trace_operation!(span_names::DRAG_CANCEL, %reason).entered();
        self.end_gesture();
        Some(cancelled)
    }

    /// Advances the gap animation one frame
    ///
    /// Only gap state changes.
    pub fn tick(&mut self, dt: Duration, now: Instant) {
        let target = self.drag.gap_target(now);
        self.gaps.tick(target, dt);
    }

    /// Vertical offset for the row at a visual index
    pub fn gap_offset(&self, visual_index: usize) -> f64 {
        self.gaps.offset_for_row(visual_index)
    }

    /// Top-left corner of the floating row
    pub fn overlay_origin(&self, pointer: Point) -> Option<Point> {
        self.drag.overlay_origin(pointer)
    }

    /// Leaf flagged as the stack target
    pub fn stack_target(&self, now: Instant) -> Option<&LeafId> {
        self.drag.stack_target(now)
    }

    // ========== Programmatic Mutations ==========

    /// Moves an entry so it lands before whatever sits at `to_logical`
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry is not in the order.
    pub fn move_entry(&mut self, entry: &OrderEntry, to_logical: usize) -> OrderResult<OrderChange> {
        self.cancel_drag(CancelReason::LayoutChanged);
        let change = self.model.move_entry(entry, to_logical)?;
        self.apply_change(&change);
        Ok(change)
    }

    /// Moves a visible top-level entry to a visual slot among the other rows
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the layout is manual and the entry
    /// is visible at top level.
    pub fn move_to_visual(&mut self, entry: &OrderEntry, to_visual: usize) -> OrderResult<OrderChange> {
        if !self.layout.is_manual() {
            return Err(OrderError::InvalidOperation(
                "manual placement is bypassed by the active sort".to_string(),
            ));
        }
        if self.layout.position_of(entry).is_none() {
            return Err(OrderError::InvalidOperation(format!(
                "{entry} is not visible at top level"
            )));
        }
        let visible = self.layout.top_level_entries();
        let logical = self
            .model
            .insertion_logical_index_for(to_visual, Some(entry), &visible);
        self.move_entry(entry, logical)
    }

    /// Assigns a leaf to a group, or ungroups it with `None`
    ///
    /// # Errors
    ///
    /// Returns `LeafNotFound` or `GroupNotFound` for stale identifiers.
    pub fn assign_to_group(&mut self, leaf: &LeafId, group: Option<&str>) -> OrderResult<OrderChange> {
        self.cancel_drag(CancelReason::LayoutChanged);
        let change = self.model.assign_to_group(&mut self.provider, leaf, group)?;
        self.apply_change(&change);
        Ok(change)
    }

    /// Adds a leaf to an existing group
    ///
    /// # Errors
    ///
    /// Returns `LeafNotFound` or `GroupNotFound` for stale identifiers.
    pub fn merge_into_group(&mut self, leaf: &LeafId, group: &str) -> OrderResult<OrderChange> {
        self.assign_to_group(leaf, Some(group))
    }

    /// Creates a new group from two leaves at `source`'s position
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for identical leaves, `LeafNotFound` for
    /// stale leaves, or a provider error.
    pub fn stack(&mut self, source: &LeafId, target: &LeafId) -> OrderResult<OrderChange> {
        self.cancel_drag(CancelReason::LayoutChanged);
        let change = self.model.create_group_from_stack(
            &mut self.provider,
            source,
            target,
            &self.settings.new_group_name,
        )?;
        self.apply_change(&change);
        Ok(change)
    }

    /// Renames a group in place
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation`, `GroupNotFound` or `GroupExists`.
    pub fn rename_group(&mut self, old: &str, new: &str) -> OrderResult<OrderChange> {
        self.cancel_drag(CancelReason::LayoutChanged);
        let change = self.model.rename_group(&mut self.provider, old, new)?;
        if let OrderChange::GroupRenamed { old, new } = &change
            && self.collapsed.remove(old)
        {
            self.collapsed.insert(new.clone());
            self.persist_collapsed();
        }
        self.apply_change(&change);
        Ok(change)
    }

    /// Deletes a group; its members become top-level leaves
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if the group is not live.
    pub fn remove_group(&mut self, name: &str) -> OrderResult<OrderChange> {
        self.cancel_drag(CancelReason::LayoutChanged);
        let change = self.model.remove_group(&mut self.provider, name)?;
        if self.collapsed.remove(name) {
            self.persist_collapsed();
        }
        self.apply_change(&change);
        Ok(change)
    }

    // ========== External Changes ==========

    /// Reconciles the order with an external item change
    ///
    /// A drag in progress is cancelled: its source may be gone and its
    /// geometry no longer matches the layout.
    pub fn handle_item_change(&mut self, change: &ItemChange) {
        let _span = trace_operation!(span_names::ITEM_CHANGE, ?change).entered();

        if let Some(source) = self.drag.source() {
            let vanished = match change {
                ItemChange::GroupRenamed { old, .. } => {
                    source.kind == EntryKind::Group && &source.identifier == old
                }
                _ => !self.entry_is_live(source),
            };
            let reason = if vanished {
                CancelReason::SourceVanished
            } else {
                CancelReason::LayoutChanged
            };
            self.cancel_drag(reason);
        }

        match change {
            ItemChange::GroupRenamed { old, new } => {
                self.model.rename_group_entry(old, new);
                if self.collapsed.remove(old) {
                    self.collapsed.insert(new.clone());
                    self.persist_collapsed();
                }
            }
            ItemChange::GroupRemoved(name) => {
                if self.collapsed.remove(name) {
                    self.persist_collapsed();
                }
            }
            _ => {}
        }

        self.reconcile();
        self.notify(|o| o.on_layout_changed());
    }

    /// Repairs the order against the live item set, persisting any change
    pub fn reconcile(&mut self) {
        let _span = trace_operation!(span_names::ORDER_REPAIR).entered();
        let live = LiveItems::capture(&self.provider);
        let repaired = validate_and_repair(self.model.entries(), &live);
        if repaired.as_slice() != self.model.entries() {
            let edits = repair_edits(self.model.entries(), &repaired);
            tracing::debug!(
                before = self.model.len(),
                after = repaired.len(),
                "Order repaired"
            );
            self.selection.apply_edits(&edits);
            self.model.replace(repaired);
            self.persist();
        }
        self.rebuild_layout();
    }

    // ========== Snapshots ==========

    /// Captures the order and every group assignment
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot::capture(self.model.entries(), &self.provider)
    }

    /// Reapplies a snapshot: groups, assignments and order
    ///
    /// Leaves deleted since the snapshot are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first provider error.
    pub fn restore(&mut self, snapshot: &OrderSnapshot) -> OrderResult<()> {
        self.cancel_drag(CancelReason::LayoutChanged);

        for group in snapshot.groups() {
            if !self.provider.has_group(group) {
                self.provider.create_group(group)?;
            }
        }
        for (id, group) in &snapshot.assignments {
            if let Some(leaf) = self.provider.leaf(id)
                && leaf.group_name != *group
            {
                self.provider.set_leaf_group_name(id, group.as_deref())?;
            }
        }
        for group in self.provider.list_groups() {
            if !snapshot.groups().contains(&group) {
                self.provider.remove_group(&group)?;
            }
        }

        let live = LiveItems::capture(&self.provider);
        self.model
            .replace(validate_and_repair(snapshot.entries(), &live));
        self.collapsed.retain(|group| live.has_group(group));
        self.selection.truncate(self.model.len());
        self.persist();
        self.rebuild_layout();
        tracing::info!(entry_count = self.model.len(), "Snapshot restored");
        self.notify(|o| o.on_layout_changed());
        Ok(())
    }

    // ========== Internals ==========

    fn commit(&mut self, resolution: DragResolution) -> DragResolution {
        let _span = trace_operation!(span_names::DRAG_COMMIT).entered();
        let result = match &resolution {
            DragResolution::Click(_) | DragResolution::Cancelled { .. } => None,
            DragResolution::Reorder {
                entry, to_visual, ..
            } => Some(self.move_to_visual(entry, *to_visual)),
            DragResolution::Merge { leaf, group } => Some(self.merge_into_group(leaf, group)),
            DragResolution::Stack { source, target } => Some(self.stack(source, target)),
        };
        let Some(result) = result else {
            return resolution;
        };

        match result {
            Ok(_) => resolution,
            Err(e) => {
                let entry = resolution_entry(&resolution);
                let reason = if e.is_stale_reference() {
                    CancelReason::SourceVanished
                } else {
                    CancelReason::LayoutChanged
                };
                tracing::warn!(error = %e, entry = %entry, %reason, "Drag no longer applies, cancelled");
                self.reconcile();
                DragResolution::Cancelled { entry, reason }
            }
        }
    }

    fn apply_change(&mut self, change: &OrderChange) {
        if !change.is_change() {
            return;
        }
        self.selection.apply_edits(&change.edits());
        self.persist();
        self.rebuild_layout();
        match change {
            OrderChange::Moved { from, to, .. } => {
                let (from, to) = (*from, *to);
                self.notify(|o| o.on_reorder(from, to));
            }
            OrderChange::Merged { leaf, group, .. } => {
                self.notify(|o| o.on_merged_into_group(leaf, group));
            }
            OrderChange::Stacked { group, members, .. } => {
                self.notify(|o| o.on_group_created(group, members));
            }
            _ => self.notify(|o| o.on_layout_changed()),
        }
    }

    fn end_gesture(&mut self) {
        self.gaps.clear();
        self.notify(|o| o.on_pointer_capture(false));
    }

    fn persist(&mut self) {
        let _span =
            trace_operation!(span_names::ORDER_SAVE, entry_count = self.model.len()).entered();
        if let Err(e) = self.store.save(self.model.entries()) {
            tracing::error!(error = %e, "Failed to save order, keeping in-memory order");
        }
    }

    fn persist_collapsed(&mut self) {
        if let Err(e) = self.store.save_collapsed(&self.collapsed) {
            tracing::error!(error = %e, "Failed to save collapsed groups");
        }
    }

    fn rebuild_layout(&mut self) {
        let live = LiveItems::capture(&self.provider);
        self.layout = build_visual_rows(
            &live,
            self.model.entries(),
            &self.criteria,
            self.sort_key,
            &self.collapsed,
        );
    }

    fn entry_is_live(&self, entry: &OrderEntry) -> bool {
        match entry.kind {
            EntryKind::Group => self.provider.has_group(&entry.identifier),
            EntryKind::Leaf => self.provider.leaf(&LeafId::new(&entry.identifier)).is_some(),
        }
    }

    fn effective_group_of(&self, entry: &OrderEntry) -> Option<String> {
        let id = entry.leaf_id()?;
        self.provider
            .leaf_group_name(&id)
            .filter(|group| self.provider.has_group(group))
    }

    fn notify(&mut self, f: impl FnOnce(&mut dyn EngineObserver)) {
        if let Some(observer) = self.observer.as_mut() {
            f(observer.as_mut());
        }
    }
}

fn resolution_entry(resolution: &DragResolution) -> OrderEntry {
    match resolution {
        DragResolution::Click(entry)
        | DragResolution::Reorder { entry, .. }
        | DragResolution::Cancelled { entry, .. } => entry.clone(),
        DragResolution::Merge { leaf, .. } | DragResolution::Stack { source: leaf, .. } => {
            OrderEntry::leaf(leaf.as_str())
        }
    }
}

/// Index edits turning `old` into `repaired`
///
/// Repair keeps surviving entries in their relative order and only appends,
/// so a greedy subsequence match recovers the removals.
fn repair_edits(old: &[OrderEntry], repaired: &[OrderEntry]) -> Vec<IndexEdit> {
    let mut edits = Vec::new();
    let mut kept = 0;
    for entry in old {
        if repaired.get(kept) == Some(entry) {
            kept += 1;
        } else {
            edits.push(IndexEdit::Removed(kept));
        }
    }
    edits.extend((kept..repaired.len()).map(IndexEdit::Inserted));
    edits
}
