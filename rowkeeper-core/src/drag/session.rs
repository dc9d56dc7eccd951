//! Per-gesture drag state
//!
//! A [`DragSession`] is created on pointer-down and dropped on release or
//! cancellation. It is owned by the controller and never persisted.

use std::time::{Duration, Instant};

use crate::models::{LeafId, OrderEntry, Point, Rect};

/// A leaf hovered long enough may become a stack target
#[derive(Debug, Clone, PartialEq)]
pub struct StackCandidate {
    /// The hovered leaf
    pub target: LeafId,
    /// When the current hover began
    pub hover_start: Instant,
    /// Pointer position the hover is anchored to
    pub anchor: Point,
}

impl StackCandidate {
    /// Starts a hover at `anchor`
    #[must_use]
    pub const fn new(target: LeafId, hover_start: Instant, anchor: Point) -> Self {
        Self {
            target,
            hover_start,
            anchor,
        }
    }

    /// Returns true once the hover has lasted at least `hold`
    #[must_use]
    pub fn is_ready(&self, now: Instant, hold: Duration) -> bool {
        now.saturating_duration_since(self.hover_start) >= hold
    }

    /// Returns true if `point` keeps this hover alive
    #[must_use]
    pub fn holds(&self, target: &LeafId, point: Point, tolerance: f64) -> bool {
        &self.target == target && self.anchor.distance_to(point) <= tolerance
    }
}

/// State of one press-drag-release gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The pressed entry
    pub source: OrderEntry,
    /// Live group of the source leaf at press time
    pub source_group: Option<String>,
    /// Where the press happened
    pub press_position: Point,
    /// Visual index of the source row among top-level rows at press time
    pub origin_visual_index: usize,
    /// Insertion slot among the remaining rows
    pub current_insert_visual_index: usize,
    /// Press position relative to the row origin; keeps the grab point fixed
    pub pointer_offset: Point,
    /// Source row bounds, re-captured when the drag starts
    pub source_bounds: Rect,
    /// Set once pointer travel passes the drag threshold
    pub has_crossed_threshold: bool,
    /// Group whose header is under the pointer
    pub merge_target_group: Option<String>,
    /// Leaf under the pointer, with its hover timer
    pub stack_candidate: Option<StackCandidate>,
}

impl DragSession {
    /// Arms a session for a press on `source`
    #[must_use]
    pub fn armed(
        source: OrderEntry,
        source_group: Option<String>,
        press_position: Point,
        origin_visual_index: usize,
        source_bounds: Rect,
    ) -> Self {
        Self {
            source,
            source_group,
            press_position,
            origin_visual_index,
            current_insert_visual_index: origin_visual_index,
            pointer_offset: press_position.offset_from(source_bounds.origin()),
            source_bounds,
            has_crossed_threshold: false,
            merge_target_group: None,
            stack_candidate: None,
        }
    }

    /// Leaf ID of the source, if it is a leaf
    #[must_use]
    pub fn source_leaf(&self) -> Option<LeafId> {
        self.source.leaf_id()
    }

    /// Marks the threshold as crossed and takes the row bounds at lift-off
    ///
    /// The grab offset is re-derived against `bounds` and kept inside them.
    pub fn lift(&mut self, bounds: Option<Rect>) {
        self.has_crossed_threshold = true;
        let Some(bounds) = bounds else {
            return;
        };
        let offset = self.press_position.offset_from(bounds.origin());
        self.pointer_offset = Point::new(
            offset.x.clamp(0.0, bounds.width.max(0.0)),
            offset.y.clamp(0.0, bounds.height.max(0.0)),
        );
        self.source_bounds = bounds;
    }

    /// Top-left corner of the floating row for a pointer position
    #[must_use]
    pub fn overlay_origin(&self, pointer: Point) -> Point {
        pointer.offset_from(self.pointer_offset)
    }

    /// The stack target if its hover has lasted long enough
    #[must_use]
    pub fn ready_stack_target(&self, now: Instant, hold: Duration) -> Option<&LeafId> {
        self.stack_candidate
            .as_ref()
            .filter(|candidate| candidate.is_ready(now, hold))
            .map(|candidate| &candidate.target)
    }
}
