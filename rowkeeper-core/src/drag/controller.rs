//! Pointer gesture state machine
//!
//! ```text
//! Idle --press--> Armed --travel > threshold--> Dragging --release--> Idle
//!   ^               |                              |
//!   +----release (click) / cancel -----------------+
//! ```
//!
//! While dragging, each pointer move resolves exactly one hover outcome,
//! in priority order: merge into a group whose header is under the
//! pointer, stack onto a leaf hovered past the hold time, or plain
//! reorder at the insertion slot. The controller only describes what the
//! gesture means; applying it to the order is the engine's job.
//!
//! All time is passed in by the caller, so the controller is a pure
//! function of its inputs and the tick path has no side effects.

use std::fmt;
use std::time::{Duration, Instant};

use super::hit_test::{RowGeometry, group_header_at, insertion_index, row_at};
use super::session::{DragSession, StackCandidate};
use crate::animation::GapTarget;
use crate::config::EngineSettings;
use crate::models::{EntryKind, LeafId, OrderEntry, Point};

/// Gesture thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Pointer travel before a press becomes a drag
    pub threshold: f64,
    /// Hover time before a leaf becomes a stack target
    pub stack_hold: Duration,
    /// Pointer wander allowed while the stack timer runs
    pub stack_tolerance: f64,
    /// Added to the source row height to size the gap
    pub row_margin: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl DragConfig {
    /// Reads thresholds from engine settings
    #[must_use]
    pub const fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            threshold: settings.drag_threshold,
            stack_hold: settings.stack_hover(),
            stack_tolerance: settings.stack_hover_tolerance,
            row_margin: settings.row_margin,
        }
    }
}

/// Coarse controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// No gesture
    Idle,
    /// Pressed, below the drag threshold
    Armed,
    /// Source row is floating
    Dragging,
}

/// Why a gesture was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Escape key
    Escape,
    /// Pointer capture or window focus lost
    CaptureLost,
    /// Source item deleted mid-drag
    SourceVanished,
    /// Layout changed under the gesture (filter, sort or item change)
    LayoutChanged,
    /// A second press arrived during an active gesture
    Superseded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Escape => "escape",
            Self::CaptureLost => "capture_lost",
            Self::SourceVanished => "source_vanished",
            Self::LayoutChanged => "layout_changed",
            Self::Superseded => "superseded",
        };
        f.write_str(reason)
    }
}

/// What a finished gesture means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragResolution {
    /// Released before the threshold
    Click(OrderEntry),
    /// Move the entry to a visual slot among the other rows
    Reorder {
        /// Dragged entry
        entry: OrderEntry,
        /// Visual index at press time
        from_visual: usize,
        /// Insertion slot among the rows other than `entry`
        to_visual: usize,
    },
    /// Assign the leaf to an existing group
    Merge {
        /// Dragged leaf
        leaf: LeafId,
        /// Target group
        group: String,
    },
    /// Create a new group holding both leaves
    Stack {
        /// Dragged leaf
        source: LeafId,
        /// Hovered leaf
        target: LeafId,
    },
    /// Gesture abandoned; nothing may change
    Cancelled {
        /// Pressed entry
        entry: OrderEntry,
        /// Why
        reason: CancelReason,
    },
}

/// Result of a press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    /// A session was armed
    Armed,
    /// The pressed entry has no top-level row; nothing armed
    Ignored,
    /// A gesture was already active; it was cancelled and this press dropped
    Superseded(DragResolution),
}

/// Result of a pointer move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No gesture
    Idle,
    /// Still below the threshold
    Armed,
    /// This move crossed the threshold
    Started,
    /// Hover state updated
    Dragging,
}

/// Owns at most one [`DragSession`]
#[derive(Debug, Clone, Default)]
pub struct DragController {
    config: DragConfig,
    session: Option<DragSession>,
}

impl DragController {
    /// Creates an idle controller
    #[must_use]
    pub const fn new(config: DragConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Current thresholds
    #[must_use]
    pub const fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match &self.session {
            None => DragPhase::Idle,
            Some(session) if session.has_crossed_threshold => DragPhase::Dragging,
            Some(_) => DragPhase::Armed,
        }
    }

    /// Returns true while a session exists
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Returns true while the source row is floating
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.phase(), DragPhase::Dragging)
    }

    /// The active session
    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// The pressed entry
    #[must_use]
    pub fn source(&self) -> Option<&OrderEntry> {
        self.session.as_ref().map(|s| &s.source)
    }

    /// Handles a press on a top-level row
    ///
    /// `source_group` is the live group of the pressed leaf, if any. `rows`
    /// is the current top-level geometry in visual order.
    pub fn pointer_down(
        &mut self,
        source: OrderEntry,
        source_group: Option<String>,
        position: Point,
        rows: &[RowGeometry],
    ) -> PressOutcome {
        if let Some(cancelled) = self.cancel(CancelReason::Superseded) {
            return PressOutcome::Superseded(cancelled);
        }

        let Some((origin, row)) = rows.iter().enumerate().find(|(_, r)| r.entry == source) else {
            tracing::trace!(entry = %source, "Press outside known rows ignored");
            return PressOutcome::Ignored;
        };

        tracing::trace!(entry = %source, origin, "Drag armed");
        self.session = Some(DragSession::armed(
            source,
            source_group,
            position,
            origin,
            row.bounds,
        ));
        PressOutcome::Armed
    }

    /// Handles pointer movement
    pub fn pointer_move(&mut self, position: Point, rows: &[RowGeometry], now: Instant) -> MoveOutcome {
        let config = self.config;
        let Some(session) = self.session.as_mut() else {
            return MoveOutcome::Idle;
        };

        let outcome = if session.has_crossed_threshold {
            MoveOutcome::Dragging
        } else if session.press_position.distance_to(position) > config.threshold {
            let bounds = rows
                .iter()
                .find(|row| row.entry == session.source)
                .map(|row| row.bounds);
            session.lift(bounds);
            tracing::debug!(
                entry = %session.source,
                origin = session.origin_visual_index,
                "Drag started"
            );
            MoveOutcome::Started
        } else {
            return MoveOutcome::Armed;
        };

        update_hover(session, &config, position, rows, now);
        outcome
    }

    /// Handles pointer release, ending the gesture
    ///
    /// Returns `None` if no gesture was active.
    pub fn pointer_up(&mut self, now: Instant) -> Option<DragResolution> {
        let session = self.session.take()?;

        if !session.has_crossed_threshold {
            return Some(DragResolution::Click(session.source));
        }

        if let Some(leaf) = session.source_leaf() {
            if let Some(group) = session
                .merge_target_group
                .clone()
                .filter(|group| session.source_group.as_ref() != Some(group))
            {
                return Some(DragResolution::Merge { leaf, group });
            }
            if let Some(target) = session.ready_stack_target(now, self.config.stack_hold) {
                return Some(DragResolution::Stack {
                    source: leaf,
                    target: target.clone(),
                });
            }
        }

        Some(DragResolution::Reorder {
            entry: session.source,
            from_visual: session.origin_visual_index,
            to_visual: session.current_insert_visual_index,
        })
    }

    /// Abandons the gesture
    ///
    /// Returns `None` if no gesture was active.
    pub fn cancel(&mut self, reason: CancelReason) -> Option<DragResolution> {
        let session = self.session.take()?;
        tracing::debug!(entry = %session.source, %reason, "Drag cancelled");
        Some(DragResolution::Cancelled {
            entry: session.source,
            reason,
        })
    }

    /// Where the insertion gap should be open
    ///
    /// `None` unless dragging in plain reorder mode.
    #[must_use]
    pub fn gap_target(&self, now: Instant) -> Option<GapTarget> {
        let session = self.session.as_ref().filter(|s| s.has_crossed_threshold)?;
        if session.merge_target_group.is_some()
            || session
                .ready_stack_target(now, self.config.stack_hold)
                .is_some()
        {
            return None;
        }
        Some(GapTarget {
            index: session.current_insert_visual_index,
            size: self.gap_size(session),
        })
    }

    /// Gap opened at the origin slot when the drag starts
    #[must_use]
    pub fn origin_gap(&self) -> Option<GapTarget> {
        let session = self.session.as_ref().filter(|s| s.has_crossed_threshold)?;
        Some(GapTarget {
            index: session.origin_visual_index,
            size: self.gap_size(session),
        })
    }

    /// Top-left corner of the floating row
    #[must_use]
    pub fn overlay_origin(&self, pointer: Point) -> Option<Point> {
        self.session
            .as_ref()
            .filter(|s| s.has_crossed_threshold)
            .map(|s| s.overlay_origin(pointer))
    }

    /// Leaf flagged as the stack target
    #[must_use]
    pub fn stack_target(&self, now: Instant) -> Option<&LeafId> {
        let session = self.session.as_ref()?;
        if session.merge_target_group.is_some() {
            return None;
        }
        session.ready_stack_target(now, self.config.stack_hold)
    }

    /// Group flagged as the merge target
    #[must_use]
    pub fn merge_target(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.merge_target_group.as_deref())
    }

    fn gap_size(&self, session: &DragSession) -> f64 {
        session.source_bounds.height + self.config.row_margin
    }
}

fn update_hover(
    session: &mut DragSession,
    config: &DragConfig,
    position: Point,
    rows: &[RowGeometry],
    now: Instant,
) {
    let others: Vec<&RowGeometry> = rows.iter().filter(|r| r.entry != session.source).collect();
    let leaf_source = session.source.kind == EntryKind::Leaf;

    if leaf_source
        && let Some(group) = group_header_at(others.iter().copied(), position)
        && session.source_group.as_deref() != Some(group)
    {
        if session.merge_target_group.as_deref() != Some(group) {
            tracing::trace!(group, "Merge target entered");
        }
        session.merge_target_group = Some(group.to_string());
        session.stack_candidate = None;
        return;
    }
    session.merge_target_group = None;

    session.current_insert_visual_index = insertion_index(others.iter().copied(), position.y);

    if !leaf_source {
        return;
    }
    let hovered = row_at(others.iter().copied(), position).and_then(|row| row.entry.leaf_id());
    session.stack_candidate = match hovered {
        Some(target) => match session.stack_candidate.take() {
            Some(candidate) if candidate.holds(&target, position, config.stack_tolerance) => {
                Some(candidate)
            }
            _ => Some(StackCandidate::new(target, now, position)),
        },
        None => None,
    };
}
