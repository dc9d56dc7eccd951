//! Insertion gap animation
//!
//! While a row is dragged, the list opens a gap at the current insertion
//! slot. [`GapAnimator`] eases every slot's gap toward its target once per
//! frame:
//!
//! ```text
//! target[i]  = gap_size if i == insert_index else 0
//! current[i] = lerp(current[i], target[i], smoothing * dt)
//! ```
//!
//! `dt` is capped before use so a stalled frame cannot overshoot. The
//! animator is a write-only consumer of drag state: layout and order logic
//! never read gap sizes back.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::EngineSettings;

/// Gaps smaller than this are treated as closed and dropped
const SETTLED_EPSILON: f64 = 0.05;

/// Where the gap should be open this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapTarget {
    /// Visual slot index (the gap sits above the row at this index)
    pub index: usize,
    /// Full gap height in pixels
    pub size: f64,
}

/// Per-slot gap sizes eased toward a single open slot
#[derive(Debug, Clone)]
pub struct GapAnimator {
    gaps: BTreeMap<usize, f64>,
    smoothing: f64,
    max_delta: Duration,
}

impl Default for GapAnimator {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl GapAnimator {
    /// Creates an animator with the given smoothing rate (per second) and frame cap
    #[must_use]
    pub fn new(smoothing: f64, max_delta: Duration) -> Self {
        Self {
            gaps: BTreeMap::new(),
            smoothing: smoothing.max(0.0),
            max_delta,
        }
    }

    /// Creates an animator from engine settings
    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.gap_smoothing, settings.max_frame_delta())
    }

    /// Opens a gap instantly, used when a row leaves the layout
    pub fn open_at(&mut self, index: usize, size: f64) {
        self.gaps.insert(index, size.max(0.0));
    }

    /// Advances every slot one frame toward its target
    pub fn tick(&mut self, target: Option<GapTarget>, dt: Duration) {
        let dt = dt.min(self.max_delta).as_secs_f64();
        let t = (self.smoothing * dt).clamp(0.0, 1.0);

        if let Some(target) = target {
            self.gaps.entry(target.index).or_insert(0.0);
        }

        for (index, current) in &mut self.gaps {
            let goal = match target {
                Some(target) if target.index == *index => target.size,
                _ => 0.0,
            };
            *current += (goal - *current) * t;
        }

        self.gaps.retain(|index, current| {
            *current > SETTLED_EPSILON || target.is_some_and(|t| t.index == *index)
        });
    }

    /// Current gap above the row at `index`
    #[must_use]
    pub fn gap(&self, index: usize) -> f64 {
        self.gaps.get(&index).copied().unwrap_or(0.0)
    }

    /// Vertical offset for the row at `index`: all gaps at or above it
    #[must_use]
    pub fn offset_for_row(&self, index: usize) -> f64 {
        self.gaps.range(..=index).map(|(_, gap)| *gap).sum()
    }

    /// Returns true if every gap is closed
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Closes every gap immediately
    pub fn clear(&mut self) {
        self.gaps.clear();
    }

    /// Open slots and their sizes
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.gaps.iter().map(|(i, g)| (*i, *g))
    }
}
