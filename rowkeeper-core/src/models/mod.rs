//! Core data structures
//!
//! Leaves, groups, order entries, and the geometry used for hit testing.

mod geometry;
mod item;

pub use geometry::{Point, Rect};
pub use item::{EntryKind, Leaf, LeafId, OrderEntry, compare_leaves_by_name, compare_names};
