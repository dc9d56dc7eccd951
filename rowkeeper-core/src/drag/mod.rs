//! Interactive drag reordering
//!
//! [`DragController`] turns pointer events over host-supplied row geometry
//! into a [`DragResolution`]: a click, a reorder, a merge into an existing
//! group or a stack into a new group. Hit testing lives in [`hit_test`] and
//! per-gesture state in [`DragSession`].

mod controller;
mod session;

pub use controller::{
    CancelReason, DragConfig, DragController, DragPhase, DragResolution, MoveOutcome, PressOutcome,
};
pub use hit_test::{DropPosition, RowGeometry};
pub use session::{DragSession, StackCandidate};
