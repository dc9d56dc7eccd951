//! In-memory unified order
//!
//! [`OrderModel`] owns the top-level sequence of group and leaf entries and
//! translates between logical indices (positions in the full sequence) and
//! visual indices (positions among rows currently shown at top level).
//! Every mutation validates all of its preconditions before touching
//! anything, so a failed operation leaves both the model and the provider
//! unchanged.

mod edit;
mod model;

pub use edit::{IndexEdit, OrderChange};
pub use model::{OrderModel, unique_group_name};
