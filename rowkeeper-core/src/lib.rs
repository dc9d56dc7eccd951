//! `Rowkeeper` Core Library
//!
//! This crate provides a unified ordered-list engine: a single vertical list
//! mixing ungrouped leaf items and named groups, with interactive drag
//! reordering, ad-hoc grouping and a persisted manual order that survives
//! external changes to the item set.
//!
//! # Crate Structure
//!
//! - [`models`] - Leaves, order entries and geometry
//! - [`provider`] - Item provider collaborator and change notifications
//! - [`store`] - Key/value persistence, load, repair and legacy migration
//! - [`order`] - In-memory unified order and its mutations
//! - [`filter`] - Filtering and sorting into the visual sequence
//! - [`drag`] - Pointer gesture state machine and hit testing
//! - [`animation`] - Insertion gap easing
//! - [`selection`] - Multi-selection remapping across reorders
//! - [`engine`] - Orchestration of all of the above for one list view
//! - [`config`] - Tunable settings persisted as TOML
//! - [`tracing`] - Structured logging setup

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod animation;
pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod filter;
pub mod models;
pub mod order;
pub mod provider;
pub mod selection;
pub mod store;
pub mod tracing;

// =============================================================================
// Convenience re-exports
//
// Hosts and tests may import from the crate root; the modular paths
// (e.g. `rowkeeper_core::drag::DragController`) remain canonical.
// =============================================================================

pub use animation::{GapAnimator, GapTarget};
pub use config::{EngineSettings, default_store_dir};
pub use drag::{
    CancelReason, DragConfig, DragController, DragPhase, DragResolution, DragSession,
    DropPosition, MoveOutcome, PressOutcome, RowGeometry, StackCandidate,
};
pub use engine::{
    EngineObserver, ListEngine, ObservedEvent, OrderSnapshot, RecordingObserver,
};
pub use error::{
    ConfigError, ConfigResult, OrderError, OrderResult, StoreError, StoreResult,
};
pub use filter::{
    FilterCriteria, SortKey, VisualLayout, VisualRow, build_visual_rows, compare_by_key,
};
pub use models::{
    EntryKind, Leaf, LeafId, OrderEntry, Point, Rect, compare_leaves_by_name, compare_names,
};
pub use order::{IndexEdit, OrderChange, OrderModel, unique_group_name};
pub use provider::{InMemoryProvider, ItemChange, ItemProvider, LiveItems};
pub use selection::{SelectionTracker, remap_after_move};
pub use store::{
    COLLAPSED_KEY, FileStore, KeyValueStore, LEGACY_ORDER_KEY, LoadedOrder, MIGRATION_FLAG_KEY,
    MemoryStore, ORDER_FORMAT_VERSION, ORDER_KEY, OrderStore, decode_order, default_order,
    encode_order, migrate_legacy, validate_and_repair,
};
pub use tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, get_tracing_config,
    init_tracing, is_tracing_initialized, span_names,
};
