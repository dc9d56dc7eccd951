//! Engine configuration
//!
//! This module provides [`EngineSettings`], persisted as TOML, and the
//! default location for file-backed order storage.

mod settings;

pub use settings::{EngineSettings, default_store_dir};
