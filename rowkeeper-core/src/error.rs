//! Error types for the ordered-list engine
//!
//! None of these errors is fatal to the host. Stale references are repaired
//! silently, naming collisions are resolved by suffixing, persistence failures
//! are logged while the in-memory order stays authoritative, and gestures
//! that no longer match the layout are cancelled.

use thiserror::Error;

/// Errors raised by order mutations
#[derive(Debug, Error)]
pub enum OrderError {
    /// The referenced leaf no longer exists
    #[error("leaf not found: {0}")]
    LeafNotFound(String),

    /// The referenced group no longer exists
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// The entry is not part of the unified order
    #[error("entry not found in order: {0}")]
    EntryNotFound(String),

    /// A group with this name already exists
    #[error("group already exists: {0}")]
    GroupExists(String),

    /// The operation does not apply to its arguments
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Persistence failed underneath an order operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Returns true for errors caused by an identifier that no longer resolves
    #[must_use]
    pub const fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            Self::LeafNotFound(_) | Self::GroupNotFound(_) | Self::EntryNotFound(_)
        )
    }
}

/// Errors raised by the key/value persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a key failed
    #[error("failed to read key '{key}': {reason}")]
    Read {
        /// Key being read
        key: String,
        /// Underlying failure
        reason: String,
    },

    /// Writing a key failed
    #[error("failed to write key '{key}': {reason}")]
    Write {
        /// Key being written
        key: String,
        /// Underlying failure
        reason: String,
    },

    /// Stored bytes could not be decoded or encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored envelope carries a version this build does not understand
    #[error("unsupported order format version {0}")]
    UnsupportedVersion(u32),
}

/// Errors raised while loading or saving engine settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the settings file failed
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML for `EngineSettings`
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A settings value is out of range
    #[error("invalid value for {field}: {reason}")]
    Validation {
        /// Offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for order operations
pub type OrderResult<T> = Result<T, OrderError>;

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
