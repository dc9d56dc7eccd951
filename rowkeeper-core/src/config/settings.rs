//! Tunable engine settings

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Directory name under the platform data directory
const APP_DIR_NAME: &str = "rowkeeper";

/// Gesture, animation and naming constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Pointer travel in pixels before a press becomes a drag
    pub drag_threshold: f64,
    /// How long the pointer must rest over a leaf before stacking is armed
    pub stack_hover_ms: u64,
    /// How far the pointer may wander while the stack timer runs
    pub stack_hover_tolerance: f64,
    /// Vertical margin added to the dragged row's height to size the gap
    pub row_margin: f64,
    /// Gap easing rate per second
    pub gap_smoothing: f64,
    /// Frame delta cap for gap easing
    pub max_frame_delta_ms: u64,
    /// Base name for groups created by stacking
    pub new_group_name: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            drag_threshold: 4.0,
            stack_hover_ms: 500,
            stack_hover_tolerance: 6.0,
            row_margin: 4.0,
            gap_smoothing: 14.0,
            max_frame_delta_ms: 50,
            new_group_name: "New Group".to_string(),
        }
    }
}

impl EngineSettings {
    /// Stack hover duration
    #[must_use]
    pub const fn stack_hover(&self) -> Duration {
        Duration::from_millis(self.stack_hover_ms)
    }

    /// Frame delta cap
    #[must_use]
    pub const fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    /// Checks every value is in range
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &str, reason: &str| {
            Err(ConfigError::Validation {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        if !self.drag_threshold.is_finite() || self.drag_threshold <= 0.0 {
            return invalid("drag_threshold", "must be a positive number");
        }
        if !self.stack_hover_tolerance.is_finite() || self.stack_hover_tolerance < 0.0 {
            return invalid("stack_hover_tolerance", "must not be negative");
        }
        if !self.row_margin.is_finite() || self.row_margin < 0.0 {
            return invalid("row_margin", "must not be negative");
        }
        if !self.gap_smoothing.is_finite() || self.gap_smoothing <= 0.0 {
            return invalid("gap_smoothing", "must be a positive number");
        }
        if self.max_frame_delta_ms == 0 {
            return invalid("max_frame_delta_ms", "must be at least 1");
        }
        if self.new_group_name.trim().is_empty() {
            return invalid("new_group_name", "cannot be empty");
        }
        Ok(())
    }

    /// Parses and validates settings from TOML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` or `ConfigError::Validation`.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes settings to TOML
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` if serialization fails.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads settings from a file; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes settings to a file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if validation, serialization or the write fails.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

/// Platform data directory for file-backed order storage
#[must_use]
pub fn default_store_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}
