//! Key/value persistence collaborators
//!
//! The engine persists three values: the serialized unified order, the
//! legacy-migration flag and the collapsed-group set. Anything that can get
//! and set strings by key can back it.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// A string-valued key/value store
pub trait KeyValueStore {
    /// Reads a key; `Ok(None)` if it was never written
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Read` if the backend fails.
    fn get_string(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a key, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if the backend fails.
    fn set_string(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// In-memory store
///
/// Write and read failures can be injected to exercise the non-fatal
/// persistence paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Makes every subsequent read fail (or succeed again)
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Returns the raw stored value, bypassing failure injection
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        if self.fail_reads {
            return Err(StoreError::Read {
                key: key.to_string(),
                reason: "injected read failure".to_string(),
            });
        }
        Ok(self.values.get(key).cloned())
    }

    fn set_string(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store, one file per key
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store in the platform data directory
    ///
    /// Returns `None` when the platform exposes no data directory.
    #[must_use]
    pub fn open_default() -> Option<Self> {
        crate::config::default_store_dir().map(Self::new)
    }

    /// Root directory of the store
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let write_err = |e: std::io::Error| StoreError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }
}
