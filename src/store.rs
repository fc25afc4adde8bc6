//! Local key-value persistence with corruption tolerance.
//!
//! The console keeps an offline copy of each resource under its own key. Keys
//! are independent: there is no transaction spanning them.
//!
//! - [`Storage`]: raw string get/set, implemented by [`FileStore`] (one JSON
//!   file per key in a state directory) and [`MemoryStore`] (tests)
//! - [`LocalStore`]: typed reads and writes on top of a [`Storage`]
//!
//! Reads never fail: an absent, empty or unparsable value yields the caller's
//! fallback. Writes are best-effort: failures are logged and dropped.

use crate::error::ConsoleError;
use serde::Serialize;
use serde::de::DeserializeOwned;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Logical storage keys.
pub mod keys {
    pub const NEWS: &str = "digestNews";
    pub const PROMPTS: &str = "digestPrompts";
    pub const SHEETS: &str = "digestSheets";
    pub const RELEASE: &str = "digestRelease";
    pub const DATA_MODE: &str = "digestDataMode";
}

/// Raw string storage, in the spirit of a browser's `localStorage`.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        (**self).set_item(key, value)
    }
}

/// One file per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        fs::create_dir_all(&self.dir)?;
        // Write then rename; readers never observe a partial blob.
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// In-memory storage. `failing()` builds one whose writes always error,
/// standing in for a full disk or exhausted quota.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    reject_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            items: Mutex::default(),
            reject_writes: true,
        }
    }

    /// Seed a raw value, bypassing `reject_writes`.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().ok().and_then(|items| items.get(key).cloned())
    }
}

#[cfg(test)]
impl Storage for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ConsoleError> {
        let items = self
            .items
            .lock()
            .map_err(|_| ConsoleError::Storage(std::io::Error::other("memory store poisoned")))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ConsoleError> {
        if self.reject_writes {
            return Err(ConsoleError::Storage(std::io::Error::other("quota exceeded")));
        }
        let mut items = self
            .items
            .lock()
            .map_err(|_| ConsoleError::Storage(std::io::Error::other("memory store poisoned")))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed, failure-absorbing access to a [`Storage`].
#[derive(Debug, Clone)]
pub struct LocalStore<S> {
    storage: S,
}

impl<S: Storage> LocalStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read and decode `key`, or return `fallback()` if anything goes wrong.
    #[instrument(level = "debug", skip(self, fallback))]
    pub fn read<T, F>(&self, key: &str, fallback: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                debug!(key, "No stored value; using seed data");
                return fallback();
            }
            Err(e) => {
                warn!(key, error = %e, "Local read failed; using seed data");
                return fallback();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Stored value does not parse; using seed data");
                fallback()
            }
        }
    }

    /// Encode and store `value`. Errors are logged, never returned.
    #[instrument(level = "debug", skip(self, value))]
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, error = %e, "Could not encode value for local storage; dropping write");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(key, &encoded) {
            warn!(key, error = %e, "Local write failed; change not persisted");
        }
    }

    /// Raw string value of a key, used for the mode flag.
    pub fn read_raw(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    pub fn write_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set_item(key, value) {
            warn!(key, error = %e, "Local write failed; change not persisted");
        }
    }
}
