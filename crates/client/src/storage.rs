//! Key-value storage for persisted identity values.
//!
//! Responsibilities:
//! - Define the [`KeyValueStorage`] seam with an initialization gate.
//! - Provide an in-memory store and a JSON-file store.
//!
//! Does NOT handle:
//! - Deciding what is stored (see [`crate::identity`]).
//!
//! Invariants:
//! - File writes are atomic (temp file + rename).
//! - A corrupt file is moved aside to `*.corrupt.<timestamp>` and replaced
//!   by an empty store.
//! - Reads and writes against an uninitialized store never block.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Pluggable synchronous key-value store.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. Returns `None` for missing keys or an uninitialized store.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete a value.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether the store has finished loading.
    fn is_initialized(&self) -> bool;
}

/// Process-local store. Always initialized.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
struct FileState {
    values: BTreeMap<String, String>,
    initialized: bool,
}

/// JSON-file store. Uninitialized until [`FileStorage::load`] succeeds.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileStorage {
    /// Create an unloaded store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(FileState::default()),
        }
    }

    /// Create a store backed by `path` and load it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self::new(path);
        storage.load()?;
        Ok(storage)
    }

    /// Platform data location, e.g. `~/.local/share/schema-inspector/storage.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "schema-inspector").ok_or_else(|| {
            ClientError::Storage("failed to determine project directories".to_string())
        })?;
        Ok(dirs.data_dir().join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read the backing file. A missing file loads as empty.
    pub fn load(&self) -> Result<()> {
        let values = match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    let backup = self.backup_corrupt()?;
                    warn!(error = %e, backup = %backup.display(), "Storage file was corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ClientError::Storage(format!("failed to read storage: {}", e))),
        };

        let mut state = self.lock();
        debug!(path = %self.path.display(), keys = values.len(), "Storage loaded");
        state.values = values;
        state.initialized = true;
        Ok(())
    }

    fn backup_corrupt(&self) -> Result<PathBuf> {
        let timestamp = chrono::Utc::now().timestamp();
        let backup = self.path.with_extension(format!("corrupt.{}", timestamp));
        std::fs::rename(&self.path, &backup)
            .map_err(|e| ClientError::Storage(format!("failed to back up storage: {}", e)))?;
        Ok(backup)
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::Storage(format!("failed to create directory: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(values)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)
            .map_err(|e| ClientError::Storage(format!("failed to write storage: {}", e)))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| ClientError::Storage(format!("failed to replace storage: {}", e)))?;
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(ClientError::Storage("storage is not initialized".to_string()));
        }
        let mut next = state.values.clone();
        change(&mut next);
        self.persist(&next)?;
        state.values = next;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let state = self.lock();
        if !state.initialized {
            return None;
        }
        state.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn is_initialized(&self) -> bool {
        self.lock().initialized
    }
}
