//! Save/load persistence with corruption recovery
//!
//! Features:
//! - Pluggable key/value backends (memory, file on native, LocalStorage on web)
//! - Versioned JSON envelope for whole-state saves
//! - Corruption detection: malformed data reads as absent, never as a fault

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

/// Current envelope version for versioned saves
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage rejected write for `{key}`: {reason}")]
    Rejected { key: String, reason: String },
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key/value backend
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage. Clones share the same entries, so a store can be
/// reopened over the data a previous session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Read and decode a JSON value. Absent, unreadable and malformed entries all
/// come back as `None`; the latter two are logged.
pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read `{}`: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding malformed record `{}`: {}", key, e);
            None
        }
    }
}

/// Encode a value as JSON and store it under `key`
pub fn write_json<T: Serialize + ?Sized>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

/// Read a value written by [`write_versioned`]. Version mismatches are treated
/// like corruption.
pub fn read_versioned<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let envelope: Envelope<T> = read_json(storage, key)?;
    if envelope.version != SAVE_VERSION {
        log::warn!(
            "Ignoring `{}`: save version {} (expected {})",
            key,
            envelope.version,
            SAVE_VERSION
        );
        return None;
    }
    Some(envelope.data)
}

/// Store a value wrapped in a `{ version, data }` envelope
pub fn write_versioned<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    write_json(
        storage,
        key,
        &Envelope {
            version: SAVE_VERSION,
            data: value,
        },
    )
}
