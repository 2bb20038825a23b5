//! File-backed storage for native builds
//!
//! One `<key>.json` file per entry. Writes go to a temporary file first and
//! are renamed over the old one so a crash never leaves a half-written record.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::{Storage, StorageError};

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::info!("File storage at {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scratch_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("arcade-engines-test-{}-{}", std::process::id(), n))
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = scratch_dir();
        let mut storage = FileStorage::open(&dir).unwrap();

        assert_eq!(storage.get("arcade.snake").unwrap(), None);
        storage.set("arcade.snake", "120").unwrap();
        assert_eq!(storage.get("arcade.snake").unwrap().as_deref(), Some("120"));

        // Reopening sees the same data
        let reopened = FileStorage::open(&dir).unwrap();
        assert_eq!(reopened.get("arcade.snake").unwrap().as_deref(), Some("120"));

        storage.remove("arcade.snake").unwrap();
        storage.remove("arcade.snake").unwrap();
        assert_eq!(storage.get("arcade.snake").unwrap(), None);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_storage_sanitizes_keys() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).unwrap();
        let path = storage.path_for("../escape/attempt");
        assert_eq!(path.parent(), Some(dir.as_path()));
        fs::remove_dir_all(&dir).ok();
    }
}
