//! JSON-file backend — one `<key>.json` file per collection.
//!
//! Storage location: a data directory chosen by the caller, typically
//! `~/.tidepool/state`. Files are created on first write; the directory is
//! created lazily. Simple, portable, human-inspectable.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::StateStore;
use tidepool_core::error::PersistenceError;

/// A file-backed state store writing one JSON file per collection key.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(dir = %dir.display(), "JSON file store configured");
        Self { dir }
    }

    /// Default location: `~/.tidepool/state`.
    pub fn default_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".tidepool").join("state")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn name(&self) -> &str {
        "json_file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Storage(format!(
                "Failed to read '{key}': {e}"
            ))),
        }
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PersistenceError::Storage(format!("Failed to create state directory: {e}"))
        })?;
        std::fs::write(self.path_for(key), payload)
            .map_err(|e| PersistenceError::Storage(format!("Failed to write '{key}': {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::Storage(format!(
                "Failed to remove '{key}': {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn write_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());

        store.write(keys::ITEMS, "[]").unwrap();
        assert_eq!(store.read(keys::ITEMS).unwrap().as_deref(), Some("[]"));

        // One file per key
        assert!(tmp.path().join("items.json").exists());
    }

    #[test]
    fn read_missing_key_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());
        assert!(store.read("nothing").unwrap().is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());

        store.write(keys::BASINS, "[]").unwrap();
        store.remove(keys::BASINS).unwrap();
        store.remove(keys::BASINS).unwrap();
        assert!(store.read(keys::BASINS).unwrap().is_none());
    }

    #[test]
    fn creates_directory_on_first_write() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("deep").join("state");
        let store = JsonFileStore::new(&nested);

        store.write(keys::FOLDERS, "[]").unwrap();
        assert!(nested.join("folders.json").exists());
    }
}
