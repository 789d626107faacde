//! Flat state persistence for Tidepool.
//!
//! Each top-level collection (folders, items, basins, workspaces) is
//! independently serialized as one JSON array under a dedicated key —
//! write-through on every mutation, no batching or debounce. The store
//! trait is synchronous: the flat layout is a localStorage analog, and all
//! mutations happen inside one logical tick.
//!
//! Loading is tolerant by design: a missing key yields an empty collection,
//! and a corrupt payload resets the offending collection to empty with a
//! warning instead of failing the application. Timestamp rehydration (ISO
//! strings back to real dates, "now" substituted for malformed or missing
//! values at any nesting depth) rides on the lenient serde module in
//! `tidepool-core`.

pub mod file_store;
pub mod in_memory;

pub use file_store::JsonFileStore;
pub use in_memory::InMemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use tidepool_core::error::PersistenceError;

/// Dedicated keys for the persisted collections.
pub mod keys {
    pub const FOLDERS: &str = "folders";
    pub const ITEMS: &str = "items";
    pub const BASINS: &str = "basins";
    pub const WORKSPACES: &str = "workspaces";
}

/// A flat key-to-payload store. Implementations: JSON files on disk,
/// in-memory (for testing and ephemeral sessions).
pub trait StateStore: Send + Sync {
    /// The backend name (e.g., "json_file", "in_memory").
    fn name(&self) -> &str;

    /// Read the payload stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write `payload` under `key`, replacing any prior value.
    fn write(&self, key: &str, payload: &str) -> Result<(), PersistenceError>;

    /// Remove the payload under `key`. Removing an absent key is not an
    /// error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Load a collection from its dedicated key.
///
/// Missing key → empty. Corrupt payload → warning, collection resets to
/// empty. This function never fails the load.
pub fn load_collection<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Vec<T> {
    let payload = match store.read(key) {
        Ok(Some(payload)) => payload,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(collection = key, error = %e, "Failed to read collection, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&payload) {
        Ok(entities) => entities,
        Err(e) => {
            warn!(collection = key, error = %e, "Corrupt collection payload, resetting to empty");
            Vec::new()
        }
    }
}

/// Serialize the full collection array under its dedicated key.
pub fn save_collection<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    entities: &[T],
) -> Result<(), PersistenceError> {
    let payload = serde_json::to_string(entities)?;
    store.write(key, &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::knowledge::{Folder, Item, Section};

    #[test]
    fn load_missing_key_is_empty() {
        let store = InMemoryStore::new();
        let folders: Vec<Folder> = load_collection(&store, keys::FOLDERS);
        assert!(folders.is_empty());
    }

    #[test]
    fn corrupt_payload_resets_to_empty() {
        let store = InMemoryStore::new();
        store.write(keys::FOLDERS, "{not json").unwrap();
        let folders: Vec<Folder> = load_collection(&store, keys::FOLDERS);
        assert!(folders.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = InMemoryStore::new();
        let folders = vec![Folder::new("Research", "")];
        save_collection(&store, keys::FOLDERS, &folders).unwrap();

        let loaded: Vec<Folder> = load_collection(&store, keys::FOLDERS);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, folders[0].id);
        assert_eq!(loaded[0].created_at, folders[0].created_at);
    }

    #[test]
    fn round_trip_preserves_dates_at_depth_three() {
        // folder → subfolder → item → section
        let mut item = Item::new("Note", "Body");
        item.sections.push(Section {
            id: "s1".into(),
            item_id: item.id.clone(),
            title: "Details".into(),
            content: "More".into(),
            embeddings: None,
        });
        let mut child = Folder::new("Child", "");
        child.items.push(item);
        let mut root = Folder::new("Root", "");
        root.subfolders.push(child);

        let store = InMemoryStore::new();
        save_collection(&store, keys::FOLDERS, &[root.clone()]).unwrap();
        let loaded: Vec<Folder> = load_collection(&store, keys::FOLDERS);

        let nested = &loaded[0].subfolders[0].items[0];
        assert_eq!(nested.created_at, root.subfolders[0].items[0].created_at);
        assert_eq!(nested.sections[0].title, "Details");
    }
}
