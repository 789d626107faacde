//! In-memory backend — useful for testing and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::StateStore;
use tidepool_core::error::PersistenceError;

/// An in-memory state store keyed by collection name.
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
