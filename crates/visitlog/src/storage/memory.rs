//! In-process key/value storage.

use std::collections::HashMap;

use super::KeyValueBackend;
use crate::error::Result;

/// Key/value backend that lives only as long as the process.
///
/// Used in tests and as the fallback when the database cannot be opened.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with one raw entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut backend = Self::new();
        backend.entries.insert(key.into(), value.into());
        backend
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn describe(&self) -> String {
        "in-memory only (not persisted)".to_string()
    }
}
