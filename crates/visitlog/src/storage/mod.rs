//! Storage layer for visitlog.
//!
//! Persistence is a best-effort cache: the [`PersistentStore`] facade maps
//! string keys to JSON documents over a [`KeyValueBackend`], and never lets a
//! storage failure reach its caller. Reads fall back to a default, writes
//! report success as a plain `bool`, and every failure is logged.

mod memory;
pub mod schema;
mod sqlite;

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Raw string key/value storage.
///
/// Implementations report failures; the [`PersistentStore`] above them
/// decides what to do with those failures.
pub trait KeyValueBackend {
    /// Fetch the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Returns `true` if something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn remove(&mut self, key: &str) -> Result<bool>;

    /// Human-readable description of where data lives.
    fn describe(&self) -> String;
}

/// Either a durable database or the in-memory fallback.
#[derive(Debug)]
pub enum AnyBackend {
    /// File-backed storage.
    Sqlite(SqliteBackend),
    /// Process-lifetime storage; nothing survives exit.
    Memory(MemoryBackend),
}

impl KeyValueBackend for AnyBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Sqlite(b) => b.get(key),
            Self::Memory(b) => b.get(key),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Sqlite(b) => b.put(key, value),
            Self::Memory(b) => b.put(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        match self {
            Self::Sqlite(b) => b.remove(key),
            Self::Memory(b) => b.remove(key),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Sqlite(b) => b.describe(),
            Self::Memory(b) => b.describe(),
        }
    }
}

/// Best-effort JSON document store over a [`KeyValueBackend`].
#[derive(Debug)]
pub struct PersistentStore<B> {
    backend: B,
}

impl PersistentStore<AnyBackend> {
    /// Open the database at `path`, or fall back to memory if that fails.
    ///
    /// The fallback is logged and otherwise silent: the session keeps
    /// working, it just won't be remembered.
    #[must_use]
    pub fn open_or_degrade(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match SqliteBackend::open(path) {
            Ok(backend) => Self::new(AnyBackend::Sqlite(backend)),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Storage unavailable, records will not persist"
                );
                Self::new(AnyBackend::Memory(MemoryBackend::new()))
            }
        }
    }

    /// Whether this session fell back to non-persistent storage.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self.backend, AnyBackend::Memory(_))
    }
}

impl<B: KeyValueBackend> PersistentStore<B> {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Borrow the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read and decode the document under `key`.
    ///
    /// Returns `default` when the key is absent, the backend fails, or the
    /// stored text is not valid JSON for `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No stored entry, using default");
                return default;
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored entry, using default");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Stored entry is malformed, using default");
                default
            }
        }
    }

    /// Encode `value` and store it under `key`.
    ///
    /// Returns `true` if the value was persisted.
    pub fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode entry, not persisted");
                return false;
            }
        };

        match self.backend.put(key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to write entry, not persisted");
                false
            }
        }
    }

    /// Delete the document under `key`.
    ///
    /// Returns `true` if the key is gone afterwards.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.backend.remove(key) {
            Ok(_) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to remove entry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::logging::init_test_logging;

    /// Backend whose every operation fails, like a disabled or full store.
    #[derive(Debug)]
    struct FailingBackend;

    impl KeyValueBackend for FailingBackend {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Io(std::io::Error::other("storage disabled")))
        }

        fn put(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("quota exceeded")))
        }

        fn remove(&mut self, _key: &str) -> Result<bool> {
            Err(Error::Io(std::io::Error::other("storage disabled")))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn test_read_missing_returns_default() {
        let store = PersistentStore::new(MemoryBackend::new());
        let value: Vec<String> = store.read("visitors", vec!["fallback".to_string()]);
        assert_eq!(value, vec!["fallback".to_string()]);
    }

    #[test]
    fn test_write_then_read() {
        let mut store = PersistentStore::new(MemoryBackend::new());
        assert!(store.write("numbers", &vec![1, 2, 3]));

        let value: Vec<i32> = store.read("numbers", Vec::new());
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn test_malformed_entry_returns_default() {
        init_test_logging();
        let store = PersistentStore::new(MemoryBackend::with_entry("visitors", "{not json"));
        let value: Vec<i32> = store.read("visitors", Vec::new());
        assert!(value.is_empty());
    }

    #[test]
    fn test_wrong_shape_returns_default() {
        let store = PersistentStore::new(MemoryBackend::with_entry("visitors", r#"{"a":1}"#));
        let value: Vec<i32> = store.read("visitors", vec![7]);
        assert_eq!(value, vec![7]);
    }

    #[test]
    fn test_failing_backend_is_swallowed() {
        init_test_logging();
        let mut store = PersistentStore::new(FailingBackend);

        let value: Vec<i32> = store.read("visitors", vec![42]);
        assert_eq!(value, vec![42]);
        assert!(!store.write("visitors", &vec![1]));
        assert!(!store.remove("visitors"));
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let mut store = PersistentStore::new(MemoryBackend::new());
        assert!(store.remove("visitors"));
    }

    #[test]
    fn test_open_or_degrade_with_sqlite() {
        let path = std::env::temp_dir().join(format!(
            "visitlog_degrade_ok_{}.db",
            std::process::id()
        ));
        let store = PersistentStore::open_or_degrade(&path);
        assert!(!store.is_degraded());
        assert!(store.backend().describe().contains("sqlite"));

        drop(store);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_or_degrade_falls_back_to_memory() {
        init_test_logging();
        // A regular file cannot be used as a parent directory.
        let blocker = std::env::temp_dir().join(format!(
            "visitlog_degrade_blocker_{}",
            std::process::id()
        ));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut store = PersistentStore::open_or_degrade(blocker.join("visitlog.db"));
        assert!(store.is_degraded());
        assert!(store.write("numbers", &vec![1]));
        assert_eq!(store.read::<Vec<i32>>("numbers", Vec::new()), vec![1]);

        let _ = std::fs::remove_file(&blocker);
    }
}
