//! The visitor register.
//!
//! [`VisitorStore`] owns the in-memory collection of records, which is the
//! source of truth for the running session, and mirrors it in full to a
//! [`PersistentStore`] entry after every mutation.
//!
//! Records can be added one at a time or replaced wholesale, and the whole
//! register can be cleared. There is no way to edit or remove a single
//! record.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::form::check_visitor;
use crate::storage::{KeyValueBackend, PersistentStore};
use crate::visitor::{Purpose, Visitor};

/// Default key under which the register is stored.
pub const DEFAULT_STORAGE_KEY: &str = "visitors";

/// Proof that the user explicitly agreed to wipe the register.
///
/// Clearing cannot be undone, so [`VisitorStore::clear_all`] takes one of
/// these. Callers obtain it only from an affirmative answer.
#[derive(Debug)]
pub struct ClearConfirmation {
    _private: (),
}

impl ClearConfirmation {
    /// Record an explicit, out-of-band confirmation such as a `--yes` flag.
    #[must_use]
    pub fn affirm() -> Self {
        Self { _private: () }
    }

    /// Interpret a typed answer to "are you sure?".
    ///
    /// Only `y` or `yes` (any case, surrounding whitespace ignored) confirm.
    #[must_use]
    pub fn from_answer(answer: &str) -> Option<Self> {
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
            Some(Self::affirm())
        } else {
            None
        }
    }
}

/// Summary of the register's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of records.
    pub total: usize,
    /// Record count per purpose, in [`Purpose::ALL`] order.
    pub by_purpose: Vec<(Purpose, usize)>,
    /// Earliest registration time.
    pub oldest: Option<DateTime<Utc>>,
    /// Latest registration time.
    pub newest: Option<DateTime<Utc>>,
}

/// In-memory visitor register mirrored to persistent storage.
#[derive(Debug)]
pub struct VisitorStore<B: KeyValueBackend> {
    persistent: PersistentStore<B>,
    key: String,
    records: Vec<Visitor>,
}

impl<B: KeyValueBackend> VisitorStore<B> {
    /// Load the register stored under `key`.
    ///
    /// Missing or unreadable content yields an empty register. Records are
    /// decoded one at a time: a record that does not decode, breaks a field
    /// rule, or repeats an earlier id is dropped and the rest are kept.
    pub fn load(persistent: PersistentStore<B>, key: impl Into<String>) -> Self {
        let key = key.into();
        let stored: Vec<serde_json::Value> = persistent.read(&key, Vec::new());

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(stored.len());
        for (index, raw) in stored.into_iter().enumerate() {
            let record: Visitor = match serde_json::from_value(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(index, error = %e, "Dropping stored record that does not decode");
                    continue;
                }
            };
            if let Err(errors) = check_visitor(&record) {
                warn!(id = record.id(), %errors, "Dropping stored record with invalid fields");
                continue;
            }
            if !seen.insert(record.id().to_string()) {
                warn!(id = record.id(), "Dropping stored record with duplicate id");
                continue;
            }
            records.push(record);
        }

        debug!(key = %key, count = records.len(), "Loaded visitor register");
        Self {
            persistent,
            key,
            records,
        }
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Visitor] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the register is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Visitor> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// The storage key this register is mirrored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrow the persistent store.
    #[must_use]
    pub fn persistent(&self) -> &PersistentStore<B> {
        &self.persistent
    }

    /// Append one record and persist the register.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if a record with the same id exists;
    /// the register is left untouched.
    pub fn add(&mut self, record: Visitor) -> Result<()> {
        if self.get(record.id()).is_some() {
            return Err(Error::duplicate_id(record.id()));
        }

        info!(id = record.id(), flat = record.flat_number(), "Registered visitor");
        self.records.push(record);
        self.persist();
        Ok(())
    }

    /// Replace every record and persist the register.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if `records` repeats an id; the
    /// register is left untouched.
    pub fn replace_all(&mut self, records: Vec<Visitor>) -> Result<()> {
        if let Some(id) = first_duplicate_id(&records) {
            return Err(Error::duplicate_id(id));
        }

        info!(count = records.len(), "Replaced visitor register");
        self.records = records;
        self.persist();
        Ok(())
    }

    /// Remove every record and the persistent entry.
    ///
    /// Returns how many records were removed. Clearing an empty register
    /// is a no-op.
    pub fn clear_all(&mut self, _confirmation: ClearConfirmation) -> usize {
        let removed = self.records.len();
        self.records.clear();
        self.persistent.remove(&self.key);

        if removed > 0 {
            info!(removed, "Cleared visitor register");
        }
        removed
    }

    /// Summarize the register.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let by_purpose = Purpose::ALL
            .into_iter()
            .map(|p| (p, self.records.iter().filter(|r| r.purpose() == p).count()))
            .collect();

        StoreStats {
            total: self.records.len(),
            by_purpose,
            oldest: self.records.iter().map(Visitor::timestamp).min(),
            newest: self.records.iter().map(Visitor::timestamp).max(),
        }
    }

    fn persist(&mut self) {
        if !self.persistent.write(&self.key, &self.records) {
            warn!("Visitor register kept in memory only");
        }
    }
}

fn first_duplicate_id(records: &[Visitor]) -> Option<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .find(|r| !seen.insert(r.id()))
        .map(|r| r.id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::storage::MemoryBackend;
    use chrono::TimeZone;

    fn visitor(id: &str, name: &str, flat: &str, purpose: Purpose, minute: u32) -> Visitor {
        Visitor::new(
            id,
            name,
            flat,
            purpose,
            "9876543210",
            Utc.with_ymd_and_hms(2024, 3, 5, 10, minute, 0).unwrap(),
        )
    }

    fn empty_store() -> VisitorStore<MemoryBackend> {
        VisitorStore::load(
            PersistentStore::new(MemoryBackend::new()),
            DEFAULT_STORAGE_KEY,
        )
    }

    fn stored(store: &VisitorStore<MemoryBackend>) -> Vec<Visitor> {
        store.persistent().read(store.key(), Vec::new())
    }

    #[test]
    fn test_load_empty() {
        let store = empty_store();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.key(), "visitors");
    }

    #[test]
    fn test_load_malformed_entry_is_empty() {
        let backend = MemoryBackend::with_entry("visitors", "[{broken");
        let store = VisitorStore::load(PersistentStore::new(backend), "visitors");
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_appends_and_persists() {
        let mut store = empty_store();
        let first = visitor("a", "Ravi", "A-1", Purpose::Guest, 0);
        let second = visitor("b", "Asha", "B-2", Purpose::Delivery, 1);

        store.add(first.clone()).unwrap();
        store.add(second.clone()).unwrap();

        assert_eq!(store.records(), &[first.clone(), second.clone()]);
        assert_eq!(stored(&store), vec![first, second]);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = empty_store();
        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 0))
            .unwrap();

        let err = store
            .add(visitor("a", "Asha", "B-2", Purpose::Other, 1))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateId { ref id } if id == "a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].name(), "Ravi");
    }

    #[test]
    fn test_load_round_trip() {
        let mut store = empty_store();
        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 0))
            .unwrap();
        store
            .add(visitor("b", "Asha", "B-2", Purpose::Maintenance, 5))
            .unwrap();
        let expected = store.records().to_vec();

        let raw = store
            .persistent()
            .backend()
            .get("visitors")
            .unwrap()
            .unwrap();
        let reloaded = VisitorStore::load(
            PersistentStore::new(MemoryBackend::with_entry("visitors", raw)),
            "visitors",
        );
        assert_eq!(reloaded.records(), expected.as_slice());
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let records = vec![
            visitor("a", "Ravi", "A-1", Purpose::Guest, 0),
            visitor("a", "Copy", "A-1", Purpose::Guest, 1),
            visitor("b", "Asha", "B-2", Purpose::Guest, 2),
        ];
        let raw = serde_json::to_string(&records).unwrap();
        let store = VisitorStore::load(
            PersistentStore::new(MemoryBackend::with_entry("visitors", raw)),
            "visitors",
        );

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").map(Visitor::name), Some("Ravi"));
    }

    #[test]
    fn test_load_keeps_valid_records_beside_bad_ones() {
        init_test_logging();
        let good = visitor("a", "Ravi", "A-1", Purpose::Guest, 0);
        let mut raw = vec![serde_json::to_value(&good).unwrap()];

        let mut unknown_purpose =
            serde_json::to_value(visitor("b", "Asha", "B-2", Purpose::Guest, 1)).unwrap();
        unknown_purpose["purpose"] = "Courier".into();
        raw.push(unknown_purpose);

        let mut short_mobile =
            serde_json::to_value(visitor("c", "Karan", "C-3", Purpose::Other, 2)).unwrap();
        short_mobile["mobile"] = "12345".into();
        raw.push(short_mobile);

        raw.push(serde_json::json!("not a record"));

        let backend =
            MemoryBackend::with_entry("visitors", serde_json::to_string(&raw).unwrap());
        let mut store = VisitorStore::load(PersistentStore::new(backend), "visitors");
        assert_eq!(store.records(), &[good.clone()]);

        let added = visitor("d", "Meera", "D-4", Purpose::Delivery, 3);
        store.add(added.clone()).unwrap();
        assert_eq!(stored(&store), vec![good, added]);
    }

    #[test]
    fn test_replace_all() {
        let mut store = empty_store();
        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 0))
            .unwrap();

        let replacement = vec![
            visitor("x", "Meera", "C-3", Purpose::Other, 3),
            visitor("y", "Karan", "D-4", Purpose::Delivery, 4),
        ];
        store.replace_all(replacement.clone()).unwrap();

        assert_eq!(store.records(), replacement.as_slice());
        assert_eq!(stored(&store), replacement);
    }

    #[test]
    fn test_replace_all_rejects_duplicates() {
        let mut store = empty_store();
        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 0))
            .unwrap();

        let result = store.replace_all(vec![
            visitor("x", "Meera", "C-3", Purpose::Other, 3),
            visitor("x", "Karan", "D-4", Purpose::Delivery, 4),
        ]);
        assert!(matches!(result, Err(Error::DuplicateId { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_all_empties_register_and_entry() {
        let mut store = empty_store();
        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 0))
            .unwrap();
        store
            .add(visitor("b", "Asha", "B-2", Purpose::Guest, 1))
            .unwrap();

        assert_eq!(store.clear_all(ClearConfirmation::affirm()), 2);
        assert!(store.is_empty());
        assert_eq!(store.persistent().backend().get("visitors").unwrap(), None);
    }

    #[test]
    fn test_clear_all_twice_is_safe() {
        let mut store = empty_store();
        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 0))
            .unwrap();

        assert_eq!(store.clear_all(ClearConfirmation::affirm()), 1);
        assert_eq!(store.clear_all(ClearConfirmation::affirm()), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_confirmation_answers() {
        assert!(ClearConfirmation::from_answer("y").is_some());
        assert!(ClearConfirmation::from_answer("YES\n").is_some());
        assert!(ClearConfirmation::from_answer("  Yes ").is_some());
        assert!(ClearConfirmation::from_answer("").is_none());
        assert!(ClearConfirmation::from_answer("n").is_none());
        assert!(ClearConfirmation::from_answer("yeah").is_none());
    }

    #[test]
    fn test_stats() {
        let mut store = empty_store();
        assert_eq!(
            store.stats(),
            StoreStats {
                total: 0,
                by_purpose: Purpose::ALL.into_iter().map(|p| (p, 0)).collect(),
                oldest: None,
                newest: None,
            }
        );

        store
            .add(visitor("a", "Ravi", "A-1", Purpose::Guest, 30))
            .unwrap();
        store
            .add(visitor("b", "Asha", "B-2", Purpose::Guest, 10))
            .unwrap();
        store
            .add(visitor("c", "Karan", "C-3", Purpose::Delivery, 20))
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.by_purpose,
            vec![
                (Purpose::Delivery, 1),
                (Purpose::Guest, 2),
                (Purpose::Maintenance, 0),
                (Purpose::Other, 0),
            ]
        );
        assert_eq!(stats.oldest, Some(store.records()[1].timestamp()));
        assert_eq!(stats.newest, Some(store.records()[0].timestamp()));
    }
}
