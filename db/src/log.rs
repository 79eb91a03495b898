//! The persisted migration log.
//!
//! [`MigrationLog`] maps table names to [`MigrationRecord`]s and persists the
//! whole mapping as one JSON blob under a single key of an [`OptionStore`].
//! The key can be shared by several independent consumers, and several
//! logs can live side by side under different keys.
//!
//! Per table the log moves through:
//!
//! ```text
//! absent ──upsert──▶ migrated(H, unseeded) ──mark seeded──▶ migrated(H, seeded)
//!    ▲                      │  upsert with H' ≠ H keeps the seeded flag
//!    └──────remove──────────┘
//! ```
//!
//! Every mutation writes the full mapping back immediately.
//!
//! # Example
//!
//! ```
//! use table_migration_core::{Column, TableSchema};
//! use table_migration_db::{MemoryStore, MigrationLog};
//!
//! let schema = TableSchema::new("t1").with_column(Column::new("id", "INT"));
//! let mut log = MigrationLog::new(MemoryStore::new(), None).unwrap();
//!
//! assert!(log.can_migrate(&schema));
//! log.upsert_migration(&schema).unwrap();
//! assert!(!log.can_migrate(&schema));
//! assert!(!log.is_seeded("t1"));
//!
//! log.mark_table_seeded("t1").unwrap();
//! assert!(log.is_seeded("t1"));
//! ```

use std::collections::BTreeMap;

use table_migration_core::TableSchema;
use tracing::debug;

use crate::error::{MigrationError, Result};
use crate::record::{MigrationRecord, compose_schema_hash};
use crate::store::OptionStore;

/// Store key used when the caller does not supply one.
pub const DEFAULT_LOG_KEY: &str = "table_migration_log";

/// Table name → migration record mapping, backed by an [`OptionStore`].
#[derive(Debug)]
pub struct MigrationLog<S> {
    store: S,
    key: String,
    records: BTreeMap<String, MigrationRecord>,
}

impl<S: OptionStore> MigrationLog<S> {
    /// Loads the log stored under `key` (or [`DEFAULT_LOG_KEY`]).
    ///
    /// A key that was never written yields an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::LogCorrupt`] if the stored blob is not a
    /// table → record mapping or a key disagrees with its record's table
    /// name, and [`MigrationError::Store`] if the store cannot be read. A
    /// corrupt blob is never treated as an empty log.
    pub fn new(store: S, key: Option<&str>) -> Result<Self> {
        let key = key.unwrap_or(DEFAULT_LOG_KEY).to_string();
        let records = match store.get(&key)? {
            None => BTreeMap::new(),
            Some(blob) => decode(&key, &blob)?,
        };
        debug!(key = %key, tables = records.len(), "Loaded migration log");
        Ok(Self {
            store,
            key,
            records,
        })
    }

    /// Returns the store key this log persists under.
    pub fn log_key(&self) -> &str {
        &self.key
    }

    /// Returns `true` if a record exists for `table_name`.
    pub fn has_migration(&self, table_name: &str) -> bool {
        self.records.contains_key(table_name)
    }

    /// Looks up the record for `table_name`.
    pub fn get_migration(&self, table_name: &str) -> Option<&MigrationRecord> {
        self.records.get(table_name)
    }

    /// Returns `true` if a record exists for the schema's table and its hash
    /// matches the schema. A missing record is simply "no match".
    pub fn check_hash(&self, schema: &TableSchema) -> bool {
        self.records
            .get(schema.table_name())
            .is_some_and(|record| record.schema_hash() == compose_schema_hash(schema))
    }

    /// Returns `true` if the table is unknown or its schema has changed.
    pub fn can_migrate(&self, schema: &TableSchema) -> bool {
        !self.check_hash(schema)
    }

    /// Returns `true` if the table has a record marked seeded.
    pub fn is_seeded(&self, table_name: &str) -> bool {
        self.records
            .get(table_name)
            .is_some_and(MigrationRecord::is_seeded)
    }

    /// Records `schema` as migrated.
    ///
    /// - absent: inserts a new unseeded record and persists;
    /// - present with a different hash: replaces it with an updated record
    ///   (seeded flag kept) and persists;
    /// - present with the same hash: does nothing.
    pub fn upsert_migration(&mut self, schema: &TableSchema) -> Result<()> {
        let table_name = schema.table_name();
        let next = match self.records.get(table_name) {
            None => MigrationRecord::new_from_schema(schema),
            Some(_) if self.check_hash(schema) => return Ok(()),
            Some(existing) => existing.as_updated(schema),
        };
        debug!(table = %table_name, hash = %next.schema_hash(), "Recording migration");
        self.commit(table_name, Some(next))
    }

    /// Marks a migrated table as seeded. Already-seeded tables are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::NotMigrated`] if the table has no record.
    pub fn mark_table_seeded(&mut self, table_name: &str) -> Result<()> {
        let record = self
            .records
            .get(table_name)
            .ok_or_else(|| MigrationError::NotMigrated(table_name.to_string()))?;
        if record.is_seeded() {
            return Ok(());
        }
        let seeded = record.as_seeded();
        self.commit(table_name, Some(seeded))
    }

    /// Removes the table's record, if any.
    pub fn remove_migration(&mut self, table_name: &str) -> Result<()> {
        if !self.records.contains_key(table_name) {
            return Ok(());
        }
        debug!(table = %table_name, "Removing migration record");
        self.commit(table_name, None)
    }

    /// Iterates over all records, ordered by table name.
    pub fn migrations(&self) -> impl Iterator<Item = &MigrationRecord> {
        self.records.values()
    }

    /// Number of tables in the log.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no table has been migrated.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the log and returns the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Replaces (or with `None`, removes) one entry and persists the map.
    /// If persisting fails the previous entry is put back, so the in-memory
    /// log never claims state the store does not hold.
    fn commit(&mut self, table_name: &str, next: Option<MigrationRecord>) -> Result<()> {
        let previous = match next {
            Some(record) => self.records.insert(table_name.to_string(), record),
            None => self.records.remove(table_name),
        };
        if let Err(e) = self.save() {
            match previous {
                Some(old) => self.records.insert(table_name.to_string(), old),
                None => self.records.remove(table_name),
            };
            return Err(e);
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let blob = serde_json::to_string(&self.records)?;
        self.store.set(&self.key, &blob)?;
        debug!(key = %self.key, tables = self.records.len(), "Saved migration log");
        Ok(())
    }
}

fn decode(key: &str, blob: &str) -> Result<BTreeMap<String, MigrationRecord>> {
    let records: BTreeMap<String, MigrationRecord> =
        serde_json::from_str(blob).map_err(|e| MigrationError::LogCorrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    if let Some((name, record)) = records.iter().find(|(name, r)| *name != r.table_name()) {
        return Err(MigrationError::LogCorrupt {
            key: key.to_string(),
            reason: format!(
                "entry '{name}' holds a record for table '{}'",
                record.table_name()
            ),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use table_migration_core::Column;

    use super::*;
    use crate::store::MemoryStore;
    use crate::store::testing::FlakyStore;

    fn schema(name: &str) -> TableSchema {
        TableSchema::new(name).with_column(Column::new("id", "INT"))
    }

    /// Counts writes so tests can assert when the log persists.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: usize,
    }

    impl OptionStore for CountingStore {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, crate::StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), crate::StoreError> {
            self.writes += 1;
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_default_and_custom_key() {
        let log = MigrationLog::new(MemoryStore::new(), None).unwrap();
        assert_eq!(log.log_key(), DEFAULT_LOG_KEY);

        let log = MigrationLog::new(MemoryStore::new(), Some("custom_log_key")).unwrap();
        assert_eq!(log.log_key(), "custom_log_key");
        assert!(log.is_empty());
    }

    #[test]
    fn test_absent_table_queries() {
        let log = MigrationLog::new(MemoryStore::new(), None).unwrap();
        assert!(!log.has_migration("t1"));
        assert!(log.get_migration("t1").is_none());
        assert!(!log.check_hash(&schema("t1")));
        assert!(log.can_migrate(&schema("t1")));
        assert!(!log.is_seeded("t1"));
    }

    #[test]
    fn test_upsert_same_schema_does_not_persist() {
        let mut log = MigrationLog::new(CountingStore::default(), None).unwrap();
        log.upsert_migration(&schema("t1")).unwrap();
        log.upsert_migration(&schema("t1")).unwrap();
        assert_eq!(log.store().writes, 1);
    }

    #[test]
    fn test_upsert_changed_schema_updates_hash() {
        let mut log = MigrationLog::new(CountingStore::default(), None).unwrap();
        log.upsert_migration(&schema("t1")).unwrap();

        let changed = schema("t1").with_column(Column::new("name", "TEXT"));
        assert!(log.can_migrate(&changed));
        log.upsert_migration(&changed).unwrap();

        assert!(!log.can_migrate(&changed));
        assert!(log.can_migrate(&schema("t1")));
        assert_eq!(log.store().writes, 2);
        assert_eq!(
            log.get_migration("t1").unwrap().schema_hash(),
            compose_schema_hash(&changed)
        );
    }

    #[test]
    fn test_mark_seeded_absent_table_is_an_error() {
        let mut log = MigrationLog::new(MemoryStore::new(), None).unwrap();
        let err = log.mark_table_seeded("ghost").unwrap_err();
        assert!(matches!(err, MigrationError::NotMigrated(ref t) if t == "ghost"));
    }

    #[test]
    fn test_mark_seeded_is_idempotent() {
        let mut log = MigrationLog::new(CountingStore::default(), None).unwrap();
        log.upsert_migration(&schema("t1")).unwrap();

        log.mark_table_seeded("t1").unwrap();
        let first = log.get_migration("t1").unwrap().updated_on();
        log.mark_table_seeded("t1").unwrap();

        assert!(log.is_seeded("t1"));
        assert_eq!(log.get_migration("t1").unwrap().updated_on(), first);
        assert_eq!(log.store().writes, 2);
    }

    #[test]
    fn test_remove_missing_table_is_noop() {
        let mut log = MigrationLog::new(CountingStore::default(), None).unwrap();
        log.remove_migration("nothing").unwrap();
        assert_eq!(log.store().writes, 0);
    }

    #[test]
    fn test_failed_save_leaves_log_unchanged() {
        let store = FlakyStore::default();
        let failing = store.failing();
        let mut log = MigrationLog::new(store, None).unwrap();

        failing.set(true);
        let err = log.upsert_migration(&schema("t1")).unwrap_err();
        assert!(matches!(err, MigrationError::Store(_)));
        assert!(!log.has_migration("t1"));
        assert!(log.can_migrate(&schema("t1")));

        failing.set(false);
        log.upsert_migration(&schema("t1")).unwrap();
        let recorded = log.get_migration("t1").unwrap().clone();

        failing.set(true);
        let changed = schema("t1").with_column(Column::new("name", "TEXT"));
        assert!(log.upsert_migration(&changed).is_err());
        assert_eq!(log.get_migration("t1"), Some(&recorded));
        assert!(log.can_migrate(&changed));

        assert!(log.mark_table_seeded("t1").is_err());
        assert!(!log.is_seeded("t1"));

        assert!(log.remove_migration("t1").is_err());
        assert!(log.has_migration("t1"));

        failing.set(false);
        log.mark_table_seeded("t1").unwrap();
        let reloaded = MigrationLog::new(log.into_store(), None).unwrap();
        assert!(reloaded.is_seeded("t1"));
    }

    #[test]
    fn test_remove_returns_table_to_absent() {
        let mut log = MigrationLog::new(MemoryStore::new(), None).unwrap();
        log.upsert_migration(&schema("t1")).unwrap();
        log.mark_table_seeded("t1").unwrap();
        log.remove_migration("t1").unwrap();

        assert!(!log.has_migration("t1"));
        assert!(!log.is_seeded("t1"));
        assert!(log.can_migrate(&schema("t1")));
    }

    #[test]
    fn test_corrupt_blob_fails_loudly() {
        let store = MemoryStore::with_value(DEFAULT_LOG_KEY, "a:1:{i:0;b:1;}");
        let err = MigrationLog::new(store, None).unwrap_err();
        match err {
            MigrationError::LogCorrupt { key, .. } => assert_eq!(key, DEFAULT_LOG_KEY),
            other => panic!("expected LogCorrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_entry_key_is_corrupt() {
        let at = Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap();
        let mut records = BTreeMap::new();
        records.insert("alias", MigrationRecord::new("real", "h", false, at, at));
        let blob = serde_json::to_string(&records).unwrap();

        let store = MemoryStore::with_value("k", blob);
        let err = MigrationLog::new(store, Some("k")).unwrap_err();
        assert!(matches!(err, MigrationError::LogCorrupt { .. }));
    }

    #[test]
    fn test_logs_under_different_keys_are_independent() {
        let mut store = MemoryStore::new();
        {
            let mut a = MigrationLog::new(&mut store, Some("a")).unwrap();
            a.upsert_migration(&schema("t1")).unwrap();
        }
        let b = MigrationLog::new(&mut store, Some("b")).unwrap();
        assert!(!b.has_migration("t1"));
        let a = MigrationLog::new(&mut store, Some("a")).unwrap();
        assert!(a.has_migration("t1"));
    }
}
