//! Per-table migration records.
//!
//! A [`MigrationRecord`] captures what the log knows about one table: the
//! digest of the schema it was last migrated with, whether it has been
//! seeded, and when it was created and last changed. Records are values:
//! every transition returns a new record and leaves the receiver untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use table_migration_core::{Column, ForeignKey, Index, TableSchema};

/// Canonical hash input. Field order here is part of the digest.
#[derive(Serialize)]
struct SchemaHashInput<'a> {
    name: &'a str,
    columns: &'a [Column],
    indexes: &'a [Index],
    foreign_keys: &'a [ForeignKey],
}

/// Computes the SHA-256 hex digest of a schema's structural content.
///
/// The digest covers the table name, columns, indexes and foreign keys, in
/// declaration order. Reordering any of them yields a different digest.
///
/// # Examples
///
/// ```
/// use table_migration_core::{Column, TableSchema};
/// use table_migration_db::compose_schema_hash;
///
/// let a = TableSchema::new("t").with_column(Column::new("id", "INT"));
/// let b = TableSchema::new("t").with_column(Column::new("id", "INT"));
/// let c = TableSchema::new("t").with_column(Column::new("id", "BIGINT"));
///
/// assert_eq!(compose_schema_hash(&a), compose_schema_hash(&b));
/// assert_ne!(compose_schema_hash(&a), compose_schema_hash(&c));
/// ```
pub fn compose_schema_hash(schema: &TableSchema) -> String {
    let input = SchemaHashInput {
        name: schema.table_name(),
        columns: schema.columns(),
        indexes: schema.indexes(),
        foreign_keys: schema.foreign_keys(),
    };
    let bytes = serde_json::to_vec(&input)
        .expect("schema hash input holds only strings, bools and integers");
    format!("{:x}", Sha256::digest(&bytes))
}

/// Migration state of a single table.
///
/// # Examples
///
/// ```
/// use table_migration_core::{Column, TableSchema};
/// use table_migration_db::MigrationRecord;
///
/// let schema = TableSchema::new("t").with_column(Column::new("id", "INT"));
/// let record = MigrationRecord::new_from_schema(&schema);
/// assert_eq!(record.table_name(), "t");
/// assert!(!record.is_seeded());
///
/// let seeded = record.as_seeded();
/// assert!(seeded.is_seeded());
/// assert!(!record.is_seeded());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    table_name: String,
    schema_hash: String,
    #[serde(default)]
    seeded: bool,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
}

impl MigrationRecord {
    /// Reconstructs a record from its parts.
    pub fn new(
        table_name: impl Into<String>,
        schema_hash: impl Into<String>,
        seeded: bool,
        created_on: DateTime<Utc>,
        updated_on: DateTime<Utc>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            schema_hash: schema_hash.into(),
            seeded,
            created_on,
            updated_on,
        }
    }

    /// Creates an unseeded record for a freshly migrated schema, stamped now.
    pub fn new_from_schema(schema: &TableSchema) -> Self {
        let now = Utc::now();
        Self::new(
            schema.table_name(),
            compose_schema_hash(schema),
            false,
            now,
            now,
        )
    }

    /// Returns a copy carrying `schema`'s hash, stamped now.
    pub fn as_updated(&self, schema: &TableSchema) -> Self {
        self.as_updated_at(schema, Utc::now())
    }

    /// Returns a copy carrying `schema`'s hash, stamped at `now`.
    ///
    /// The table name and seeded flag are preserved.
    pub fn as_updated_at(&self, schema: &TableSchema, now: DateTime<Utc>) -> Self {
        Self {
            schema_hash: compose_schema_hash(schema),
            updated_on: now,
            ..self.clone()
        }
    }

    /// Returns a seeded copy, stamped now.
    pub fn as_seeded(&self) -> Self {
        self.as_seeded_at(Utc::now())
    }

    /// Returns a seeded copy, stamped at `now`.
    pub fn as_seeded_at(&self, now: DateTime<Utc>) -> Self {
        Self {
            seeded: true,
            updated_on: now,
            ..self.clone()
        }
    }

    /// Table this record describes.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Digest of the schema the table was last migrated with.
    pub fn schema_hash(&self) -> &str {
        &self.schema_hash
    }

    /// Whether seed data has been inserted.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// When the table was first migrated.
    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    /// When the record last changed.
    pub fn updated_on(&self) -> DateTime<Utc> {
        self.updated_on
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use table_migration_core::{ForeignKey, Index};

    use super::*;

    fn base_schema() -> TableSchema {
        TableSchema::new("table").with_column(Column::new("id", "INT").length(1))
    }

    #[test]
    fn test_getters() {
        let now = Utc::now();
        let record = MigrationRecord::new("table", "hash", true, now, now);
        assert_eq!(record.table_name(), "table");
        assert_eq!(record.schema_hash(), "hash");
        assert!(record.is_seeded());
        assert_eq!(record.created_on(), now);
        assert_eq!(record.updated_on(), now);
    }

    #[test]
    fn test_new_from_schema() {
        let schema = base_schema();
        let record = MigrationRecord::new_from_schema(&schema);
        assert_eq!(record.table_name(), "table");
        assert_eq!(record.schema_hash(), compose_schema_hash(&schema));
        assert!(!record.is_seeded());
        assert_eq!(record.created_on(), record.updated_on());
    }

    #[test]
    fn test_as_updated_preserves_identity_and_seeded() {
        let created = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2011, 1, 1, 15, 3, 1).unwrap();
        let initial = MigrationRecord::new("table", "old", true, created, created);

        let schema_b = base_schema().with_column(Column::new("other", "TEXT"));
        let record = initial.as_updated_at(&schema_b, updated);

        assert_eq!(record.table_name(), "table");
        assert_eq!(record.schema_hash(), compose_schema_hash(&schema_b));
        assert!(record.is_seeded());
        assert_eq!(record.created_on(), created);
        assert_eq!(
            record.updated_on().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2011-01-01 15:03:01"
        );
        // Receiver untouched.
        assert_eq!(initial.schema_hash(), "old");
        assert_eq!(initial.updated_on(), created);
    }

    #[test]
    fn test_as_seeded_does_not_mutate_receiver() {
        let initial = MigrationRecord::new_from_schema(&base_schema());
        let updated = Utc.with_ymd_and_hms(2011, 1, 1, 15, 3, 1).unwrap();
        let seeded = initial.as_seeded_at(updated);

        assert!(seeded.is_seeded());
        assert_eq!(seeded.updated_on(), updated);
        assert_eq!(seeded.schema_hash(), initial.schema_hash());
        assert!(!initial.is_seeded());
        assert_ne!(seeded, initial);
    }

    #[test]
    fn test_hash_is_structural() {
        let a = base_schema().with_index(Index::new("pk", ["id"]).primary());
        let b = base_schema().with_index(Index::new("pk", ["id"]).primary());
        assert_eq!(compose_schema_hash(&a), compose_schema_hash(&b));
    }

    #[test]
    fn test_hash_changes_with_any_component() {
        let base = base_schema();
        let hash = compose_schema_hash(&base);

        let renamed = TableSchema {
            name: "other".into(),
            ..base.clone()
        };
        let extra_column = base.clone().with_column(Column::new("x", "TEXT"));
        let nullable_change = TableSchema::new("table")
            .with_column(Column::new("id", "INT").length(1).not_null());
        let with_index = base.clone().with_index(Index::new("ix", ["id"]));
        let with_fk = base
            .clone()
            .with_foreign_key(ForeignKey::new("fk", "id", "parent", "id"));

        for changed in [renamed, extra_column, nullable_change, with_index, with_fk] {
            assert_ne!(compose_schema_hash(&changed), hash, "{changed:?}");
        }
    }

    #[test]
    fn test_hash_covers_serialized_input() {
        const EMPTY_INPUT_DIGEST: &str =
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

        let hash = compose_schema_hash(&TableSchema::new("t"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, EMPTY_INPUT_DIGEST);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let ab = TableSchema::new("t")
            .with_column(Column::new("a", "INT"))
            .with_column(Column::new("b", "INT"));
        let ba = TableSchema::new("t")
            .with_column(Column::new("b", "INT"))
            .with_column(Column::new("a", "INT"));
        assert_ne!(compose_schema_hash(&ab), compose_schema_hash(&ba));
    }

    #[test]
    fn test_serde_roundtrip_keeps_timestamp_precision() {
        let created = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let record = MigrationRecord::new("t", "h", false, created, created);
        let json = serde_json::to_string(&record).unwrap();
        let back: MigrationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.created_on().timestamp_subsec_nanos(), 123_456_789);
    }
}
