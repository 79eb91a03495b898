//! Error types for migration log, seeding and manager operations.
//!
//! Provides a unified error type covering log decoding, seeding, table
//! drops, store access and configuration I/O.

use thiserror::Error;

use crate::builder::BuilderError;
use crate::store::StoreError;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The persisted log could not be decoded into a table → record mapping.
    #[error("migration log under key '{key}' could not be decoded: {reason}")]
    LogCorrupt { key: String, reason: String },

    /// A seeded flag was requested for a table with no migration record.
    #[error("table {0} has no migration record")]
    NotMigrated(String),

    /// A seed row names a field the schema does not declare.
    #[error("could not find column {column} in {table} schema definition")]
    SeedColumnMissing { column: String, table: String },

    /// The row-insert driver rejected a seed row.
    #[error("could not insert seed into {table}, failed with error: {message}")]
    SeedInsertFailed { table: String, message: String },

    /// One or more tables failed to seed during a batch.
    #[error("{} table(s) failed to seed: {}", .0.len(), join_errors(.0))]
    SeedFailures(Vec<MigrationError>),

    /// The builder failed to drop a table; the drop batch was aborted.
    #[error("failed to drop {table}: {source}")]
    DropFailed {
        table: String,
        #[source]
        source: BuilderError,
    },

    /// Key-value store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON serialization failure while encoding the log.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[MigrationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`MigrationError`].
pub type Result<T> = std::result::Result<T, MigrationError>;
