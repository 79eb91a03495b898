//! Error types for the SQLite adapters.

use thiserror::Error;

/// Errors that can occur while rendering or running SQLite statements.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A table, column, index or prefix name contains invalid characters.
    #[error("invalid identifier '{0}': must contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),

    /// The table schema cannot be rendered as SQLite DDL.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The migration log could not be loaded.
    #[error(transparent)]
    Migration(#[from] table_migration_db::MigrationError),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
