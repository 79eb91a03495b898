//! [`OptionStore`] backed by a SQLite table.
//!
//! Options live in `{prefix}options (option_key TEXT PRIMARY KEY,
//! option_value TEXT NOT NULL)`, created on first use. Writes are plain
//! upserts with no locking, so concurrent writers race and the last one
//! wins.

use rusqlite::{Connection, OptionalExtension, params};
use table_migration_db::{OptionStore, StoreError};
use tracing::debug;

use crate::error::Result;
use crate::schema::{quote, validate_prefix};

/// Option storage in a SQLite table.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use table_migration_db::MigrationLog;
/// use table_migration_sqlite::SqliteStore;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let store = SqliteStore::new(&conn, "wp_").unwrap();
/// assert_eq!(store.table_name(), "wp_options");
///
/// let log = MigrationLog::new(store, None).unwrap();
/// assert!(log.is_empty());
/// ```
#[derive(Debug)]
pub struct SqliteStore<'a> {
    conn: &'a Connection,
    table: String,
}

impl<'a> SqliteStore<'a> {
    /// Opens the option table for `prefix`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidIdentifier`](crate::SqliteError::InvalidIdentifier)
    /// if the prefix contains invalid characters, or
    /// [`SqliteError::Database`](crate::SqliteError::Database) if the table
    /// cannot be created.
    pub fn new(conn: &'a Connection, prefix: &str) -> Result<Self> {
        validate_prefix(prefix)?;
        let table = format!("{prefix}options");
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                option_key TEXT PRIMARY KEY,
                option_value TEXT NOT NULL
            );",
            quote(&table)
        ))?;
        Ok(Self { conn, table })
    }

    /// Name of the backing table.
    pub fn table_name(&self) -> &str {
        &self.table
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl OptionStore for SqliteStore<'_> {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                &format!(
                    "SELECT option_value FROM {} WHERE option_key = ?1",
                    quote(&self.table)
                ),
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (option_key, option_value) VALUES (?1, ?2)
                     ON CONFLICT(option_key) DO UPDATE SET option_value = excluded.option_value",
                    quote(&self.table)
                ),
                params![key, value],
            )
            .map_err(backend)?;
        debug!(table = %self.table, key = %key, bytes = value.len(), "stored option");
        Ok(())
    }
}
