//! [`SchemaBuilder`] over a SQLite connection.

use rusqlite::Connection;
use table_migration_core::TableSchema;
use table_migration_db::{BuilderError, SchemaBuilder};
use tracing::debug;

use crate::error::Result;
use crate::schema::{generate_alter_sql, generate_create_sql, generate_drop_sql};

/// Creates and drops tables on a borrowed connection.
///
/// Foreign key enforcement is switched on for the connection, so dropping
/// a table that other rows still reference fails instead of leaving
/// dangling references.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use table_migration_core::{Column, TableSchema};
/// use table_migration_db::SchemaBuilder;
/// use table_migration_sqlite::SqliteBuilder;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let mut builder = SqliteBuilder::new(&conn).unwrap();
///
/// let schema = TableSchema::new("notes").with_column(Column::new("body", "TEXT"));
/// builder.create_table(&schema).unwrap();
/// builder.drop_table(&schema).unwrap();
/// ```
pub struct SqliteBuilder<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBuilder<'a> {
    /// Creates a builder for the given connection.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Database`](crate::SqliteError::Database) if
    /// foreign key enforcement cannot be enabled.
    pub fn new(conn: &'a Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Current `(name, declared type)` pairs of `table`, empty if it does not exist.
    fn existing_columns(&self, table: &str) -> rusqlite::Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1)")?;
        let rows = stmt.query_map([table], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    fn run(&self, sql: &str) -> rusqlite::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.commit()
    }
}

impl SchemaBuilder for SqliteBuilder<'_> {
    /// Creates the table, or brings an existing one up to date.
    ///
    /// An existing table gets the columns and indexes it is missing. Changes
    /// SQLite cannot make in place, such as a changed column type, are
    /// reported as a [`BuilderError`] and leave the table untouched.
    fn create_table(&mut self, schema: &TableSchema) -> std::result::Result<(), BuilderError> {
        let table = schema.table_name();
        let existing = self
            .existing_columns(table)
            .map_err(|e| BuilderError::new(table, format!("failed to inspect table: {e}")))?;

        let sql = if existing.is_empty() {
            debug!(table = %table, "creating table");
            generate_create_sql(schema)
        } else {
            debug!(table = %table, columns = existing.len(), "altering existing table");
            generate_alter_sql(schema, &existing)
        }
        .map_err(|e| BuilderError::new(table, e.to_string()))?;

        self.run(&sql)
            .map_err(|e| BuilderError::new(table, format!("failed to create table: {e}")))
    }

    fn drop_table(&mut self, schema: &TableSchema) -> std::result::Result<(), BuilderError> {
        let table = schema.table_name();
        let sql = generate_drop_sql(schema).map_err(|e| BuilderError::new(table, e.to_string()))?;
        debug!(table = %table, "dropping table");
        self.run(&sql)
            .map_err(|e| BuilderError::new(table, format!("failed to drop table: {e}")))
    }
}
