//! Wiring a connection into a ready-to-use manager.

use rusqlite::Connection;
use table_migration_db::{MigrationLog, MigrationManager};

use crate::builder::SqliteBuilder;
use crate::error::Result;
use crate::inserter::SqliteInserter;
use crate::store::SqliteStore;

/// A [`MigrationManager`] whose capabilities all share one connection.
pub type SqliteManager<'a> = MigrationManager<SqliteBuilder<'a>, SqliteInserter<'a>, SqliteStore<'a>>;

/// Builds a manager on `conn`, keeping options in `{prefix}options` and the
/// migration log under `log_key` (the default key when `None`).
///
/// # Errors
///
/// Returns [`SqliteError::InvalidIdentifier`](crate::SqliteError::InvalidIdentifier)
/// for a bad prefix, [`SqliteError::Database`](crate::SqliteError::Database)
/// if the connection cannot be prepared, or
/// [`SqliteError::Migration`](crate::SqliteError::Migration) if the stored
/// log cannot be read.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// let manager = table_migration_sqlite::manager(&conn, "wp_", None).unwrap();
/// assert!(manager.migration_log().is_empty());
/// ```
pub fn manager<'a>(conn: &'a Connection, prefix: &str, log_key: Option<&str>) -> Result<SqliteManager<'a>> {
    Ok(MigrationManager::new(
        SqliteBuilder::new(conn)?,
        SqliteInserter::new(conn),
        SqliteStore::new(conn, prefix)?,
        log_key,
    )?)
}

/// Opens the migration log a [`manager`] with the same arguments would use,
/// for inspecting state without registering migrations.
///
/// # Errors
///
/// Same as [`manager`], minus the builder setup.
pub fn migration_log<'a>(
    conn: &'a Connection,
    prefix: &str,
    log_key: Option<&str>,
) -> Result<MigrationLog<SqliteStore<'a>>> {
    Ok(MigrationLog::new(SqliteStore::new(conn, prefix)?, log_key)?)
}

#[cfg(test)]
mod tests {
    use table_migration_core::{Column, TableSchema};
    use table_migration_db::Migration;

    use super::*;
    use crate::SqliteError;

    #[test]
    fn test_manager_and_log_share_state() {
        let conn = Connection::open_in_memory().unwrap();
        let mut manager = manager(&conn, "t_", Some("plugin_log")).unwrap();
        manager.add_migration(Migration::new(
            TableSchema::new("t_notes").with_column(Column::new("body", "TEXT")),
        ));
        manager.create_tables(&[]).unwrap();

        let log = migration_log(&conn, "t_", Some("plugin_log")).unwrap();
        assert!(log.has_migration("t_notes"));
        assert_eq!(log.store().table_name(), "t_options");

        let other_key = migration_log(&conn, "t_", None).unwrap();
        assert!(other_key.is_empty());
    }

    #[test]
    fn test_bad_prefix_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            manager(&conn, "x y", None),
            Err(SqliteError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_corrupt_log_surfaces_as_migration_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE c_options (option_key TEXT PRIMARY KEY, option_value TEXT NOT NULL);
             INSERT INTO c_options VALUES ('plugin_log', 'not json');",
        )
        .unwrap();

        let err = migration_log(&conn, "c_", Some("plugin_log")).unwrap_err();
        assert!(matches!(err, SqliteError::Migration(_)), "{err:?}");
    }
}
