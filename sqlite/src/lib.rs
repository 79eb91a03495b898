//! SQLite adapters for table migrations.
//!
//! This crate plugs a [`rusqlite::Connection`] into the capabilities the
//! [`MigrationManager`](table_migration_db::MigrationManager) is built on:
//!
//! - **`builder`**: [`SqliteBuilder`] creates, extends and drops tables
//!   from a [`TableSchema`](table_migration_core::TableSchema).
//! - **`inserter`**: [`SqliteInserter`] inserts seed rows, coercing values
//!   to their column's placeholder.
//! - **`store`**: [`SqliteStore`] keeps options (including the migration
//!   log) in a `{prefix}options` table.
//! - **`schema`**: DDL generation shared by the builder.
//! - **`factory`**: [`manager`] and [`migration_log`] wire all of the above
//!   onto one connection.
//!
//! All adapters borrow the connection, so one connection can serve all
//! three at once.
//!
//! # Quick start
//!
//! ```no_run
//! use rusqlite::Connection;
//! use table_migration_core::{Column, Index, SeedRow, TableSchema};
//! use table_migration_db::Migration;
//!
//! let conn = Connection::open("site.db").unwrap();
//! let mut manager = table_migration_sqlite::manager(&conn, "wp_", Some("acme_migrations")).unwrap();
//!
//! manager.add_migration(
//!     Migration::new(
//!         TableSchema::new("wp_acme_levels")
//!             .with_column(Column::new("id", "INTEGER").auto_increment())
//!             .with_column(Column::new("label", "VARCHAR").length(64))
//!             .with_index(Index::new("pk", ["id"]).primary()),
//!     )
//!     .with_seed(SeedRow::new().with("label", "bronze"))
//!     .with_seed(SeedRow::new().with("label", "gold")),
//! );
//!
//! manager.create_tables(&[]).unwrap();
//! manager.seed_tables(&[]).unwrap();
//! ```
//!
//! # Identifiers
//!
//! Table, column, index and prefix names must contain only alphanumeric
//! characters and underscores. Anything else is rejected before SQL is
//! generated.

mod builder;
mod error;
mod factory;
mod inserter;
mod schema;
mod store;

pub use builder::SqliteBuilder;
pub use error::{Result, SqliteError};
pub use factory::{SqliteManager, manager, migration_log};
pub use inserter::SqliteInserter;
pub use schema::{generate_alter_sql, generate_create_sql, generate_drop_sql};
pub use store::SqliteStore;
