//! Migration state tracking for table schemas and seed data.
//!
//! This crate records which table schemas have been applied and which
//! tables have been seeded, so that creating and seeding tables is safe to
//! re-run on every deployment.
//!
//! - [`MigrationRecord`]: immutable per-table state (schema hash, seeded
//!   flag, created/updated timestamps).
//! - [`MigrationLog`]: the table → record mapping, persisted as one blob in
//!   an [`OptionStore`].
//! - [`Migration`]: a [`TableSchema`](table_migration_core::TableSchema)
//!   with seed rows and a post-creation hook.
//! - [`MigrationManager`]: creates, seeds and drops tables through a
//!   [`SchemaBuilder`] and a [`RowInserter`], consulting the log.
//! - [`Seeder`]: validates seed rows against the schema and inserts them.
//!
//! # Quick start
//!
//! ```no_run
//! use table_migration_db::{JsonFileStore, MigrationConfig, MigrationLog};
//!
//! let config = MigrationConfig::load("migrations.yml").unwrap();
//! let store = JsonFileStore::open("options.json").unwrap();
//! let log = MigrationLog::new(store, Some(config.log_key())).unwrap();
//!
//! for record in log.migrations() {
//!     println!(
//!         "{} seeded={} updated={}",
//!         record.table_name(),
//!         record.is_seeded(),
//!         record.updated_on()
//!     );
//! }
//! ```
//!
//! # Concurrency
//!
//! Everything here is synchronous. The log has no locking: two processes
//! mutating the same store key race and the last writer wins.

mod builder;
mod config;
mod error;
mod log;
mod manager;
mod migration;
mod record;
mod seeder;
mod store;

pub use builder::{BuilderError, SchemaBuilder};
pub use config::{ExcludeConfig, MigrationConfig};
pub use error::{MigrationError, Result};
pub use log::{DEFAULT_LOG_KEY, MigrationLog};
pub use manager::{CreateReport, DropReport, MigrationManager, SeedReport};
pub use migration::Migration;
pub use record::{MigrationRecord, compose_schema_hash};
pub use seeder::{DriverError, Placeholder, RowInserter, SeedOutcome, Seeder};
pub use store::{JsonFileStore, MemoryStore, OptionStore, StoreError};
