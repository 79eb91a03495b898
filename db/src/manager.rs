//! Reconciliation of migration units against the log.
//!
//! [`MigrationManager`] holds a set of [`Migration`]s and drives them
//! through a [`SchemaBuilder`] and a [`RowInserter`], using the
//! [`MigrationLog`] to decide what actually needs doing:
//!
//! - [`create_tables`](MigrationManager::create_tables) builds only tables
//!   whose schema hash differs from the log (or that are not logged yet);
//! - [`seed_tables`](MigrationManager::seed_tables) seeds only created tables
//!   not yet marked seeded;
//! - [`drop_tables`](MigrationManager::drop_tables) drops tables and forgets
//!   them, stopping at the first failure.
//!
//! Idempotence comes from the log, not from inspecting the live database.
//! Units are processed in the order they were added; foreign-key ordering is
//! the caller's responsibility.
//!
//! # Example
//!
//! ```
//! use table_migration_core::{Column, SeedRow, TableSchema};
//! use table_migration_db::{
//!     BuilderError, DriverError, MemoryStore, Migration, MigrationManager, Placeholder,
//!     RowInserter, SchemaBuilder,
//! };
//!
//! struct NoopBuilder;
//! impl SchemaBuilder for NoopBuilder {
//!     fn create_table(&mut self, _: &TableSchema) -> Result<(), BuilderError> { Ok(()) }
//!     fn drop_table(&mut self, _: &TableSchema) -> Result<(), BuilderError> { Ok(()) }
//! }
//!
//! struct NoopDriver;
//! impl RowInserter for NoopDriver {
//!     fn insert(&mut self, _: &str, _: &SeedRow, _: &[Placeholder]) -> Result<i64, DriverError> {
//!         Ok(1)
//!     }
//! }
//!
//! let mut manager = MigrationManager::new(NoopBuilder, NoopDriver, MemoryStore::new(), None).unwrap();
//! manager.add_migration(
//!     Migration::new(TableSchema::new("foo").with_column(Column::new("name", "TEXT")))
//!         .with_seed(SeedRow::new().with("name", "first")),
//! );
//!
//! let created = manager.create_tables(&[]).unwrap();
//! assert_eq!(created.created, vec!["foo"]);
//!
//! manager.seed_tables(&[]).unwrap();
//! assert!(manager.migration_log().is_seeded("foo"));
//!
//! // Nothing changed, so nothing is rebuilt.
//! assert!(manager.create_tables(&[]).unwrap().created.is_empty());
//! ```

use table_migration_core::TableSchema;
use tracing::{debug, info, warn};

use crate::builder::SchemaBuilder;
use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result};
use crate::log::MigrationLog;
use crate::migration::Migration;
use crate::seeder::{RowInserter, Seeder};
use crate::store::OptionStore;

/// Outcome of [`MigrationManager::create_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateReport {
    /// Tables the builder created and the log recorded.
    pub created: Vec<String>,
    /// Tables skipped because the log already matches their schema.
    pub unchanged: Vec<String>,
    /// Tables the builder failed to create; they stay eligible next run.
    pub failed: Vec<String>,
}

/// Outcome of [`MigrationManager::seed_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Tables that received rows and were marked seeded.
    pub seeded: Vec<String>,
    /// Tables with no seed rows; they are never marked seeded.
    pub empty: Vec<String>,
    /// Total rows inserted across all tables.
    pub rows_inserted: usize,
}

/// Outcome of [`MigrationManager::drop_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropReport {
    /// Tables dropped and removed from the log.
    pub dropped: Vec<String>,
}

/// Runs create/seed/drop batches over a collection of [`Migration`]s.
pub struct MigrationManager<B, D, S> {
    builder: B,
    driver: D,
    log: MigrationLog<S>,
    migrations: Vec<Migration>,
}

impl<B, D, S> MigrationManager<B, D, S>
where
    B: SchemaBuilder,
    D: RowInserter,
    S: OptionStore,
{
    /// Creates a manager, loading the log stored under `log_key` (or the
    /// default key).
    ///
    /// # Errors
    ///
    /// Propagates [`MigrationLog::new`] errors, notably
    /// [`MigrationError::LogCorrupt`].
    pub fn new(builder: B, driver: D, store: S, log_key: Option<&str>) -> Result<Self> {
        Ok(Self {
            builder,
            driver,
            log: MigrationLog::new(store, log_key)?,
            migrations: Vec::new(),
        })
    }

    /// Creates a manager using the log key from `config`.
    pub fn with_config(builder: B, driver: D, store: S, config: &MigrationConfig) -> Result<Self> {
        Self::new(builder, driver, store, Some(config.log_key()))
    }

    /// Adds a migration. A migration for an already-registered table
    /// replaces it in place.
    pub fn add_migration(&mut self, migration: Migration) -> &mut Self {
        match self
            .migrations
            .iter_mut()
            .find(|m| m.table_name() == migration.table_name())
        {
            Some(slot) => *slot = migration,
            None => self.migrations.push(migration),
        }
        self
    }

    /// Registered migrations, in the order they were first added.
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Looks up a registered migration by table name.
    pub fn get_migration(&self, table_name: &str) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.table_name() == table_name)
    }

    /// The migration log.
    pub fn migration_log(&self) -> &MigrationLog<S> {
        &self.log
    }

    /// Store key the log persists under.
    pub fn log_key(&self) -> &str {
        self.log.log_key()
    }

    /// The table builder.
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// The row-insert driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Creates every non-excluded table whose schema is new or changed.
    ///
    /// Tables whose logged hash matches are skipped without calling the
    /// builder. A builder failure is logged and skipped; the table is not
    /// recorded and will be retried on the next run. After a successful
    /// create the table is recorded and its post-creation hook runs.
    ///
    /// # Errors
    ///
    /// Only store failures while recording a migration are returned.
    pub fn create_tables(&mut self, exclude: &[&str]) -> Result<CreateReport> {
        let mut report = CreateReport::default();

        for migration in &self.migrations {
            let table = migration.table_name();
            if exclude.contains(&table) {
                debug!(table = %table, "Excluded from create");
                continue;
            }
            if !self.log.can_migrate(migration.schema()) {
                debug!(table = %table, "Schema unchanged, skipping create");
                report.unchanged.push(table.to_string());
                continue;
            }

            match self.builder.create_table(migration.schema()) {
                Ok(()) => {
                    self.log.upsert_migration(migration.schema())?;
                    migration.run_after_creation();
                    info!(table = %table, "Created table");
                    report.created.push(table.to_string());
                }
                Err(e) => {
                    warn!(table = %table, error = %e, "Failed to create table, will retry next run");
                    report.failed.push(table.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Seeds every non-excluded, created table not yet marked seeded.
    ///
    /// A table is marked seeded once at least one row is inserted; tables
    /// with no seed rows are never marked. Tables without a log record
    /// (never created) are skipped.
    ///
    /// # Errors
    ///
    /// A seeding error (unknown column or failed insert) stops that table
    /// only. The rest of the batch still runs, tables seeded along the way
    /// stay marked, and the collected errors are returned afterwards as
    /// [`MigrationError::SeedFailures`]. A store failure while marking a
    /// table seeded is collected the same way; that table stays unmarked.
    pub fn seed_tables(&mut self, exclude: &[&str]) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        let mut failures = Vec::new();

        for migration in &self.migrations {
            let table = migration.table_name();
            if exclude.contains(&table) {
                debug!(table = %table, "Excluded from seed");
                continue;
            }
            if self.log.is_seeded(table) {
                debug!(table = %table, "Already seeded, skipping");
                continue;
            }
            if !self.log.has_migration(table) {
                debug!(table = %table, "Table not created yet, skipping seed");
                continue;
            }

            match Seeder::new(&mut self.driver).seed(migration.schema(), migration.seeds()) {
                Ok(outcome) if outcome.inserted() > 0 => {
                    report.rows_inserted += outcome.inserted();
                    if let Err(e) = self.log.mark_table_seeded(table) {
                        warn!(table = %table, error = %e, "Seeded table but could not record it");
                        failures.push(e);
                        continue;
                    }
                    info!(table = %table, rows = outcome.inserted(), "Seeded table");
                    report.seeded.push(table.to_string());
                }
                Ok(_) => report.empty.push(table.to_string()),
                Err(e) => {
                    warn!(table = %table, error = %e, "Failed to seed table");
                    failures.push(e);
                }
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(MigrationError::SeedFailures(failures))
        }
    }

    /// Drops every non-excluded table and removes it from the log.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::DropFailed`] at the first table the builder
    /// fails to drop. Tables dropped before it stay dropped and forgotten;
    /// nothing is rolled back.
    pub fn drop_tables(&mut self, exclude: &[&str]) -> Result<DropReport> {
        let mut report = DropReport::default();

        for migration in &self.migrations {
            let table = migration.table_name();
            if exclude.contains(&table) {
                debug!(table = %table, "Excluded from drop");
                continue;
            }

            self.builder
                .drop_table(migration.schema())
                .map_err(|source| MigrationError::DropFailed {
                    table: table.to_string(),
                    source,
                })?;
            self.log.remove_migration(table)?;
            info!(table = %table, "Dropped table");
            report.dropped.push(table.to_string());
        }

        Ok(report)
    }

    /// Creates then seeds tables, honouring the exclusions in `config`.
    pub fn migrate(&mut self, config: &MigrationConfig) -> Result<SeedReport> {
        let create_exclude = as_strs(&config.exclude.create);
        self.create_tables(&create_exclude)?;
        let seed_exclude = as_strs(&config.exclude.seed);
        self.seed_tables(&seed_exclude)
    }

    /// Drops tables, honouring the drop exclusions in `config`.
    pub fn rollback(&mut self, config: &MigrationConfig) -> Result<DropReport> {
        let drop_exclude = as_strs(&config.exclude.drop);
        self.drop_tables(&drop_exclude)
    }

    /// Returns the schemas of all registered migrations.
    pub fn schemas(&self) -> impl Iterator<Item = &TableSchema> {
        self.migrations.iter().map(Migration::schema)
    }

    /// Consumes the manager and returns its builder, driver and log.
    pub fn into_parts(self) -> (B, D, MigrationLog<S>) {
        (self.builder, self.driver, self.log)
    }
}

fn as_strs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}
