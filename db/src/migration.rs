//! Migration units.
//!
//! A [`Migration`] pairs a table's [`TableSchema`] with the rows to seed it
//! with and an optional hook to run once the table has been created. It is
//! the unit of work the [`MigrationManager`](crate::MigrationManager) acts
//! on, identified by its table name.

use std::fmt;

use table_migration_core::{SeedRow, TableSchema};

type CreationHook = Box<dyn Fn(&TableSchema)>;

/// A table schema with its seed rows and post-creation hook.
///
/// # Examples
///
/// ```
/// use table_migration_core::{Column, SeedRow, TableSchema};
/// use table_migration_db::Migration;
///
/// let migration = Migration::new(
///     TableSchema::new("uu_foo_table")
///         .with_column(Column::new("foo", "TEXT"))
///         .with_column(Column::new("number", "INT")),
/// )
/// .with_seed(SeedRow::new().with("foo", "text1").with("number", 1))
/// .with_seed(SeedRow::new().with("foo", "text2").with("number", 2))
/// .after_creation(|schema| println!("created {}", schema.table_name()));
///
/// assert_eq!(migration.table_name(), "uu_foo_table");
/// assert_eq!(migration.seeds().len(), 2);
/// ```
pub struct Migration {
    schema: TableSchema,
    seeds: Vec<SeedRow>,
    after_creation: Option<CreationHook>,
}

impl Migration {
    /// Creates a migration with no seed rows and no hook.
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            seeds: Vec::new(),
            after_creation: None,
        }
    }

    /// Appends a seed row.
    pub fn with_seed(mut self, row: SeedRow) -> Self {
        self.seeds.push(row);
        self
    }

    /// Appends several seed rows.
    pub fn with_seeds(mut self, rows: impl IntoIterator<Item = SeedRow>) -> Self {
        self.seeds.extend(rows);
        self
    }

    /// Sets the hook run after the table is successfully created.
    pub fn after_creation(mut self, hook: impl Fn(&TableSchema) + 'static) -> Self {
        self.after_creation = Some(Box::new(hook));
        self
    }

    /// Table name, taken from the schema.
    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    /// The table's schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Seed rows, in insertion order.
    pub fn seeds(&self) -> &[SeedRow] {
        &self.seeds
    }

    /// Returns `true` if a post-creation hook is set.
    pub fn has_creation_hook(&self) -> bool {
        self.after_creation.is_some()
    }

    /// Runs the post-creation hook, if any.
    pub(crate) fn run_after_creation(&self) {
        if let Some(hook) = &self.after_creation {
            hook(&self.schema);
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("schema", &self.schema)
            .field("seeds", &self.seeds)
            .field("after_creation", &self.after_creation.is_some())
            .finish()
    }
}

impl From<TableSchema> for Migration {
    fn from(schema: TableSchema) -> Self {
        Migration::new(schema)
    }
}
