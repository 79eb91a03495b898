//! Seed data insertion.
//!
//! The [`Seeder`] inserts [`SeedRow`]s into a freshly created table through
//! a [`RowInserter`]. Each field is matched to a column of the table's
//! schema, and the column's declared type selects the [`Placeholder`] the
//! driver should bind the value with.

use table_migration_core::{SeedRow, TableSchema};
use thiserror::Error;
use tracing::debug;

use crate::error::{MigrationError, Result};

/// Insertion format for a bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Bind as text (`%s`).
    String,
    /// Bind as an integer (`%d`).
    Integer,
    /// Bind as a float (`%f`).
    Float,
}

impl Placeholder {
    /// Maps a declared column type to its placeholder.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Unrecognised types fall back to [`Placeholder::String`].
    ///
    /// # Examples
    ///
    /// ```
    /// use table_migration_db::Placeholder;
    ///
    /// assert_eq!(Placeholder::for_column_type("varchar"), Placeholder::String);
    /// assert_eq!(Placeholder::for_column_type("BigInt"), Placeholder::Integer);
    /// assert_eq!(Placeholder::for_column_type("double precision"), Placeholder::Float);
    /// assert_eq!(Placeholder::for_column_type("GEOMETRY"), Placeholder::String);
    /// ```
    pub fn for_column_type(column_type: &str) -> Self {
        match column_type.trim().to_ascii_uppercase().as_str() {
            "CHAR" | "VARCHAR" | "BINARY" | "VARBINARY" | "TINYBLOB" | "TINYTEXT" | "TEXT"
            | "BLOB" | "MEDIUMTEXT" | "MEDIUMBLOB" | "LONGTEXT" | "LONGBLOB" | "DATE"
            | "DATETIME" | "TIMESTAMP" | "TIME" | "YEAR" => Placeholder::String,

            "BIT" | "TINYINT" | "BOOL" | "BOOLEAN" | "SMALLINT" | "MEDIUMINT" | "INT"
            | "INTEGER" | "BIGINT" => Placeholder::Integer,

            "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "DECIMAL" | "DEC" => Placeholder::Float,

            _ => Placeholder::String,
        }
    }

    /// Returns the printf-style format token (`%s`, `%d` or `%f`).
    pub fn as_format(self) -> &'static str {
        match self {
            Placeholder::String => "%s",
            Placeholder::Integer => "%d",
            Placeholder::Float => "%f",
        }
    }
}

/// Raw error text reported by a row-insert driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DriverError(pub String);

/// Inserts single rows into a table.
pub trait RowInserter {
    /// Inserts `row` into `table_name`, binding the i-th field with
    /// `formats[i]`, and returns the new row's id.
    fn insert(
        &mut self,
        table_name: &str,
        row: &SeedRow,
        formats: &[Placeholder],
    ) -> std::result::Result<i64, DriverError>;
}

impl<T: RowInserter + ?Sized> RowInserter for &mut T {
    fn insert(
        &mut self,
        table_name: &str,
        row: &SeedRow,
        formats: &[Placeholder],
    ) -> std::result::Result<i64, DriverError> {
        (**self).insert(table_name, row, formats)
    }
}

impl<T: RowInserter + ?Sized> RowInserter for Box<T> {
    fn insert(
        &mut self,
        table_name: &str,
        row: &SeedRow,
        formats: &[Placeholder],
    ) -> std::result::Result<i64, DriverError> {
        (**self).insert(table_name, row, formats)
    }
}

/// Ids of the rows a seed run inserted, in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    /// Row ids returned by the driver.
    pub inserted_ids: Vec<i64>,
}

impl SeedOutcome {
    /// Number of rows inserted.
    pub fn inserted(&self) -> usize {
        self.inserted_ids.len()
    }
}

/// Inserts seed rows through a [`RowInserter`].
///
/// # Examples
///
/// ```
/// use table_migration_core::{Column, SeedRow, TableSchema};
/// use table_migration_db::{DriverError, Placeholder, RowInserter, Seeder};
///
/// struct Counter(i64);
///
/// impl RowInserter for Counter {
///     fn insert(&mut self, _: &str, _: &SeedRow, _: &[Placeholder]) -> Result<i64, DriverError> {
///         self.0 += 1;
///         Ok(self.0)
///     }
/// }
///
/// let schema = TableSchema::new("t").with_column(Column::new("foo", "TEXT"));
/// let rows = vec![SeedRow::new().with("foo", "a"), SeedRow::new().with("foo", "b")];
///
/// let mut driver = Counter(0);
/// let outcome = Seeder::new(&mut driver).seed(&schema, &rows).unwrap();
/// assert_eq!(outcome.inserted_ids, vec![1, 2]);
/// ```
pub struct Seeder<D> {
    driver: D,
}

impl<D: RowInserter> Seeder<D> {
    /// Creates a seeder over `driver`.
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Inserts `rows` into the table described by `schema`.
    ///
    /// Every field of every row is resolved against the schema before the
    /// first insert, so an unknown field leaves the table untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::SeedColumnMissing`] if a field is not a
    /// column of the schema, or [`MigrationError::SeedInsertFailed`] with the
    /// driver's text if an insert fails. Rows inserted before a failed insert
    /// stay inserted.
    pub fn seed(&mut self, schema: &TableSchema, rows: &[SeedRow]) -> Result<SeedOutcome> {
        let table = schema.table_name();
        let formats = rows
            .iter()
            .map(|row| row_formats(schema, row))
            .collect::<Result<Vec<_>>>()?;

        let mut outcome = SeedOutcome::default();
        for (row, formats) in rows.iter().zip(&formats) {
            let id = self.driver.insert(table, row, formats).map_err(|e| {
                MigrationError::SeedInsertFailed {
                    table: table.to_string(),
                    message: e.0,
                }
            })?;
            outcome.inserted_ids.push(id);
        }

        debug!(table = %table, rows = outcome.inserted(), "Seeded table");
        Ok(outcome)
    }

    /// Consumes the seeder and returns the driver.
    pub fn into_driver(self) -> D {
        self.driver
    }
}

fn row_formats(schema: &TableSchema, row: &SeedRow) -> Result<Vec<Placeholder>> {
    row.fields()
        .map(|field| {
            schema
                .column(field)
                .map(|column| Placeholder::for_column_type(&column.column_type))
                .ok_or_else(|| MigrationError::SeedColumnMissing {
                    column: field.to_string(),
                    table: schema.table_name().to_string(),
                })
        })
        .collect()
}
