//! Table builder capability.
//!
//! Turning a [`TableSchema`] into DDL and running it is the job of an
//! external builder. The migration manager only needs to ask it to create or
//! drop a table and learn whether that worked.

use table_migration_core::TableSchema;
use thiserror::Error;

/// A builder's report that it could not create or drop a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("builder failed on {table}: {message}")]
pub struct BuilderError {
    /// Table the operation was for.
    pub table: String,
    /// Backend-provided failure text.
    pub message: String,
}

impl BuilderError {
    /// Creates a builder error for `table`.
    pub fn new(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Creates and drops tables from schema descriptors.
pub trait SchemaBuilder {
    /// Creates (or alters into shape) the table described by `schema`.
    fn create_table(&mut self, schema: &TableSchema) -> Result<(), BuilderError>;

    /// Drops the table described by `schema`.
    fn drop_table(&mut self, schema: &TableSchema) -> Result<(), BuilderError>;
}

impl<T: SchemaBuilder + ?Sized> SchemaBuilder for &mut T {
    fn create_table(&mut self, schema: &TableSchema) -> Result<(), BuilderError> {
        (**self).create_table(schema)
    }

    fn drop_table(&mut self, schema: &TableSchema) -> Result<(), BuilderError> {
        (**self).drop_table(schema)
    }
}

impl<T: SchemaBuilder + ?Sized> SchemaBuilder for Box<T> {
    fn create_table(&mut self, schema: &TableSchema) -> Result<(), BuilderError> {
        (**self).create_table(schema)
    }

    fn drop_table(&mut self, schema: &TableSchema) -> Result<(), BuilderError> {
        (**self).drop_table(schema)
    }
}
