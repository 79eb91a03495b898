//! Table schema validation.
//!
//! Validates structural invariants of a [`TableSchema`], catching errors
//! such as duplicate columns, indexes over undeclared columns and malformed
//! foreign keys before a builder turns the schema into DDL.
//!
//! # Examples
//!
//! ```
//! use table_migration_core::*;
//!
//! let schema = TableSchema::new("users")
//!     .with_column(Column::new("id", "INT"))
//!     .with_index(Index::new("pk", ["id"]).primary());
//! assert!(validate_schema(&schema).is_empty());
//!
//! // Invalid: index over an undeclared column
//! let bad = TableSchema::new("users")
//!     .with_column(Column::new("id", "INT"))
//!     .with_index(Index::new("ix_email", ["email"]));
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::TableSchema;

/// Schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// A column has an empty name.
    #[error("column name cannot be empty")]
    EmptyColumnName,
    /// A column name has leading or trailing whitespace.
    #[error("column name '{0}' has surrounding whitespace")]
    PaddedColumnName(String),
    /// A column has an empty declared type.
    #[error("column {0} has no declared type")]
    MissingColumnType(String),
    /// Two columns share a name.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// An index names a column the table does not declare.
    #[error("index {index} references unknown column {column}")]
    UnknownIndexColumn { index: String, column: String },
    /// A foreign key names a local column the table does not declare.
    #[error("foreign key {key} references unknown column {column}")]
    UnknownForeignKeyColumn { key: String, column: String },
    /// A foreign key's local and referenced column lists differ in length.
    #[error("foreign key {0} has mismatched column counts")]
    ForeignKeyArity(String),
    /// More than one index is flagged as primary.
    #[error("table {0} declares more than one primary key")]
    MultiplePrimaryKeys(String),
}

/// Validates a table schema and returns every problem found.
///
/// An empty table name short-circuits; all other checks accumulate.
pub fn validate_schema(schema: &TableSchema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.name.trim().is_empty() {
        errors.push(ValidationError::EmptyTableName);
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for column in &schema.columns {
        let name = column.name.as_str();
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyColumnName);
            continue;
        }
        if name != name.trim() {
            errors.push(ValidationError::PaddedColumnName(name.to_string()));
        }
        if column.column_type.trim().is_empty() {
            errors.push(ValidationError::MissingColumnType(name.to_string()));
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateColumn(name.to_string()));
        }
    }

    let mut primaries = 0;
    for index in &schema.indexes {
        if index.primary {
            primaries += 1;
        }
        for column in &index.columns {
            if !seen.contains(column.as_str()) {
                errors.push(ValidationError::UnknownIndexColumn {
                    index: index.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }
    if primaries > 1 {
        errors.push(ValidationError::MultiplePrimaryKeys(schema.name.clone()));
    }

    for key in &schema.foreign_keys {
        if key.columns.len() != key.reference_columns.len() || key.columns.is_empty() {
            errors.push(ValidationError::ForeignKeyArity(key.name.clone()));
        }
        for column in &key.columns {
            if !seen.contains(column.as_str()) {
                errors.push(ValidationError::UnknownForeignKeyColumn {
                    key: key.name.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    errors
}
