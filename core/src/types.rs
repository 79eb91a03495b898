//! Table schema type definitions.
//!
//! This module defines the structural description of a table that the
//! migration layer consumes: its name, ordered columns, indexes and foreign
//! keys. The types are serializable with [`serde`] so that their structural
//! content can be digested and compared across deployments.

use serde::{Deserialize, Serialize};

/// A single column definition.
///
/// Only `name` and `column_type` are required; the remaining attributes
/// default to a plain nullable column.
///
/// # Examples
///
/// ```
/// use table_migration_core::Column;
///
/// let id = Column::new("id", "BIGINT").unsigned().auto_increment().not_null();
/// assert_eq!(id.column_type, "BIGINT");
/// assert!(id.auto_increment);
/// assert!(!id.nullable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared SQL type as written by the schema author (e.g. `"varchar"`).
    pub column_type: String,
    /// Optional length or display width (e.g. `255` for `VARCHAR(255)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Whether the column accepts `NULL`.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Default value expression, stored verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether the column auto-increments.
    #[serde(default)]
    pub auto_increment: bool,
    /// Whether a numeric column is unsigned.
    #[serde(default)]
    pub unsigned: bool,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    /// Creates a nullable column with the given name and declared type.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            length: None,
            nullable: true,
            default: None,
            auto_increment: false,
            unsigned: false,
        }
    }

    /// Sets the length or display width.
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Marks the column as `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value expression.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the column as auto-incrementing.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks a numeric column as unsigned.
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
    /// Whether this is the table's primary key.
    #[serde(default)]
    pub primary: bool,
}

impl Index {
    /// Creates a plain (non-unique) index.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            primary: false,
        }
    }

    /// Marks the index as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index as the primary key.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// A foreign key constraint referencing another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Local columns.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub reference_table: String,
    /// Referenced columns, positionally matched to `columns`.
    pub reference_columns: Vec<String>,
    /// `ON UPDATE` action (e.g. `"CASCADE"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    /// `ON DELETE` action (e.g. `"SET NULL"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl ForeignKey {
    /// Creates a single-column foreign key.
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        reference_table: impl Into<String>,
        reference_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: vec![column.into()],
            reference_table: reference_table.into(),
            reference_columns: vec![reference_column.into()],
            on_update: None,
            on_delete: None,
        }
    }

    /// Sets the `ON UPDATE` action.
    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }

    /// Sets the `ON DELETE` action.
    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }
}

/// Structural description of a single table.
///
/// Columns, indexes and foreign keys keep their declaration order, and that
/// order is part of the table's structural identity.
///
/// # Examples
///
/// ```
/// use table_migration_core::{Column, Index, TableSchema};
///
/// let schema = TableSchema::new("wp_foo")
///     .with_column(Column::new("id", "INT").not_null().auto_increment())
///     .with_column(Column::new("title", "VARCHAR").length(255))
///     .with_index(Index::new("pk_id", ["id"]).primary());
///
/// assert_eq!(schema.table_name(), "wp_foo");
/// assert_eq!(schema.columns().len(), 2);
/// assert_eq!(schema.column("title").unwrap().length, Some(255));
/// assert!(!schema.has_column("ghost"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Indexes in declaration order.
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Foreign keys in declaration order.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    /// Creates an empty schema for the given table name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Appends a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends an index.
    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Appends a foreign key.
    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// Returns the columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns `true` if a column with this name is declared.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns the indexes in declaration order.
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Returns the foreign keys in declaration order.
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }
}
