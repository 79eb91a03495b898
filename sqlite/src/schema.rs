//! SQL generation for table schemas.
//!
//! Renders a [`TableSchema`] as SQLite `CREATE TABLE IF NOT EXISTS` and
//! `DROP TABLE IF EXISTS` statements. Schemas are structurally validated
//! and every identifier is checked before anything is rendered, so the
//! generated SQL never interpolates untrusted text.
//!
//! # Mapping
//!
//! - Column types are passed through as declared (`VARCHAR(255)`,
//!   `INT UNSIGNED`); SQLite applies its own type affinity rules.
//! - A primary index becomes a `PRIMARY KEY (...)` table constraint, a
//!   unique index a named `UNIQUE (...)` constraint, and any other index a
//!   separate `CREATE INDEX IF NOT EXISTS` statement.
//! - An auto-increment column must be the sole primary key column and is
//!   rendered as `INTEGER PRIMARY KEY AUTOINCREMENT`.
//! - Foreign keys become named `FOREIGN KEY ... REFERENCES` constraints.

use table_migration_core::{Column, ForeignKey, TableSchema, validate_schema};

use crate::error::{Result, SqliteError};

const REFERENTIAL_ACTIONS: &[&str] = &["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION"];

const DEFAULT_KEYWORDS: &[&str] = &["NULL", "CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME"];

/// Validates that a name contains only alphanumeric characters and underscores.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SqliteError::InvalidIdentifier(name.to_string()));
    }
    validate_prefix(name)
}

/// Like [`validate_identifier`], but an empty prefix is allowed.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidIdentifier(prefix.to_string()));
    }
    Ok(())
}

pub(crate) fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

fn quote_list(names: &[String]) -> String {
    names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ")
}

fn validate_names(names: &[String]) -> Result<()> {
    names.iter().try_for_each(|n| validate_identifier(n))
}

/// Generates the DDL creating the table and its non-unique indexes.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidSchema`] if the schema fails structural
/// validation or uses a construct SQLite cannot express, and
/// [`SqliteError::InvalidIdentifier`] if any name is unsafe to render.
///
/// # Examples
///
/// ```
/// use table_migration_core::{Column, Index, TableSchema};
/// use table_migration_sqlite::generate_create_sql;
///
/// let schema = TableSchema::new("uu_foo")
///     .with_column(Column::new("id", "INT").not_null().auto_increment())
///     .with_column(Column::new("foo", "VARCHAR").length(64))
///     .with_index(Index::new("pk", ["id"]).primary());
///
/// let sql = generate_create_sql(&schema).unwrap();
/// assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"uu_foo\""));
/// assert!(sql.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
/// assert!(sql.contains("\"foo\" VARCHAR(64)"));
/// ```
pub fn generate_create_sql(schema: &TableSchema) -> Result<String> {
    let problems = validate_schema(schema);
    if !problems.is_empty() {
        let message = problems
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SqliteError::InvalidSchema(message));
    }
    validate_identifier(schema.table_name())?;
    if schema.columns().is_empty() {
        return Err(SqliteError::InvalidSchema(format!(
            "{} declares no columns",
            schema.table_name()
        )));
    }

    let primary = schema.indexes().iter().find(|i| i.primary);
    let rowid_alias = rowid_alias(schema)?;

    let mut definitions = Vec::new();
    for column in schema.columns() {
        definitions.push(column_definition(column, rowid_alias == Some(column.name.as_str()))?);
    }

    if let Some(index) = primary.filter(|_| rowid_alias.is_none()) {
        validate_names(&index.columns)?;
        definitions.push(format!("PRIMARY KEY ({})", quote_list(&index.columns)));
    }

    for index in schema.indexes().iter().filter(|i| i.unique && !i.primary) {
        validate_identifier(&index.name)?;
        validate_names(&index.columns)?;
        definitions.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quote(&index.name),
            quote_list(&index.columns)
        ));
    }

    for foreign_key in schema.foreign_keys() {
        definitions.push(foreign_key_definition(foreign_key)?);
    }

    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        quote(schema.table_name()),
        definitions.join(",\n    ")
    )];
    statements.extend(index_statements(schema)?);

    Ok(statements.join("\n"))
}

/// Generates the DDL bringing an existing table into line with `schema`.
///
/// `existing` lists the table's current `(column, declared type)` pairs as
/// reported by `PRAGMA table_info`. Columns missing from the table are
/// added with `ALTER TABLE ... ADD COLUMN` and non-unique indexes are
/// created if absent. Columns the table has but the schema no longer
/// declares are left in place.
///
/// # Errors
///
/// Everything [`generate_create_sql`] rejects, plus
/// [`SqliteError::InvalidSchema`] when the change cannot be made in place:
/// a column whose declared type differs, or a new column that is part of a
/// primary key, unique index or foreign key, auto-increments, or is
/// `NOT NULL` without a default.
pub fn generate_alter_sql(schema: &TableSchema, existing: &[(String, String)]) -> Result<String> {
    generate_create_sql(schema)?;
    let table = schema.table_name();
    let rowid_alias = rowid_alias(schema)?;

    let mut statements = Vec::new();
    for column in schema.columns() {
        let is_alias = rowid_alias == Some(column.name.as_str());
        let declared = declared_type(column, is_alias)?;

        if let Some((_, current)) = existing.iter().find(|(name, _)| *name == column.name) {
            if normalize_type(current) != normalize_type(&declared) {
                return Err(SqliteError::InvalidSchema(format!(
                    "column {} of {table} has type '{current}' but the schema declares '{declared}'; \
                     SQLite cannot change a column's type",
                    column.name
                )));
            }
            continue;
        }

        if let Some(reason) = add_column_blocker(schema, column) {
            return Err(SqliteError::InvalidSchema(format!(
                "cannot add column {} to {table}: {reason}",
                column.name
            )));
        }
        statements.push(format!(
            "ALTER TABLE {} ADD COLUMN {};",
            quote(table),
            column_definition(column, false)?
        ));
    }
    statements.extend(index_statements(schema)?);

    Ok(statements.join("\n"))
}

fn index_statements(schema: &TableSchema) -> Result<Vec<String>> {
    schema
        .indexes()
        .iter()
        .filter(|i| !i.unique && !i.primary)
        .map(|index| {
            validate_identifier(&index.name)?;
            validate_names(&index.columns)?;
            Ok(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
                quote(&index.name),
                quote(schema.table_name()),
                quote_list(&index.columns)
            ))
        })
        .collect()
}

/// Returns why `column` cannot be added with `ALTER TABLE ADD COLUMN`.
fn add_column_blocker(schema: &TableSchema, column: &Column) -> Option<&'static str> {
    let name = column.name.as_str();
    if column.auto_increment {
        return Some("auto_increment columns cannot be added");
    }
    if !column.nullable && column.default.is_none() {
        return Some("NOT NULL columns need a default");
    }
    let constrained = schema
        .indexes()
        .iter()
        .any(|i| (i.primary || i.unique) && i.columns.iter().any(|c| c == name));
    if constrained {
        return Some("primary key and unique columns cannot be added");
    }
    let referencing = schema
        .foreign_keys()
        .iter()
        .any(|fk| fk.columns.iter().any(|c| c == name));
    if referencing {
        return Some("foreign key columns cannot be added");
    }
    None
}

fn normalize_type(declared: &str) -> String {
    declared
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Generates the statement dropping the table.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidIdentifier`] if the table name is invalid.
pub fn generate_drop_sql(schema: &TableSchema) -> Result<String> {
    validate_identifier(schema.table_name())?;
    Ok(format!("DROP TABLE IF EXISTS {};", quote(schema.table_name())))
}

/// Returns the auto-increment column, which must be the sole primary key.
fn rowid_alias(schema: &TableSchema) -> Result<Option<&str>> {
    let mut auto = schema.columns().iter().filter(|c| c.auto_increment);
    let Some(column) = auto.next() else {
        return Ok(None);
    };
    if auto.next().is_some() {
        return Err(SqliteError::InvalidSchema(format!(
            "{} has more than one auto_increment column",
            schema.table_name()
        )));
    }

    let is_sole_primary = schema
        .indexes()
        .iter()
        .any(|i| i.primary && i.columns.len() == 1 && i.columns[0] == column.name);
    if !is_sole_primary {
        return Err(SqliteError::InvalidSchema(format!(
            "auto_increment column {} must be the sole primary key of {}",
            column.name,
            schema.table_name()
        )));
    }
    Ok(Some(column.name.as_str()))
}

/// The type text a column is declared with, as `PRAGMA table_info` reports it.
fn declared_type(column: &Column, rowid_alias: bool) -> Result<String> {
    if rowid_alias {
        return Ok("INTEGER".to_string());
    }

    let column_type = column.column_type.trim();
    if !column_type.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ' ') {
        return Err(SqliteError::InvalidSchema(format!(
            "column {} has unsupported type '{}'",
            column.name, column.column_type
        )));
    }

    let mut declared = column_type.to_uppercase();
    if let Some(length) = column.length {
        declared.push_str(&format!("({length})"));
    }
    if column.unsigned {
        declared.push_str(" UNSIGNED");
    }
    Ok(declared)
}

fn column_definition(column: &Column, rowid_alias: bool) -> Result<String> {
    validate_identifier(&column.name)?;
    if rowid_alias {
        return Ok(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(&column.name)));
    }

    let mut definition = format!("{} {}", quote(&column.name), declared_type(column, false)?);
    if !column.nullable {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        definition.push_str(" DEFAULT ");
        definition.push_str(&render_default(default));
    }
    Ok(definition)
}

fn render_default(value: &str) -> String {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    if DEFAULT_KEYWORDS.contains(&upper.as_str()) {
        return upper;
    }

    let numeric = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && trimmed.parse::<f64>().is_ok();
    if numeric {
        return trimmed.to_string();
    }

    format!("'{}'", value.replace('\'', "''"))
}

fn foreign_key_definition(foreign_key: &ForeignKey) -> Result<String> {
    validate_identifier(&foreign_key.name)?;
    validate_identifier(&foreign_key.reference_table)?;
    validate_names(&foreign_key.columns)?;
    validate_names(&foreign_key.reference_columns)?;

    let mut definition = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        quote(&foreign_key.name),
        quote_list(&foreign_key.columns),
        quote(&foreign_key.reference_table),
        quote_list(&foreign_key.reference_columns)
    );
    if let Some(action) = &foreign_key.on_update {
        definition.push_str(" ON UPDATE ");
        definition.push_str(&referential_action(foreign_key, action)?);
    }
    if let Some(action) = &foreign_key.on_delete {
        definition.push_str(" ON DELETE ");
        definition.push_str(&referential_action(foreign_key, action)?);
    }
    Ok(definition)
}

fn referential_action(foreign_key: &ForeignKey, action: &str) -> Result<String> {
    let normalized = action.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
    if REFERENTIAL_ACTIONS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(SqliteError::InvalidSchema(format!(
            "foreign key {} has unsupported action '{}'",
            foreign_key.name, action
        )))
    }
}
