//! [`RowInserter`] over a SQLite connection.
//!
//! Each seed value is coerced to the category of its column's
//! [`Placeholder`] before binding:
//!
//! | Value | `Integer` | `Float` | `String` |
//! |---|---|---|---|
//! | `Null` | `NULL` | `NULL` | `NULL` |
//! | `Bool` | `0`/`1` | `0.0`/`1.0` | `"0"`/`"1"` |
//! | `Integer` | as is | widened | decimal text |
//! | `Float` | truncated | as is | decimal text |
//! | `Text` | parsed, else `0` | parsed, else `0.0` | as is |

use rusqlite::Connection;
use rusqlite::types::Value;
use table_migration_core::{SeedRow, SeedValue};
use table_migration_db::{DriverError, Placeholder, RowInserter};
use tracing::debug;

use crate::schema::{quote, validate_identifier};

/// Inserts seed rows on a borrowed connection.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use table_migration_core::SeedRow;
/// use table_migration_db::{Placeholder, RowInserter};
/// use table_migration_sqlite::SqliteInserter;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)").unwrap();
///
/// let mut inserter = SqliteInserter::new(&conn);
/// let row = SeedRow::new().with("body", "hello");
/// let id = inserter.insert("notes", &row, &[Placeholder::String]).unwrap();
/// assert_eq!(id, 1);
/// ```
pub struct SqliteInserter<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteInserter<'a> {
    /// Creates an inserter for the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RowInserter for SqliteInserter<'_> {
    fn insert(
        &mut self,
        table_name: &str,
        row: &SeedRow,
        formats: &[Placeholder],
    ) -> Result<i64, DriverError> {
        if formats.len() != row.len() {
            return Err(DriverError(format!(
                "expected {} placeholders, got {}",
                row.len(),
                formats.len()
            )));
        }
        validate_identifier(table_name).map_err(|e| DriverError(e.to_string()))?;

        let mut fields = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for ((field, value), placeholder) in row.iter().zip(formats) {
            validate_identifier(field).map_err(|e| DriverError(e.to_string()))?;
            fields.push(quote(field));
            values.push(coerce(value, *placeholder));
        }

        let sql = if fields.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote(table_name))
        } else {
            let params = (1..=fields.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(table_name),
                fields.join(", "),
                params
            )
        };

        self.conn
            .execute(&sql, rusqlite::params_from_iter(values))
            .map_err(|e| DriverError(e.to_string()))?;
        let id = self.conn.last_insert_rowid();
        debug!(table = %table_name, id, "inserted seed row");
        Ok(id)
    }
}

/// Converts a seed value into the SQLite value bound for `placeholder`.
fn coerce(value: &SeedValue, placeholder: Placeholder) -> Value {
    match (value, placeholder) {
        (SeedValue::Null, _) => Value::Null,

        (SeedValue::Bool(b), Placeholder::Integer) => Value::Integer(i64::from(*b)),
        (SeedValue::Integer(n), Placeholder::Integer) => Value::Integer(*n),
        (SeedValue::Float(f), Placeholder::Integer) => Value::Integer(*f as i64),
        (SeedValue::Text(s), Placeholder::Integer) => {
            let s = s.trim();
            let n = s
                .parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f as i64))
                .unwrap_or(0);
            Value::Integer(n)
        }

        (SeedValue::Bool(b), Placeholder::Float) => Value::Real(if *b { 1.0 } else { 0.0 }),
        (SeedValue::Integer(n), Placeholder::Float) => Value::Real(*n as f64),
        (SeedValue::Float(f), Placeholder::Float) => Value::Real(*f),
        (SeedValue::Text(s), Placeholder::Float) => Value::Real(s.trim().parse().unwrap_or(0.0)),

        (SeedValue::Bool(b), Placeholder::String) => Value::Text(if *b { "1" } else { "0" }.into()),
        (SeedValue::Integer(n), Placeholder::String) => Value::Text(n.to_string()),
        (SeedValue::Float(f), Placeholder::String) => Value::Text(f.to_string()),
        (SeedValue::Text(s), Placeholder::String) => Value::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT,
                qty INT,
                price DOUBLE
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce(&SeedValue::Bool(true), Placeholder::Integer), Value::Integer(1));
        assert_eq!(coerce(&SeedValue::Float(2.9), Placeholder::Integer), Value::Integer(2));
        assert_eq!(coerce(&"42".into(), Placeholder::Integer), Value::Integer(42));
        assert_eq!(coerce(&"7.5".into(), Placeholder::Integer), Value::Integer(7));
        assert_eq!(coerce(&"abc".into(), Placeholder::Integer), Value::Integer(0));
    }

    #[test]
    fn test_coerce_float_and_string() {
        assert_eq!(coerce(&SeedValue::Integer(3), Placeholder::Float), Value::Real(3.0));
        assert_eq!(coerce(&"1.25".into(), Placeholder::Float), Value::Real(1.25));
        assert_eq!(
            coerce(&SeedValue::Integer(3), Placeholder::String),
            Value::Text("3".to_string())
        );
        assert_eq!(
            coerce(&SeedValue::Bool(false), Placeholder::String),
            Value::Text("0".to_string())
        );
        assert_eq!(coerce(&SeedValue::Null, Placeholder::String), Value::Null);
    }

    #[test]
    fn test_insert_returns_row_ids() {
        let conn = conn_with_table();
        let mut inserter = SqliteInserter::new(&conn);
        let formats = [Placeholder::String, Placeholder::Integer, Placeholder::Float];

        let first = SeedRow::new().with("label", "apple").with("qty", "3").with("price", 1);
        let second = SeedRow::new().with("label", "pear").with("qty", 5).with("price", 0.5);
        assert_eq!(inserter.insert("items", &first, &formats).unwrap(), 1);
        assert_eq!(inserter.insert("items", &second, &formats).unwrap(), 2);

        let (qty, price): (i64, f64) = conn
            .query_row("SELECT qty, price FROM items WHERE label = 'apple'", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(qty, 3);
        assert_eq!(price, 1.0);
    }

    #[test]
    fn test_empty_row_inserts_defaults() {
        let conn = conn_with_table();
        let mut inserter = SqliteInserter::new(&conn);
        assert_eq!(inserter.insert("items", &SeedRow::new(), &[]).unwrap(), 1);
    }

    #[test]
    fn test_driver_error_carries_sqlite_text() {
        let conn = conn_with_table();
        let mut inserter = SqliteInserter::new(&conn);
        let row = SeedRow::new().with("missing", 1);

        let err = inserter
            .insert("items", &row, &[Placeholder::Integer])
            .unwrap_err();
        assert!(err.0.contains("missing"), "{err}");
    }

    #[test]
    fn test_rejects_unsafe_names_and_mismatched_formats() {
        let conn = conn_with_table();
        let mut inserter = SqliteInserter::new(&conn);
        let row = SeedRow::new().with("label", "x");

        assert!(inserter.insert("items; --", &row, &[Placeholder::String]).is_err());
        assert!(inserter.insert("items", &row, &[]).is_err());

        let bad_field = SeedRow::new().with("label)", "x");
        assert!(inserter.insert("items", &bad_field, &[Placeholder::String]).is_err());
    }
}
