//! Seed row values.
//!
//! A [`SeedRow`] is an ordered list of field/value pairs destined for a
//! single `INSERT`. Field order is preserved so that inserts are
//! reproducible.

use serde::{Deserialize, Serialize};

/// A scalar value in a seed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum SeedValue {
    /// SQL `NULL`.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl SeedValue {
    /// Returns `true` for [`SeedValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, SeedValue::Null)
    }
}

impl From<bool> for SeedValue {
    fn from(value: bool) -> Self {
        SeedValue::Bool(value)
    }
}

impl From<i32> for SeedValue {
    fn from(value: i32) -> Self {
        SeedValue::Integer(i64::from(value))
    }
}

impl From<i64> for SeedValue {
    fn from(value: i64) -> Self {
        SeedValue::Integer(value)
    }
}

impl From<u32> for SeedValue {
    fn from(value: u32) -> Self {
        SeedValue::Integer(i64::from(value))
    }
}

impl From<f32> for SeedValue {
    fn from(value: f32) -> Self {
        SeedValue::Float(f64::from(value))
    }
}

impl From<f64> for SeedValue {
    fn from(value: f64) -> Self {
        SeedValue::Float(value)
    }
}

impl From<&str> for SeedValue {
    fn from(value: &str) -> Self {
        SeedValue::Text(value.to_string())
    }
}

impl From<String> for SeedValue {
    fn from(value: String) -> Self {
        SeedValue::Text(value)
    }
}

impl<T: Into<SeedValue>> From<Option<T>> for SeedValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SeedValue::Null, Into::into)
    }
}

/// One row of seed data, as ordered `(field, value)` pairs.
///
/// # Examples
///
/// ```
/// use table_migration_core::{SeedRow, SeedValue};
///
/// let row = SeedRow::new().with("foo", "text1").with("number", 1);
/// assert_eq!(row.len(), 2);
/// assert_eq!(row.get("number"), Some(&SeedValue::Integer(1)));
///
/// let fields: Vec<_> = row.fields().collect();
/// assert_eq!(fields, vec!["foo", "number"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeedRow {
    values: Vec<(String, SeedValue)>,
}

impl SeedRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field and returns the row, for chaining.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<SeedValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field. An existing field keeps its position and gets the new value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<SeedValue>) {
        let field = field.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
    }

    /// Looks up a field's value.
    pub fn get(&self, field: &str) -> Option<&SeedValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Iterates over field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeedValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SeedRow
where
    K: Into<String>,
    V: Into<SeedValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut row = SeedRow::new();
        for (field, value) in iter {
            row.set(field, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = SeedRow::new().with("a", 1).with("b", 2);
        row.set("a", "changed");
        let pairs: Vec<_> = row.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("a", &SeedValue::Text("changed".into())),
                ("b", &SeedValue::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_option_maps_to_null() {
        let none: Option<i64> = None;
        assert!(SeedValue::from(none).is_null());
        assert_eq!(SeedValue::from(Some(3)), SeedValue::Integer(3));
    }

    #[test]
    fn test_from_iterator() {
        let row: SeedRow = vec![("x", 1.5), ("y", 2.5)].into_iter().collect();
        assert_eq!(row.get("y"), Some(&SeedValue::Float(2.5)));
        assert!(!row.is_empty());
    }
}
