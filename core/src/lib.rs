//! Table schema descriptors and seed row types.
//!
//! This crate defines the data the migration layer works over:
//!
//! - [`TableSchema`]: a table's name, ordered [`Column`]s, [`Index`]es and
//!   [`ForeignKey`]s. Its structural content is what gets hashed to decide
//!   whether a table needs migrating.
//! - [`SeedRow`] / [`SeedValue`]: ordered field/value pairs inserted into a
//!   freshly created table.
//!
//! Validation ([`validate_schema`]) catches structural errors such as
//! duplicate columns and indexes over undeclared columns.
//!
//! # Example
//!
//! ```
//! use table_migration_core::*;
//!
//! let schema = TableSchema::new("wp_foo")
//!     .with_column(Column::new("id", "INT").not_null().auto_increment())
//!     .with_column(Column::new("foo", "TEXT"))
//!     .with_index(Index::new("pk", ["id"]).primary());
//!
//! let seed = SeedRow::new().with("foo", "text1");
//!
//! assert!(validate_schema(&schema).is_empty());
//! assert!(seed.fields().all(|f| schema.has_column(f)));
//! ```

mod seed;
mod types;
mod validate;

pub use seed::{SeedRow, SeedValue};
pub use types::*;
pub use validate::{ValidationError, validate_schema};
