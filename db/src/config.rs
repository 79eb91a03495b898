//! Migration run configuration.
//!
//! Defines the YAML-serializable configuration naming the log key a
//! deployment uses and the tables each batch operation should skip.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! log_key: acme_plugin_migrations
//! exclude:
//!   create:
//!     - legacy_table
//!   seed: []
//!   drop:
//!     - audit_log
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::log::DEFAULT_LOG_KEY;

/// Per-operation table exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeConfig {
    /// Tables skipped by `create_tables`.
    #[serde(default)]
    pub create: Vec<String>,
    /// Tables skipped by `seed_tables`.
    #[serde(default)]
    pub seed: Vec<String>,
    /// Tables skipped by `drop_tables`.
    #[serde(default)]
    pub drop: Vec<String>,
}

/// Top-level migration configuration.
///
/// # Examples
///
/// ```
/// # let yaml = r#"
/// # version: "1.0"
/// # exclude: { drop: [audit_log] }
/// # "#;
/// # let config: table_migration_db::MigrationConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.log_key(), table_migration_db::DEFAULT_LOG_KEY);
/// assert_eq!(config.exclude.drop, vec!["audit_log"]);
/// assert!(config.exclude.create.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Store key for the migration log; [`DEFAULT_LOG_KEY`] when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_key: Option<String>,
    /// Tables to skip per operation.
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            log_key: None,
            exclude: ExcludeConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::MigrationError::Io) if the file cannot be read,
    /// or [`Yaml`](crate::MigrationError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::MigrationError::Io) if the file cannot be
    /// written, or [`Yaml`](crate::MigrationError::Yaml) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns the configured log key, or [`DEFAULT_LOG_KEY`].
    pub fn log_key(&self) -> &str {
        self.log_key.as_deref().unwrap_or(DEFAULT_LOG_KEY)
    }
}
