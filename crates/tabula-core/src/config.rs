//! Configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/tabula/config.toml)
//! 3. Environment variables (TABULA_* prefix)
//!
//! Environment variables take precedence over config file values.
//!
//! ```toml
//! database = "/home/me/.local/share/tabula/library.db"
//! default_table = "books"
//!
//! [[tables]]
//! name = "BookDB"
//! table_name = "books"
//!
//! [[tables.fields]]
//! name = "title"
//! type = "text"
//!
//! [[tables.fields]]
//! name = "isbn"
//! type = "text"
//! unique = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::factory::TableFactory;
use crate::schema::{FieldSpec, SchemaError};

/// Environment variable prefix
const ENV_PREFIX: &str = "TABULA";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Table used when none is named explicitly
    #[serde(default)]
    pub default_table: Option<String>,

    /// Declared tables
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// One declared table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Logical name
    pub name: String,

    /// Physical table name, defaults to `name`
    #[serde(default)]
    pub table_name: Option<String>,

    pub fields: Vec<FieldSpec>,
}

impl TableConfig {
    /// Build the table factory this entry describes
    pub fn factory(&self) -> std::result::Result<TableFactory, SchemaError> {
        let factory = TableFactory::new(self.fields.clone(), self.name.as_str())?;
        match &self.table_name {
            Some(table_name) => factory.with_table_name(table_name.as_str()),
            None => Ok(factory),
        }
    }

    /// Whether `name` refers to this table, by logical or physical name
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.table_name.as_deref() == Some(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            default_table: None,
            tables: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TABULA_DATABASE, TABULA_DEFAULT_TABLE)
    /// 2. Config file (~/.config/tabula/config.toml or TABULA_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // TABULA_DATABASE
        if let Ok(val) = std::env::var(format!("{}_DATABASE", ENV_PREFIX)) {
            self.database = PathBuf::from(val);
        }

        // TABULA_DEFAULT_TABLE
        if let Ok(val) = std::env::var(format!("{}_DEFAULT_TABLE", ENV_PREFIX)) {
            self.default_table = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Find a declared table
    ///
    /// Without a name, falls back to `default_table`, then to the only
    /// declared table.
    pub fn table(&self, name: Option<&str>) -> Option<&TableConfig> {
        match name.or(self.default_table.as_deref()) {
            Some(name) => self.tables.iter().find(|t| t.matches(name)),
            None if self.tables.len() == 1 => self.tables.first(),
            None => None,
        }
    }

    /// Get the config file path
    ///
    /// Can be overridden with TABULA_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabula")
            .join("config.toml")
    }
}

/// Get the default database path
fn default_database() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabula")
        .join("tabula.db")
}
