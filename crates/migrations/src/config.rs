//! Configuration for the migration system

use std::path::{Path, PathBuf};

use crate::error::{MigrationError, MigrationResult};

/// Default ledger table name
pub const DEFAULT_TABLE_NAME: &str = "migration";

/// Default filename/struct prefix for migration units
pub const DEFAULT_MIGRATION_PREFIX: &str = "Migration";

/// Immutable configuration bundle, validated at construction.
///
/// The ledger table itself is always part of the excluded-tables set so the
/// schema diff never reports the runner's own bookkeeping table as drift.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    migrations_dir: PathBuf,
    table_name: String,
    migration_prefix: String,
    excluded_tables: Vec<String>,
    template_path: Option<PathBuf>,
    template_indent: String,
}

impl MigrationConfig {
    /// Create a configuration with defaults for everything but the
    /// migrations directory, which must already exist.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> MigrationResult<Self> {
        let migrations_dir = migrations_dir.into();

        if !migrations_dir.is_dir() {
            return Err(MigrationError::Configuration(format!(
                "Migrations directory '{}' is not a directory",
                migrations_dir.display()
            )));
        }

        Ok(Self {
            migrations_dir,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            migration_prefix: DEFAULT_MIGRATION_PREFIX.to_string(),
            excluded_tables: vec![DEFAULT_TABLE_NAME.to_string()],
            template_path: None,
            template_indent: "        ".to_string(),
        })
    }

    /// Override the ledger table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        self.excluded_tables.retain(|t| t != &self.table_name);
        self.excluded_tables.push(table_name.clone());
        self.table_name = table_name;
        self
    }

    /// Override the migration filename/struct prefix
    pub fn with_migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.migration_prefix = prefix.into();
        self
    }

    /// Add tables to exclude from schema diffing. The ledger table stays
    /// excluded regardless.
    pub fn with_excluded_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for table in tables {
            let table = table.into();
            if !self.excluded_tables.contains(&table) {
                self.excluded_tables.push(table);
            }
        }
        self
    }

    /// Use a custom template file for generated migrations. The path must
    /// point to an existing file.
    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> MigrationResult<Self> {
        let path = path.into();

        if !path.is_file() {
            return Err(MigrationError::Configuration(format!(
                "Template file '{}' is not a file",
                path.display()
            )));
        }

        self.template_path = Some(path);
        Ok(self)
    }

    /// Override the indentation used for generated statement lines
    pub fn with_template_indent(mut self, indent: impl Into<String>) -> Self {
        self.template_indent = indent.into();
        self
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn migration_prefix(&self) -> &str {
        &self.migration_prefix
    }

    pub fn excluded_tables(&self) -> &[String] {
        &self.excluded_tables
    }

    pub fn template_path(&self) -> Option<&Path> {
        self.template_path.as_deref()
    }

    pub fn template_indent(&self) -> &str {
        &self.template_indent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rejects_missing_directory() {
        let result = MigrationConfig::new("/definitely/not/a/real/dir");
        assert!(matches!(result, Err(MigrationError::Configuration(_))));
    }

    #[test]
    fn ledger_table_is_always_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let config = MigrationConfig::new(temp_dir.path()).unwrap();
        assert!(config.excluded_tables().contains(&"migration".to_string()));

        let config = config.with_table_name("schema_log");
        assert!(config.excluded_tables().contains(&"schema_log".to_string()));
        assert!(!config.excluded_tables().contains(&"migration".to_string()));
    }

    #[test]
    fn excluded_tables_are_deduplicated() {
        let temp_dir = TempDir::new().unwrap();
        let config = MigrationConfig::new(temp_dir.path())
            .unwrap()
            .with_excluded_tables(["audit", "audit", "migration"]);

        let audit_count = config
            .excluded_tables()
            .iter()
            .filter(|t| *t == "audit")
            .count();
        assert_eq!(audit_count, 1);
    }

    #[test]
    fn rejects_missing_template_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = MigrationConfig::new(temp_dir.path()).unwrap();
        let result = config.with_template_path(temp_dir.path().join("nope.tpl"));
        assert!(matches!(result, Err(MigrationError::Configuration(_))));
    }
}
