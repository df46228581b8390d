//! Schema-diff seam
//!
//! Deriving SQL from a live-vs-desired schema comparison is an external
//! collaborator's job. The core only owns one behavior: excluded tables
//! (always including the ledger table) are removed from both schemas before
//! the comparison, so the runner's own bookkeeping never shows up as drift.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::MigrationResult;

/// A thin, comparison-oriented view of a database schema: table name mapped
/// to an opaque definition string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlSchema {
    tables: BTreeMap<String, String>,
}

impl SqlSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, name: impl Into<String>, definition: impl Into<String>) {
        self.tables.insert(name.into(), definition.into());
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn drop_table(&mut self, name: &str) {
        self.tables.remove(name);
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table_definition(&self, name: &str) -> Option<&str> {
        self.tables.get(name).map(String::as_str)
    }
}

/// External collaborator producing schemas and diff statements
#[async_trait]
pub trait SchemaDiffer: Send + Sync {
    /// Introspect the live database schema
    async fn introspect_schema(&self) -> MigrationResult<SqlSchema>;

    /// Build the desired schema from the entity model
    async fn desired_schema(&self) -> MigrationResult<SqlSchema>;

    /// Compute the SQL statements that transform `from` into `to`
    fn diff(&self, from: &SqlSchema, to: &SqlSchema) -> MigrationResult<Vec<String>>;
}
