//! Migration units and their registry

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MigrationError, MigrationResult};
use crate::executor::QueryExecutor;

/// A single migration unit, identified by its version.
///
/// Both phase callbacks default to no-ops, so a unit only implements the
/// phases it needs. Returning `is_transactional() == true` wraps each phase
/// execution (callback plus ledger insert) in a database transaction —
/// beware that many databases cannot run DDL inside a transaction, which is
/// why this is opt-in.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Work to run in the BEFORE phase
    async fn before(&self, _executor: &dyn QueryExecutor) -> MigrationResult<()> {
        Ok(())
    }

    /// Work to run in the AFTER phase
    async fn after(&self, _executor: &dyn QueryExecutor) -> MigrationResult<()> {
        Ok(())
    }

    /// Whether each phase should run inside a transaction
    fn is_transactional(&self) -> bool {
        false
    }
}

/// Explicit mapping from version to migration unit.
///
/// The host application registers every unit it ships; the service resolves
/// units from here at execution time.
#[derive(Default)]
pub struct MigrationRegistry {
    units: BTreeMap<String, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under its version. Registering the same version twice
    /// replaces the earlier unit.
    pub fn register(&mut self, version: impl Into<String>, unit: Arc<dyn Migration>) -> &mut Self {
        self.units.insert(version.into(), unit);
        self
    }

    /// Resolve the unit for a version
    pub fn resolve(&self, version: &str) -> MigrationResult<Arc<dyn Migration>> {
        self.units
            .get(version)
            .cloned()
            .ok_or_else(|| MigrationError::UnitNotFound(version.to_string()))
    }

    /// All registered versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
