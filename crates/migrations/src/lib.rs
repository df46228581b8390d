//! # stagewise: two-phase database schema migrations
//!
//! Tracks which versioned migration units have been applied to a database,
//! executes pending ones in ascending version order with a BEFORE/AFTER
//! phase split, and generates new migration files from schema-diff
//! statements.
//!
//! Every migration unit implements the [`Migration`] trait and is registered
//! under its version in a [`MigrationRegistry`]; the [`MigrationService`]
//! diffs prepared versions (filesystem) against executed versions (the
//! ledger table) and runs what is pending. Successful executions are the
//! only thing ever recorded — a failed phase leaves no ledger row and is
//! retried on the next run.

pub mod analyzer;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod executor;
pub mod generator;
pub mod ledger;
pub mod migration;
pub mod phase;
pub mod run;
pub mod schema;
pub mod service;
pub mod statement;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core traits and types
pub use analyzer::{DefaultAnalyzer, MigrationAnalyzer};
pub use config::MigrationConfig;
pub use discovery::MigrationDiscovery;
pub use error::{MigrationError, MigrationResult};
pub use events::MigrationObserver;
pub use executor::{PgPoolExecutor, QueryExecutor};
pub use generator::{MigrationFile, MigrationGenerator, TemplateGenerator};
pub use ledger::MigrationLedger;
pub use migration::{Migration, MigrationRegistry};
pub use phase::MigrationPhase;
pub use run::MigrationRun;
pub use schema::{SchemaDiffer, SqlSchema};
pub use service::MigrationService;
pub use statement::Statement;
pub use version::{TimestampVersionProvider, VersionProvider};

// Generated migration files use this attribute macro
pub use async_trait::async_trait;
