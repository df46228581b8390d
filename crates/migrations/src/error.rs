//! Error types for the migration system
//!
//! One library-level error enum covering configuration, discovery,
//! execution and bookkeeping failures.

use thiserror::Error;

use crate::phase::MigrationPhase;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Invalid configuration detected at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No migration unit is registered for the requested version
    #[error("No migration registered for version '{0}'")]
    UnitNotFound(String),

    /// A migration unit's before/after callback failed
    #[error("Migration callback failed: {0}")]
    PhaseCallback(String),

    /// The ledger already holds a row for this (version, phase) pair.
    /// Signals a race between concurrent runners or a caller that skipped
    /// the pending diff; callers must abort, not retry.
    #[error("Migration {version} was already executed in phase '{phase}'")]
    DuplicateExecution {
        version: String,
        phase: MigrationPhase,
    },

    /// Unable to persist a generated migration file
    #[error("Failed to write migration file: {0}")]
    Write(String),

    /// Migrations directory could not be read
    #[error("Failed to scan migrations directory: {0}")]
    Discovery(String),

    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Raw unique-constraint violation surfaced by the driver. The ledger
    /// converts this into `DuplicateExecution` for its own insert.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Transaction begin/commit/rollback failure
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<sqlx::Error> for MigrationError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // SQLSTATE 23505: unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return MigrationError::UniqueViolation(db_err.to_string());
            }
        }
        MigrationError::Database(err.to_string())
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Write(err.to_string())
    }
}
