//! Statement analysis during migration-file generation
//!
//! An analyzer can:
//! - sort statements into before/after phases
//! - modify statements (e.g. add a comment or an algorithm/lock clause)
//! - add new statements (e.g. toggle foreign key checks around a new FK)
//!
//! An analyzer should not drop statements or reorder them within a phase.

use crate::phase::MigrationPhase;
use crate::statement::Statement;

/// Classifies raw statements into phase-tagged statements
pub trait MigrationAnalyzer: Send + Sync {
    fn analyze(&self, statements: Vec<Statement>) -> Vec<Statement>;
}

/// Default analyzer: every untagged statement is assigned to the BEFORE
/// phase; already-tagged statements pass through unchanged.
#[derive(Debug, Default)]
pub struct DefaultAnalyzer;

impl MigrationAnalyzer for DefaultAnalyzer {
    fn analyze(&self, statements: Vec<Statement>) -> Vec<Statement> {
        statements
            .into_iter()
            .map(|statement| match statement.phase {
                Some(_) => statement,
                None => Statement::with_phase(statement.sql, MigrationPhase::Before),
            })
            .collect()
    }
}
