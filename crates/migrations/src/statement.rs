//! Phase-tagged SQL statements produced during migration-file generation

use serde::{Deserialize, Serialize};

use crate::phase::MigrationPhase;

/// One unit of SQL text, optionally assigned to a phase.
///
/// Untagged statements are assigned to the BEFORE phase by the default
/// analyzer when a migration file is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Raw SQL text
    pub sql: String,
    /// Phase the statement belongs to, if already decided
    pub phase: Option<MigrationPhase>,
}

impl Statement {
    /// Create an untagged statement
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            phase: None,
        }
    }

    /// Create a statement assigned to a specific phase
    pub fn with_phase(sql: impl Into<String>, phase: MigrationPhase) -> Self {
        Self {
            sql: sql.into(),
            phase: Some(phase),
        }
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}
