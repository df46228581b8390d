//! Migration phases
//!
//! Every migration unit may contribute work to the BEFORE phase (schema
//! changes the application depends on) and the AFTER phase (cleanup and
//! backfills that depend on the new code being deployed).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Phase of a migration unit's execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationPhase {
    /// Runs before the new application code is live
    Before,
    /// Runs after the BEFORE phase of the whole batch completed
    After,
}

impl MigrationPhase {
    /// Both phases in execution order: BEFORE is always attempted first.
    pub const ALL: [MigrationPhase; 2] = [MigrationPhase::Before, MigrationPhase::After];

    /// Value persisted in the ledger's `phase` column
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationPhase::Before => "before",
            MigrationPhase::After => "after",
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(MigrationPhase::Before),
            "after" => Ok(MigrationPhase::After),
            other => Err(format!("Unknown migration phase '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_round_trips_through_ledger_value() {
        assert_eq!(MigrationPhase::Before.as_str(), "before");
        assert_eq!(MigrationPhase::After.as_str(), "after");
        assert_eq!("before".parse::<MigrationPhase>().unwrap(), MigrationPhase::Before);
        assert_eq!("after".parse::<MigrationPhase>().unwrap(), MigrationPhase::After);
        assert!("up".parse::<MigrationPhase>().is_err());
    }

    #[test]
    fn all_lists_before_first() {
        assert_eq!(
            MigrationPhase::ALL,
            [MigrationPhase::Before, MigrationPhase::After]
        );
    }
}
