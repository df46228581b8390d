//! Record of one successful phase execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::MigrationPhase;

/// Timestamp format persisted in the ledger, with microsecond precision
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Describes one completed execution of a (version, phase) pair.
///
/// Built by the service immediately after a phase callback returns
/// successfully and persisted to the ledger; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRun {
    version: String,
    phase: MigrationPhase,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl MigrationRun {
    pub fn new(
        version: impl Into<String>,
        phase: MigrationPhase,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: version.into(),
            phase,
            started_at,
            finished_at,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Wall-clock duration of the phase callback plus ledger write
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Duration in seconds with sub-second precision
    pub fn duration_secs(&self) -> f64 {
        let duration = self.duration();
        duration.num_seconds() as f64
            + f64::from(duration.subsec_nanos()) / 1_000_000_000.0
    }
}
