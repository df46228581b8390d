//! Persisted ledger of executed (version, phase) pairs
//!
//! The ledger table is the single source of truth for "already done". Its
//! composite primary key on (version, phase) is the last line of defense
//! against double execution when two runners race.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{MigrationError, MigrationResult};
use crate::executor::QueryExecutor;
use crate::phase::MigrationPhase;
use crate::run::{MigrationRun, LEDGER_TIMESTAMP_FORMAT};

/// Access to the persisted migration ledger table
pub struct MigrationLedger {
    executor: Arc<dyn QueryExecutor>,
    table_name: String,
}

impl MigrationLedger {
    pub fn new(executor: Arc<dyn QueryExecutor>, table_name: impl Into<String>) -> Self {
        Self {
            executor,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create the ledger table if it does not exist yet.
    ///
    /// Returns `true` when the table was created by this call, `false` when
    /// it already existed. Safe to call repeatedly.
    pub async fn ensure_table_exists(&self) -> MigrationResult<bool> {
        let existing = self
            .executor
            .fetch_string_rows(&self.table_exists_sql(), &[self.table_name.clone()])
            .await?;

        if !existing.is_empty() {
            debug!(table = %self.table_name, "Ledger table already exists");
            return Ok(false);
        }

        self.executor
            .execute(&self.create_table_sql(), &[])
            .await?;

        debug!(table = %self.table_name, "Ledger table created");
        Ok(true)
    }

    /// All versions recorded for the given phase, ascending lexicographic
    /// order. Versions recorded only for the other phase are not included.
    pub async fn executed_versions(
        &self,
        phase: MigrationPhase,
    ) -> MigrationResult<BTreeSet<String>> {
        let rows = self
            .executor
            .fetch_string_rows(
                &self.executed_versions_sql(),
                &[phase.as_str().to_string()],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    /// Insert one run record. A unique-constraint violation means the
    /// (version, phase) pair was already recorded and surfaces as
    /// `DuplicateExecution`.
    pub async fn record_run(&self, run: &MigrationRun) -> MigrationResult<()> {
        let params = vec![
            run.version().to_string(),
            run.phase().as_str().to_string(),
            run.started_at().format(LEDGER_TIMESTAMP_FORMAT).to_string(),
            run.finished_at().format(LEDGER_TIMESTAMP_FORMAT).to_string(),
        ];

        match self.executor.execute(&self.record_run_sql(), &params).await {
            Ok(_) => Ok(()),
            Err(MigrationError::UniqueViolation(_)) => Err(MigrationError::DuplicateExecution {
                version: run.version().to_string(),
                phase: run.phase(),
            }),
            Err(e) => Err(e),
        }
    }

    fn table_exists_sql(&self) -> String {
        "SELECT table_name::text FROM information_schema.tables WHERE table_name = $1".to_string()
    }

    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE {} (\n    \
                version VARCHAR(20) NOT NULL,\n    \
                phase VARCHAR(10) NOT NULL,\n    \
                started_at VARCHAR(30) NOT NULL,\n    \
                finished_at VARCHAR(30) NOT NULL,\n    \
                PRIMARY KEY (version, phase)\n\
            )",
            self.table_name
        )
    }

    fn executed_versions_sql(&self) -> String {
        format!(
            "SELECT version FROM {} WHERE phase = $1 ORDER BY version",
            self.table_name
        )
    }

    fn record_run_sql(&self) -> String {
        format!(
            "INSERT INTO {} (version, phase, started_at, finished_at) VALUES ($1, $2, $3, $4)",
            self.table_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;
    use chrono::{TimeZone, Utc};

    fn ledger_with(executor: Arc<MockExecutor>) -> MigrationLedger {
        MigrationLedger::new(executor, "migration")
    }

    fn run(version: &str, phase: MigrationPhase) -> MigrationRun {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        MigrationRun::new(version, phase, at, at)
    }

    #[tokio::test]
    async fn ensure_table_exists_is_idempotent() {
        let executor = Arc::new(MockExecutor::new());
        let ledger = ledger_with(executor.clone());

        executor.queue_fetch(vec![]);
        assert!(ledger.ensure_table_exists().await.unwrap());

        executor.queue_fetch(vec![vec!["migration".to_string()]]);
        assert!(!ledger.ensure_table_exists().await.unwrap());

        let creates = executor
            .calls()
            .iter()
            .filter(|c| c.starts_with("CREATE TABLE"))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn create_table_sql_declares_composite_primary_key() {
        let ledger = ledger_with(Arc::new(MockExecutor::new()));
        let sql = ledger.create_table_sql();

        assert!(sql.contains("CREATE TABLE migration"));
        assert!(sql.contains("PRIMARY KEY (version, phase)"));
        assert!(sql.contains("started_at VARCHAR(30)"));
    }

    #[tokio::test]
    async fn executed_versions_is_phase_scoped_and_ordered() {
        let executor = Arc::new(MockExecutor::new());
        let ledger = ledger_with(executor.clone());

        executor.queue_fetch(vec![
            vec!["20240101000000".to_string()],
            vec!["20240102000000".to_string()],
        ]);

        let versions = ledger
            .executed_versions(MigrationPhase::Before)
            .await
            .unwrap();
        let versions: Vec<_> = versions.into_iter().collect();
        assert_eq!(versions, vec!["20240101000000", "20240102000000"]);

        let calls = executor.calls();
        assert!(calls[0].contains("WHERE phase = $1"));
    }

    #[tokio::test]
    async fn record_run_formats_timestamps_with_microseconds() {
        let executor = Arc::new(MockExecutor::new());
        let ledger = ledger_with(executor.clone());

        ledger
            .record_run(&run("20240101000000", MigrationPhase::Before))
            .await
            .unwrap();

        let calls = executor.calls();
        assert!(calls[0].starts_with("INSERT INTO migration"));
    }

    #[tokio::test]
    async fn duplicate_insert_becomes_duplicate_execution() {
        let executor = Arc::new(MockExecutor::new());
        let ledger = ledger_with(executor.clone());
        let run = run("20240101000000", MigrationPhase::Before);

        ledger.record_run(&run).await.unwrap();
        let err = ledger.record_run(&run).await.unwrap_err();

        match err {
            MigrationError::DuplicateExecution { version, phase } => {
                assert_eq!(version, "20240101000000");
                assert_eq!(phase, MigrationPhase::Before);
            }
            other => panic!("Expected DuplicateExecution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn same_version_other_phase_is_not_a_duplicate() {
        let executor = Arc::new(MockExecutor::new());
        let ledger = ledger_with(executor.clone());

        ledger
            .record_run(&run("20240101000000", MigrationPhase::Before))
            .await
            .unwrap();
        ledger
            .record_run(&run("20240101000000", MigrationPhase::After))
            .await
            .unwrap();
    }
}
