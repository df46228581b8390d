//! Test doubles shared by the in-crate unit tests

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MigrationError, MigrationResult};
use crate::executor::QueryExecutor;

/// In-memory executor that records every call and emulates the ledger's
/// composite primary key for INSERT statements.
#[derive(Default)]
pub(crate) struct MockExecutor {
    /// Chronological log: "BEGIN", "COMMIT", "ROLLBACK", executed SQL, or
    /// "fetch: {sql}"
    pub calls: Mutex<Vec<String>>,
    /// Queued responses for `fetch_string_rows`, popped front-first
    pub fetch_results: Mutex<VecDeque<Vec<Vec<String>>>>,
    inserted_keys: Mutex<HashSet<(String, String)>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_fetch(&self, rows: Vec<Vec<String>>) {
        self.fetch_results.lock().unwrap().push_back(rows);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(&self, sql: &str, params: &[String]) -> MigrationResult<u64> {
        // Emulate the (version, phase) primary key on ledger inserts
        if sql.starts_with("INSERT INTO") && params.len() >= 2 {
            let key = (params[0].clone(), params[1].clone());
            if !self.inserted_keys.lock().unwrap().insert(key) {
                return Err(MigrationError::UniqueViolation(format!(
                    "duplicate key ({}, {})",
                    params[0], params[1]
                )));
            }
        }

        self.calls.lock().unwrap().push(sql.to_string());
        Ok(1)
    }

    async fn fetch_string_rows(
        &self,
        sql: &str,
        _params: &[String],
    ) -> MigrationResult<Vec<Vec<String>>> {
        self.calls.lock().unwrap().push(format!("fetch: {}", sql));
        Ok(self
            .fetch_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn begin(&self) -> MigrationResult<()> {
        self.calls.lock().unwrap().push("BEGIN".to_string());
        Ok(())
    }

    async fn commit(&self) -> MigrationResult<()> {
        self.calls.lock().unwrap().push("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(&self) -> MigrationResult<()> {
        self.calls.lock().unwrap().push("ROLLBACK".to_string());
        // A rollback undoes any insert made since BEGIN; the tests only ever
        // wrap a single insert, so dropping all keys is sufficient here.
        self.inserted_keys.lock().unwrap().clear();
        Ok(())
    }
}
