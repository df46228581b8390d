//! Migration service: the orchestrator tying ledger, discovery, registry,
//! analyzer, generator and the schema-diff seam together
//!
//! The service owns no persistent state of its own; the ledger table is the
//! single source of truth for what already ran, the filesystem for what is
//! prepared.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::analyzer::{DefaultAnalyzer, MigrationAnalyzer};
use crate::config::MigrationConfig;
use crate::discovery::MigrationDiscovery;
use crate::error::{MigrationError, MigrationResult};
use crate::events::MigrationObserver;
use crate::executor::QueryExecutor;
use crate::generator::{MigrationFile, MigrationGenerator, TemplateGenerator};
use crate::ledger::MigrationLedger;
use crate::migration::{Migration, MigrationRegistry};
use crate::phase::MigrationPhase;
use crate::run::MigrationRun;
use crate::schema::{SchemaDiffer, SqlSchema};
use crate::statement::Statement;
use crate::version::{TimestampVersionProvider, VersionProvider};

/// Coordinates migration execution and bookkeeping.
///
/// Collaborators with defaults are replaced through the `with_*` builder
/// methods before first use.
pub struct MigrationService {
    executor: Arc<dyn QueryExecutor>,
    config: MigrationConfig,
    registry: MigrationRegistry,
    ledger: MigrationLedger,
    analyzer: Box<dyn MigrationAnalyzer>,
    version_provider: Box<dyn VersionProvider>,
    generator: Box<dyn MigrationGenerator>,
    differ: Option<Arc<dyn SchemaDiffer>>,
    observers: Vec<Arc<dyn MigrationObserver>>,
}

impl MigrationService {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        config: MigrationConfig,
        registry: MigrationRegistry,
    ) -> MigrationResult<Self> {
        let ledger = MigrationLedger::new(executor.clone(), config.table_name());
        let generator = TemplateGenerator::from_config(&config)?;

        Ok(Self {
            executor,
            config,
            registry,
            ledger,
            analyzer: Box::new(DefaultAnalyzer),
            version_provider: Box::new(TimestampVersionProvider),
            generator: Box::new(generator),
            differ: None,
            observers: Vec::new(),
        })
    }

    pub fn with_analyzer(mut self, analyzer: Box<dyn MigrationAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_version_provider(mut self, provider: Box<dyn VersionProvider>) -> Self {
        self.version_provider = provider;
        self
    }

    pub fn with_generator(mut self, generator: Box<dyn MigrationGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_differ(mut self, differ: Arc<dyn SchemaDiffer>) -> Self {
        self.differ = Some(differ);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn MigrationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn has_differ(&self) -> bool {
        self.differ.is_some()
    }

    /// Versions discoverable in the migrations directory, regardless of
    /// execution status. Reads the filesystem fresh on every call.
    pub fn prepared_versions(&self) -> MigrationResult<BTreeSet<String>> {
        MigrationDiscovery::new(&self.config).prepared_versions()
    }

    /// Versions recorded in the ledger for the given phase
    pub async fn executed_versions(
        &self,
        phase: MigrationPhase,
    ) -> MigrationResult<BTreeSet<String>> {
        self.ledger.executed_versions(phase).await
    }

    /// Create the ledger table if needed; returns `true` when it was created
    pub async fn initialize_migration_table(&self) -> MigrationResult<bool> {
        self.ledger.ensure_table_exists().await
    }

    /// Execute one phase of one migration unit and record the result.
    ///
    /// The caller is responsible for filtering out already-executed
    /// (version, phase) pairs; there is no pre-check here. If the pair is
    /// already in the ledger, its primary key rejects the insert and the
    /// call fails with `DuplicateExecution` after the callback side effects
    /// already ran (rolled back again for transactional units).
    pub async fn execute_migration(
        &self,
        version: &str,
        phase: MigrationPhase,
    ) -> MigrationResult<MigrationRun> {
        let unit = self.registry.resolve(version)?;

        for observer in &self.observers {
            observer.started(version, phase);
        }

        let result = if unit.is_transactional() {
            self.execute_in_transaction(unit.as_ref(), version, phase).await
        } else {
            self.run_phase(unit.as_ref(), version, phase).await
        };

        match result {
            Ok(run) => {
                for observer in &self.observers {
                    observer.succeeded(version, phase, &run);
                }
                Ok(run)
            }
            Err(error) => {
                for observer in &self.observers {
                    observer.failed(version, phase, &error);
                }
                Err(error)
            }
        }
    }

    /// Execute every pending (version, phase) cell: versions ascending, and
    /// for each version the requested phases in the given order. Stops at
    /// the first failure.
    pub async fn execute_migrations(
        &self,
        phases: &[MigrationPhase],
    ) -> MigrationResult<Vec<MigrationRun>> {
        let prepared = self.prepared_versions()?;

        let mut executed: BTreeMap<MigrationPhase, BTreeSet<String>> = BTreeMap::new();
        for phase in phases {
            executed.insert(*phase, self.executed_versions(*phase).await?);
        }

        let pending_count: usize = prepared
            .iter()
            .map(|version| {
                phases
                    .iter()
                    .filter(|phase| !executed[*phase].contains(version))
                    .count()
            })
            .sum();

        if pending_count > 0 {
            info!(count = pending_count, "Pending migrations found");
        }

        let mut runs = Vec::new();

        for version in &prepared {
            for phase in phases {
                if executed[phase].contains(version) {
                    continue;
                }

                info!(version = %version, phase = %phase, "Executing migration");
                let run = self.execute_migration(version, *phase).await?;
                info!(
                    version = %version,
                    phase = %phase,
                    duration_secs = run.duration_secs(),
                    "Migration executed successfully"
                );
                runs.push(run);
            }
        }

        Ok(runs)
    }

    /// Append a run record to the ledger without executing anything.
    /// Used by the skip command to mark migrations as done.
    pub async fn mark_migration_executed(&self, run: &MigrationRun) -> MigrationResult<()> {
        self.ledger.record_run(run).await
    }

    /// SQL statements bringing the live schema in line with the desired
    /// schema, with every excluded table (the ledger table included)
    /// removed from both sides before the comparison.
    pub async fn generate_diff_sqls(&self) -> MigrationResult<Vec<String>> {
        let differ = self.differ.as_ref().ok_or_else(|| {
            MigrationError::Configuration("No schema differ configured".to_string())
        })?;

        let mut from = differ.introspect_schema().await?;
        let mut to = differ.desired_schema().await?;

        self.exclude_tables(&mut from);
        self.exclude_tables(&mut to);

        differ.diff(&from, &to)
    }

    /// Analyze raw statements, obtain a fresh version and write the rendered
    /// migration unit into the migrations directory.
    pub fn generate_migration_file<I, S>(&self, statements: I) -> MigrationResult<MigrationFile>
    where
        I: IntoIterator<Item = S>,
        S: Into<Statement>,
    {
        let statements: Vec<Statement> = statements.into_iter().map(Into::into).collect();
        let analyzed = self.analyzer.analyze(statements);

        let version = self.version_provider.next_version();
        let struct_name = format!("{}{}", self.config.migration_prefix(), version);
        let content = self.generator.generate(&struct_name, &analyzed)?;

        let path = self
            .config
            .migrations_dir()
            .join(format!("{}.rs", struct_name));

        fs::write(&path, &content).map_err(|e| {
            MigrationError::Write(format!(
                "Unable to write new migration to '{}': {}",
                path.display(),
                e
            ))
        })?;

        info!(version = %version, path = %path.display(), "Migration file generated");

        Ok(MigrationFile {
            path,
            version,
            content,
        })
    }

    async fn execute_in_transaction(
        &self,
        unit: &dyn Migration,
        version: &str,
        phase: MigrationPhase,
    ) -> MigrationResult<MigrationRun> {
        self.executor.begin().await?;

        match self.run_phase(unit, version, phase).await {
            Ok(run) => {
                self.executor.commit().await?;
                Ok(run)
            }
            Err(error) => {
                if let Err(rollback_error) = self.executor.rollback().await {
                    warn!(
                        version = %version,
                        phase = %phase,
                        error = %rollback_error,
                        "Rollback failed after migration error"
                    );
                }
                Err(error)
            }
        }
    }

    async fn run_phase(
        &self,
        unit: &dyn Migration,
        version: &str,
        phase: MigrationPhase,
    ) -> MigrationResult<MigrationRun> {
        let started_at = Utc::now();

        match phase {
            MigrationPhase::Before => unit.before(self.executor.as_ref()).await?,
            MigrationPhase::After => unit.after(self.executor.as_ref()).await?,
        }

        let finished_at = Utc::now();
        let run = MigrationRun::new(version, phase, started_at, finished_at);

        self.ledger.record_run(&run).await?;

        Ok(run)
    }

    fn exclude_tables(&self, schema: &mut SqlSchema) {
        for table in self.config.excluded_tables() {
            if schema.has_table(table) {
                schema.drop_table(table);
            }
        }
    }
}
