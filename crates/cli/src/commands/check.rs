//! Check migration and schema state
//!
//! Exit codes compose bitwise: 1 = migrations awaiting execution,
//! 2 = ledger entries without a prepared file, 4 = live schema diverges
//! from the desired schema. 0 means everything is in sync.

use stagewise::{MigrationPhase, MigrationResult, MigrationService};
use tracing::{error, info, warn};

pub const EXIT_OK: i32 = 0;
pub const EXIT_AWAITING_MIGRATION: i32 = 1;
pub const EXIT_UNKNOWN_MIGRATION: i32 = 2;
pub const EXIT_ENTITIES_NOT_SYNCED: i32 = 4;

pub async fn execute(service: &MigrationService) -> MigrationResult<i32> {
    info!("Starting migration check");

    let mut exit_code = EXIT_OK;
    exit_code |= check_migrations_executed(service).await?;
    exit_code |= check_schema_synced(service).await?;

    info!(
        exit_code,
        success = exit_code == EXIT_OK,
        "Migration check completed"
    );

    Ok(exit_code)
}

async fn check_migrations_executed(service: &MigrationService) -> MigrationResult<i32> {
    let mut exit_code = EXIT_OK;
    let migrations_dir = service.config().migrations_dir().display().to_string();

    for phase in MigrationPhase::ALL {
        let executed = service.executed_versions(phase).await?;
        let prepared = service.prepared_versions()?;

        let awaiting: Vec<&String> = prepared.difference(&executed).collect();
        let unknown: Vec<&String> = executed.difference(&prepared).collect();

        if !unknown.is_empty() {
            exit_code |= EXIT_UNKNOWN_MIGRATION;
            error!(
                phase = %phase,
                migrations_dir = %migrations_dir,
                unknown_count = unknown.len(),
                unknown = ?unknown,
                "Executed migrations not present in migrations directory"
            );
        }

        if !awaiting.is_empty() {
            exit_code |= EXIT_AWAITING_MIGRATION;
            warn!(
                phase = %phase,
                awaiting_count = awaiting.len(),
                awaiting = ?awaiting,
                "Phase not fully executed, migrations awaiting"
            );
        }

        if unknown.is_empty() && awaiting.is_empty() {
            info!(phase = %phase, "Phase fully executed, no awaiting migrations");
        }
    }

    Ok(exit_code)
}

async fn check_schema_synced(service: &MigrationService) -> MigrationResult<i32> {
    if !service.has_differ() {
        info!("No schema differ configured, skipping schema sync check");
        return Ok(EXIT_OK);
    }

    let updates = service.generate_diff_sqls().await?;

    if !updates.is_empty() {
        warn!(
            missing_update_count = updates.len(),
            missing_updates = ?updates,
            "Database is not synced with the desired schema"
        );
        return Ok(EXIT_ENTITIES_NOT_SYNCED);
    }

    info!("Database is synced with the desired schema, no migration needed");
    Ok(EXIT_OK)
}
