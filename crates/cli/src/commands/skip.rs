//! Mark all pending migrations as executed without running them

use chrono::Utc;
use stagewise::{MigrationPhase, MigrationResult, MigrationRun, MigrationService};
use tracing::info;

pub async fn execute(service: &MigrationService) -> MigrationResult<i32> {
    info!("Starting migration skip");

    let mut skipped_count = 0usize;

    for phase in MigrationPhase::ALL {
        let executed = service.executed_versions(phase).await?;
        let prepared = service.prepared_versions()?;
        let to_skip: Vec<&String> = prepared.difference(&executed).collect();

        if !to_skip.is_empty() {
            info!(
                phase = %phase,
                count = to_skip.len(),
                versions = ?to_skip,
                "Found migrations to skip"
            );
        }

        for version in to_skip {
            let now = Utc::now();
            let run = MigrationRun::new(version.clone(), phase, now, now);

            service.mark_migration_executed(&run).await?;

            info!(version = %version, phase = %phase, "Migration skipped");
            skipped_count += 1;
        }
    }

    if skipped_count == 0 {
        info!("No migrations to skip");
    } else {
        info!(skipped_count, "Migration skip completed");
    }

    Ok(0)
}
