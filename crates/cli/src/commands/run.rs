//! Run all pending migrations for the selected phases

use stagewise::{MigrationPhase, MigrationResult, MigrationService};
use tracing::info;

pub async fn execute(
    service: &MigrationService,
    phases: &[MigrationPhase],
) -> MigrationResult<i32> {
    let phase_names: Vec<&str> = phases.iter().map(|p| p.as_str()).collect();
    info!(phases = ?phase_names, "Starting migration execution");

    let runs = service.execute_migrations(phases).await?;

    if runs.is_empty() {
        info!("No migrations to execute");
    } else {
        info!(executed_count = runs.len(), "Migration execution completed");
    }

    Ok(0)
}
