//! Create the migration ledger table

use stagewise::{MigrationResult, MigrationService};
use tracing::info;

pub async fn execute(service: &MigrationService) -> MigrationResult<i32> {
    let table_name = service.config().table_name();

    info!(table_name = %table_name, "Initializing migration table");

    let initialized = service.initialize_migration_table().await?;

    if initialized {
        info!(table_name = %table_name, "Migration table created successfully");
    } else {
        info!(table_name = %table_name, "Migration table already exists");
    }

    Ok(0)
}
