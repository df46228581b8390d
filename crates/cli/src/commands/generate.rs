//! Generate a new migration file from the schema diff

use stagewise::{MigrationResult, MigrationService};
use tracing::info;

pub async fn execute(service: &MigrationService, empty_only: bool) -> MigrationResult<i32> {
    info!("Starting migration generation");

    let sqls = if empty_only {
        Vec::new()
    } else {
        service.generate_diff_sqls().await?
    };

    let sql_count = sqls.len();

    if sql_count == 0 {
        info!("No schema changes found, creating empty migration");
    } else {
        info!(sql_count, "Schema changes detected");
    }

    let file = service.generate_migration_file(sqls)?;

    info!(
        version = %file.version,
        path = %file.path.display(),
        sql_count,
        is_empty = sql_count == 0,
        "Migration generated successfully"
    );

    Ok(0)
}
