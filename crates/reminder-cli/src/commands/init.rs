//! Database initialisation command

use reminder_core::config::AppConfig;
use reminder_core::context::CallContext;
use reminder_engine::Services;
use reminder_store::migrations::applied_migrations;
use serde_json::json;

use crate::commands::Output;

/// Opening the services already migrated the database; report the result
pub fn execute(
    services: &Services,
    config: &AppConfig,
    ctx: &CallContext,
) -> Result<Output, Box<dyn std::error::Error>> {
    let conn = services.store.pool().acquire(ctx)?;
    let migrations = applied_migrations(&conn)?;
    Ok(json!({
        "database": config.database.path.display().to_string(),
        "migrations": migrations,
    }))
}
