use std::time::Duration;

use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool, Result};

use crate::config::DatabaseConfig;

pub mod queries;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Apply the schema and seed-table migrations bundled with the binary
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
