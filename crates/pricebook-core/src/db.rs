use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};

use crate::config::DatabaseConfig;

pub type DbPool = Pool<Postgres>;

/// Establish a new Postgres connection pool from explicit settings.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool> {
    connect_with(
        config.connect_options(),
        config.max_connections,
        config.acquire_timeout,
    )
    .await
    .with_context(|| format!("failed to connect to Postgres at {}:{}", config.host, config.port))
}

pub async fn connect_with(
    options: PgConnectOptions,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
        .with_context(|| "failed to connect to Postgres")
}

/// Create the `prices` table if it does not exist yet.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .with_context(|| "failed to run database migrations")
}
