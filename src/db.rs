use crate::config::Settings;
use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Connect to PostgreSQL without touching the schema
pub async fn connect(settings: &Settings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .min_connections(settings.database_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(3600))
        .connect(settings.database_url()?)
        .await
        .context("Failed to create database connection pool")?;

    // Try to acquire a connection to verify the pool is working
    pool.acquire()
        .await
        .context("Failed to acquire initial database connection")?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");
    Ok(())
}

/// Connect and bring the schema up to date
pub async fn create_pool(settings: &Settings) -> Result<PgPool> {
    let pool = connect(settings).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
