//! Pool construction and schema management for the pmgen database.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// The pmgen tables, parents before children.
pub const TABLES: [&str; 3] = ["pm_plans", "pm_tasks", "intake_events"];

/// Migrations embedded at compile time from `crates/pmgen-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Create a connection pool for one pmgen process.
///
/// A pipeline run needs at most two connections at a time (the intake
/// event write and the plan transaction), so the pool stays small.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.redacted()))?;
    Ok(pool)
}

/// Apply any pending embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to apply database migrations")?;

    info!("database schema is up to date");
    Ok(())
}

/// Create the target database if it does not already exist.
///
/// `CREATE DATABASE` cannot run inside a transaction, so this opens a
/// single direct connection to the `postgres` maintenance database
/// instead of going through a pool.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let db_name = config
        .database_name()
        .context("could not determine database name from URL")?;

    // CREATE DATABASE takes no bind parameters; the name is interpolated,
    // so anything beyond identifier characters is rejected outright.
    if !db_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        anyhow::bail!("database name {db_name:?} contains invalid characters");
    }

    let mut conn = PgConnection::connect(&config.maintenance_url())
        .await
        .context("failed to connect to the maintenance database")?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&mut conn)
            .await
            .context("failed to query pg_database")?;

    if exists {
        info!(db = db_name, "database already exists");
    } else {
        conn.execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "database created");
    }

    let _ = conn.close().await;
    Ok(())
}

/// Row counts for the pmgen tables, for the `db-init` summary.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let query = format!("SELECT COUNT(*) FROM {table}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}
