//! Database query functions for the `intake_events` table.
//!
//! Intake events are best-effort analytics rows. Callers log failures and
//! continue; nothing in the generation pipeline depends on them.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::IntakeEvent;

/// Record an intake event. `payload` is the JSON-serialized intake.
pub async fn insert_intake_event(
    pool: &PgPool,
    payload: &serde_json::Value,
) -> Result<IntakeEvent> {
    let event = sqlx::query_as::<_, IntakeEvent>(
        "INSERT INTO intake_events (payload) VALUES ($1) RETURNING *",
    )
    .bind(payload)
    .fetch_one(pool)
    .await
    .context("failed to insert intake event")?;

    Ok(event)
}

/// List recent intake events, newest first.
pub async fn list_intake_events(pool: &PgPool, limit: i64) -> Result<Vec<IntakeEvent>> {
    let events = sqlx::query_as::<_, IntakeEvent>(
        "SELECT * FROM intake_events ORDER BY recorded_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list intake events")?;

    Ok(events)
}

/// Total number of recorded intake events.
pub async fn count_intake_events(pool: &PgPool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM intake_events")
        .fetch_one(pool)
        .await
        .context("failed to count intake events")?;

    Ok(row.0)
}
