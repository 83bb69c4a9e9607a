//! Database query functions for the `pm_plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AssetCategory, PmPlan};

/// Fields for a new plan row, snapshotted from the intake that produced it.
#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub asset_name: &'a str,
    pub asset_model: Option<&'a str>,
    pub asset_serial: Option<&'a str>,
    pub category: AssetCategory,
    pub operating_hours: Option<f64>,
    pub operating_cycles: Option<f64>,
    pub environment: Option<&'a str>,
    pub plan_start_date: NaiveDate,
}

/// Insert a new plan row. Returns the inserted plan with server-generated
/// defaults (id, created_at).
///
/// Accepts any executor so it can participate in the service layer's
/// batched-insert transaction.
pub async fn insert_plan<'e, E>(executor: E, new: &NewPlan<'_>) -> Result<PmPlan>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let plan = sqlx::query_as::<_, PmPlan>(
        "INSERT INTO pm_plans (asset_name, asset_model, asset_serial, category, \
                               operating_hours, operating_cycles, environment, plan_start_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(new.asset_name)
    .bind(new.asset_model)
    .bind(new.asset_serial)
    .bind(new.category)
    .bind(new.operating_hours)
    .bind(new.operating_cycles)
    .bind(new.environment)
    .bind(new.plan_start_date)
    .fetch_one(executor)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<PmPlan>> {
    let plan = sqlx::query_as::<_, PmPlan>("SELECT * FROM pm_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// List all plans, ordered by creation time (newest first).
pub async fn list_plans(pool: &PgPool) -> Result<Vec<PmPlan>> {
    let plans = sqlx::query_as::<_, PmPlan>("SELECT * FROM pm_plans ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .context("failed to list plans")?;

    Ok(plans)
}

/// Delete a plan and (via FK cascade) all its tasks.
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM pm_plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete plan")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}
