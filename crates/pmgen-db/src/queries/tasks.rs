//! Database query functions for the `pm_tasks` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PmTask;

/// Fields for a new task row. Instructions must already be normalized to an
/// ordered step list by the generation pipeline.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub task_name: &'a str,
    pub maintenance_interval: &'a str,
    pub instructions: &'a [String],
    pub reason: &'a str,
    pub engineering_rationale: &'a str,
    pub safety_precautions: &'a str,
    pub common_failures_prevented: &'a str,
    pub usage_insights: &'a str,
    pub scheduled_dates: &'a [String],
    pub asset_name: &'a str,
    pub asset_model: Option<&'a str>,
}

/// Insert a single task row under a plan. Returns the inserted task with
/// server-generated defaults (id, created_at).
///
/// Accepts any executor so it can participate in the service layer's
/// batched-insert transaction.
pub async fn insert_task<'e, E>(executor: E, plan_id: Uuid, new: &NewTask<'_>) -> Result<PmTask>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let task = sqlx::query_as::<_, PmTask>(
        "INSERT INTO pm_tasks (plan_id, task_name, maintenance_interval, instructions, \
                               reason, engineering_rationale, safety_precautions, \
                               common_failures_prevented, usage_insights, scheduled_dates, \
                               asset_name, asset_model) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING *",
    )
    .bind(plan_id)
    .bind(new.task_name)
    .bind(new.maintenance_interval)
    .bind(new.instructions)
    .bind(new.reason)
    .bind(new.engineering_rationale)
    .bind(new.safety_precautions)
    .bind(new.common_failures_prevented)
    .bind(new.usage_insights)
    .bind(new.scheduled_dates)
    .bind(new.asset_name)
    .bind(new.asset_model)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert task {:?}", new.task_name))?;

    Ok(task)
}

/// Fetch a single task by ID.
pub async fn get_task(pool: &PgPool, id: Uuid) -> Result<Option<PmTask>> {
    let task = sqlx::query_as::<_, PmTask>("SELECT * FROM pm_tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch task")?;

    Ok(task)
}

/// List all tasks for a given plan, ordered by creation time.
pub async fn list_tasks_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PmTask>> {
    let tasks = sqlx::query_as::<_, PmTask>(
        "SELECT * FROM pm_tasks WHERE plan_id = $1 ORDER BY created_at ASC, task_name ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list tasks for plan")?;

    Ok(tasks)
}

/// Count tasks belonging to a plan.
pub async fn count_tasks_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pm_tasks WHERE plan_id = $1")
        .bind(plan_id)
        .fetch_one(pool)
        .await
        .context("failed to count tasks")?;

    Ok(row.0)
}
