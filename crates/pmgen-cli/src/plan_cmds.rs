//! Operator-mode CLI handlers for `pmgen plan` subcommands.
//!
//! Implements:
//! - `pmgen plan show [plan-id]`   -- show plan details or list all plans
//! - `pmgen plan export <plan-id>` -- export a plan and its tasks as JSON
//! - `pmgen plan delete <plan-id>` -- delete a plan and its tasks

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use pmgen_db::models::{PmPlan, PmTask};
use pmgen_db::queries::{plans as plan_queries, tasks as task_queries};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::Show { plan_id } => match plan_id {
            Some(id) => cmd_show_one(pool, &id).await,
            None => cmd_show_all(pool).await,
        },
        PlanCommands::Export { plan_id, output } => {
            cmd_export(pool, &plan_id, output.as_deref()).await
        }
        PlanCommands::Delete { plan_id } => cmd_delete(pool, &plan_id).await,
    }
}

fn parse_plan_id(plan_id: &str) -> Result<Uuid> {
    Uuid::parse_str(plan_id).with_context(|| format!("invalid plan ID: {plan_id}"))
}

// -----------------------------------------------------------------------
// pmgen plan show (list all)
// -----------------------------------------------------------------------

/// List all plans with summary info.
async fn cmd_show_all(pool: &PgPool) -> Result<()> {
    let plans = plan_queries::list_plans(pool).await?;

    if plans.is_empty() {
        println!("No plans found. Use `pmgen generate <file>` to create one.");
        return Ok(());
    }

    // ID is always 36 chars (UUID). Category max is 10 (controller).
    let id_w = 36;
    let asset_w = plans
        .iter()
        .map(|p| p.asset_name.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let cat_w = 10;
    let tasks_w = 5;

    println!(
        "{:<id_w$}  {:<asset_w$}  {:<cat_w$}  {:>tasks_w$}  CREATED",
        "ID", "ASSET", "CATEGORY", "TASKS"
    );

    for plan in &plans {
        let count = task_queries::count_tasks_for_plan(pool, plan.id).await?;
        println!(
            "{:<id_w$}  {:<asset_w$}  {:<cat_w$}  {:>tasks_w$}  {}",
            plan.id,
            plan.asset_name,
            plan.category.label(),
            count,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// pmgen plan show <plan-id>
// -----------------------------------------------------------------------

/// Show one plan and all its tasks.
async fn cmd_show_one(pool: &PgPool, plan_id: &str) -> Result<()> {
    let id = parse_plan_id(plan_id)?;
    let plan = plan_queries::get_plan(pool, id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;
    let tasks = task_queries::list_tasks_for_plan(pool, id).await?;

    println!("Plan {}", plan.id);
    println!("  Asset:       {}", plan.asset_name);
    if let Some(ref model) = plan.asset_model {
        println!("  Model:       {model}");
    }
    if let Some(ref serial) = plan.asset_serial {
        println!("  Serial:      {serial}");
    }
    println!("  Category:    {}", plan.category.label());
    if let Some(hours) = plan.operating_hours {
        println!("  Hours:       {hours}");
    }
    if let Some(cycles) = plan.operating_cycles {
        println!("  Cycles:      {cycles}");
    }
    if let Some(ref env) = plan.environment {
        println!("  Environment: {env}");
    }
    println!("  Start date:  {}", plan.plan_start_date);
    println!("  Created:     {}", plan.created_at.format("%Y-%m-%d %H:%M"));
    println!();

    if tasks.is_empty() {
        println!("No tasks in this plan.");
        return Ok(());
    }

    println!("Tasks ({}):", tasks.len());
    for task in &tasks {
        println!();
        println!("  {} ({})", task.task_name, task.maintenance_interval);
        for (i, step) in task.instructions.iter().enumerate() {
            println!("    {}. {step}", i + 1);
        }
        if !task.reason.is_empty() {
            println!("    Why: {}", task.reason);
        }
        if !task.engineering_rationale.is_empty() {
            println!("    Rationale: {}", task.engineering_rationale);
        }
        if !task.safety_precautions.is_empty() {
            println!("    Safety: {}", task.safety_precautions);
        }
        if !task.common_failures_prevented.is_empty() {
            println!("    Prevents: {}", task.common_failures_prevented);
        }
        if !task.scheduled_dates.is_empty() {
            println!("    Scheduled: {}", task.scheduled_dates.join(", "));
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// pmgen plan export <plan-id>
// -----------------------------------------------------------------------

#[derive(Serialize)]
struct PlanExport {
    plan: PmPlan,
    tasks: Vec<PmTask>,
}

/// Export a plan and its tasks as pretty-printed JSON, to a file or stdout.
async fn cmd_export(pool: &PgPool, plan_id: &str, output: Option<&str>) -> Result<()> {
    let id = parse_plan_id(plan_id)?;
    let plan = plan_queries::get_plan(pool, id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;
    let tasks = task_queries::list_tasks_for_plan(pool, id).await?;

    let export = PlanExport { plan, tasks };
    let json = serde_json::to_string_pretty(&export).context("failed to serialize plan")?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write export to {path}"))?;
            println!("Plan exported to {path}.");
        }
        None => println!("{json}"),
    }

    Ok(())
}

// -----------------------------------------------------------------------
// pmgen plan delete <plan-id>
// -----------------------------------------------------------------------

/// Delete a plan; tasks go with it via the FK cascade.
async fn cmd_delete(pool: &PgPool, plan_id: &str) -> Result<()> {
    let id = parse_plan_id(plan_id)?;
    plan_queries::delete_plan(pool, id).await?;
    println!("Plan {plan_id} deleted.");
    Ok(())
}
