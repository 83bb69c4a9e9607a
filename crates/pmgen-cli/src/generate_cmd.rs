//! Operator-mode CLI handlers for `pmgen generate` and `pmgen prompt`.

use anyhow::{Context, Result};

use pmgen_core::generate::OpenAiGenerator;
use pmgen_core::retry::RetryConfig;
use pmgen_core::service::{PlanOutcome, create_plan, generate_tasks};
use pmgen_core::task::MaintenanceTask;
use pmgen_core::{build_prompt, parse_intake_toml};
use pmgen_db::pool;

use crate::config::PmgenConfig;

/// Read an intake TOML from disk, run the generation pipeline, and either
/// persist the plan or just print it (`--no-save`).
pub async fn run_generate(resolved: &PmgenConfig, file_path: &str, no_save: bool) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read intake file: {file_path}"))?;
    let intake = parse_intake_toml(&content)
        .with_context(|| format!("invalid intake file: {file_path}"))?;

    let generator = OpenAiGenerator::new(resolved.generator_config.clone())?;
    let retry = RetryConfig::default();

    if no_save {
        let result = generate_tasks(&generator, &intake, &retry).await?;
        print_tasks(&result.tasks);
        return Ok(());
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let outcome = create_plan(&db_pool, &generator, &intake, &retry).await;
    db_pool.close().await;
    let outcome = outcome?;

    print_tasks(&outcome.tasks);
    print_persistence(&outcome);

    Ok(())
}

/// Print the prompt that `generate` would send, without touching the
/// network or the database.
pub fn run_prompt(file_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read intake file: {file_path}"))?;
    let intake = parse_intake_toml(&content)
        .with_context(|| format!("invalid intake file: {file_path}"))?;

    println!("{}", build_prompt(&intake));
    Ok(())
}

fn print_tasks(tasks: &[MaintenanceTask]) {
    if tasks.is_empty() {
        println!("The generation service returned an empty plan.");
        return;
    }

    println!(
        "Generated {} task{} for {}:",
        tasks.len(),
        if tasks.len() == 1 { "" } else { "s" },
        tasks[0].asset_name
    );
    for task in tasks {
        println!();
        println!("  {} ({})", task.task_name, task.maintenance_interval);
        for (i, step) in task.instructions.iter().enumerate() {
            println!("    {}. {step}", i + 1);
        }
        if !task.reason.is_empty() {
            println!("    Why: {}", task.reason);
        }
        if !task.safety_precautions.is_empty() {
            println!("    Safety: {}", task.safety_precautions);
        }
        if !task.scheduled_dates.is_empty() {
            println!("    Scheduled: {}", task.scheduled_dates.join(", "));
        }
    }
}

fn print_persistence(outcome: &PlanOutcome) {
    println!();
    match (&outcome.plan_id, &outcome.persist_error) {
        (Some(plan_id), _) => {
            println!("Plan saved with ID {plan_id}.");
            println!("Use `pmgen plan show {plan_id}` to view it.");
        }
        (None, Some(err)) => {
            println!("WARNING: the plan was generated but could not be saved: {err}");
            println!("The tasks above are complete; re-run once the database is reachable.");
        }
        (None, None) => {}
    }
}
