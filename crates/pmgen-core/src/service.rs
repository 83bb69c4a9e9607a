//! The plan generation service: orchestrates intake validation, prompt
//! construction, the retried generation call, response normalization, task
//! post-processing, and persistence.
//!
//! Persistence is split in two: the intake event write is best-effort (a
//! failure is logged and ignored), while the plan and its tasks are written
//! in one transaction so a plan row never exists without its tasks.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use pmgen_db::queries::{intake_events, plans, tasks};
use pmgen_db::queries::plans::NewPlan;
use pmgen_db::queries::tasks::NewTask;

use crate::generate::{GenerateError, Generator};
use crate::intake::{AssetIntake, IntakeError};
use crate::prompt::build_prompt;
use crate::response::{NormalizeError, normalize};
use crate::retry::{RetryConfig, retry_if};
use crate::task::{MaintenanceTask, post_process};

/// Errors from the generation pipeline. Persistence failures are not
/// errors at this level; they surface in [`PlanOutcome::persist_error`].
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Malformed(#[from] NormalizeError),
}

impl PlanError {
    /// Whether another attempt could plausibly succeed. A transiently
    /// unavailable service or a garbled response can; bad intake and a
    /// missing credential cannot.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlanError::Intake(_) => false,
            PlanError::Generate(GenerateError::CredentialMissing) => false,
            PlanError::Generate(GenerateError::Unavailable { .. }) => true,
            PlanError::Malformed(_) => true,
        }
    }
}

/// The outcome of a generation run, before persistence.
#[derive(Debug)]
pub struct GenerationResult {
    pub tasks: Vec<MaintenanceTask>,
}

/// The outcome of a full create-plan run.
///
/// Generated tasks are always present on success; `plan_id` is `None` and
/// `persist_error` is set when the database write failed after a successful
/// generation.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan_id: Option<Uuid>,
    pub tasks: Vec<MaintenanceTask>,
    pub persist_error: Option<String>,
}

/// Run the generation pipeline for one intake: validate, build the prompt,
/// call the generator (with retry on transient failures), normalize the
/// response, and post-process each task.
pub async fn generate_tasks(
    generator: &dyn Generator,
    intake: &AssetIntake,
    retry: &RetryConfig,
) -> Result<GenerationResult, PlanError> {
    intake.validate()?;
    let prompt = build_prompt(intake);

    let raw_tasks = retry_if(retry, PlanError::is_retryable, || async {
        let output = generator.generate(&prompt).await?;
        let raw = normalize(&output)?;
        Ok::<_, PlanError>(raw)
    })
    .await?;

    let tasks: Vec<MaintenanceTask> = raw_tasks
        .into_iter()
        .map(|raw| post_process(raw, intake))
        .collect();

    info!(
        backend = generator.name(),
        asset = %intake.name,
        task_count = tasks.len(),
        "generated maintenance plan"
    );

    Ok(GenerationResult { tasks })
}

/// Generate a plan for the intake and persist it.
///
/// The intake event is recorded first, best-effort. The plan row and its
/// task rows are then written in a single transaction; if that write fails
/// the generated tasks are still returned so the caller can display or
/// export them.
pub async fn create_plan(
    pool: &PgPool,
    generator: &dyn Generator,
    intake: &AssetIntake,
    retry: &RetryConfig,
) -> Result<PlanOutcome, PlanError> {
    intake.validate()?;

    record_intake_event(pool, intake).await;

    let result = generate_tasks(generator, intake, retry).await?;

    match persist_plan(pool, intake, &result.tasks).await {
        Ok(plan_id) => Ok(PlanOutcome {
            plan_id: Some(plan_id),
            tasks: result.tasks,
            persist_error: None,
        }),
        Err(err) => {
            warn!(asset = %intake.name, error = %format!("{err:#}"), "failed to persist plan");
            Ok(PlanOutcome {
                plan_id: None,
                tasks: result.tasks,
                persist_error: Some(format!("{err:#}")),
            })
        }
    }
}

/// Best-effort analytics write. Failure is logged and swallowed.
async fn record_intake_event(pool: &PgPool, intake: &AssetIntake) {
    let payload = match serde_json::to_value(intake) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize intake event");
            return;
        }
    };
    if let Err(err) = intake_events::insert_intake_event(pool, &payload).await {
        warn!(error = %format!("{err:#}"), "failed to record intake event");
    }
}

/// Write the plan row and all task rows in one transaction.
async fn persist_plan(
    pool: &PgPool,
    intake: &AssetIntake,
    generated: &[MaintenanceTask],
) -> anyhow::Result<Uuid> {
    let mut tx = pool.begin().await?;

    let new_plan = NewPlan {
        asset_name: &intake.name,
        asset_model: intake.model.as_deref(),
        asset_serial: intake.serial.as_deref(),
        category: intake.category,
        operating_hours: intake.operating_hours,
        operating_cycles: intake.operating_cycles,
        environment: intake.environment.as_deref(),
        plan_start_date: intake.start_date(),
    };
    let plan = plans::insert_plan(&mut *tx, &new_plan).await?;

    for task in generated {
        let new_task = NewTask {
            task_name: &task.task_name,
            maintenance_interval: &task.maintenance_interval,
            instructions: &task.instructions,
            reason: &task.reason,
            engineering_rationale: &task.engineering_rationale,
            safety_precautions: &task.safety_precautions,
            common_failures_prevented: &task.common_failures_prevented,
            usage_insights: &task.usage_insights,
            scheduled_dates: &task.scheduled_dates,
            asset_name: &task.asset_name,
            asset_model: intake.model.as_deref(),
        };
        tasks::insert_task(&mut *tx, plan.id, &new_task).await?;
    }

    tx.commit().await?;

    info!(plan_id = %plan.id, task_count = generated.len(), "persisted maintenance plan");

    Ok(plan.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::AssetCategory;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedGenerator {
        calls: AtomicU32,
        responses: Mutex<Vec<Result<String, GenerateError>>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String, GenerateError>>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                responses: Mutex::new(responses),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(GenerateError::Unavailable {
                    reason: "script exhausted".to_owned(),
                });
            }
            responses.remove(0)
        }
    }

    fn sample_intake() -> AssetIntake {
        AssetIntake {
            name: "Pump #1".to_owned(),
            model: Some("CR 64-2".to_owned()),
            serial: None,
            category: AssetCategory::Pump,
            operating_hours: Some(8760.0),
            operating_cycles: None,
            environment: None,
            plan_start_date: None,
        }
    }

    const GOOD_RESPONSE: &str = r#"{
        "maintenance_plan": [
            {
                "task_name": "Lubricate Bearings",
                "maintenance_interval": "every 500 hours",
                "instructions": "Check oil level | Top off if low",
                "scheduled_dates": ["2026-02-01"]
            }
        ]
    }"#;

    #[tokio::test]
    async fn generates_and_post_processes_tasks() {
        let generator = ScriptedGenerator::new(vec![Ok(GOOD_RESPONSE.to_owned())]);
        let result = generate_tasks(&generator, &sample_intake(), &RetryConfig::instant())
            .await
            .expect("should generate");

        assert_eq!(result.tasks.len(), 1);
        let task = &result.tasks[0];
        assert_eq!(task.task_name, "Lubricate Bearings");
        assert_eq!(task.instructions, vec!["Check oil level", "Top off if low"]);
        assert_eq!(task.asset_name, "Pump #1");
        assert_eq!(task.asset_model, "CR 64-2");
    }

    #[tokio::test]
    async fn retries_malformed_response_then_succeeds() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Sorry, no plan today.".to_owned()),
            Ok(GOOD_RESPONSE.to_owned()),
        ]);
        let result = generate_tasks(&generator, &sample_intake(), &RetryConfig::instant())
            .await
            .expect("second attempt should succeed");

        assert_eq!(result.tasks.len(), 1);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn retries_unavailable_then_succeeds() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerateError::Unavailable {
                reason: "503".to_owned(),
            }),
            Ok(GOOD_RESPONSE.to_owned()),
        ]);
        let result = generate_tasks(&generator, &sample_intake(), &RetryConfig::instant())
            .await
            .expect("second attempt should succeed");

        assert_eq!(result.tasks.len(), 1);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn missing_credential_is_not_retried() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerateError::CredentialMissing),
            Ok(GOOD_RESPONSE.to_owned()),
        ]);
        let err = generate_tasks(&generator, &sample_intake(), &RetryConfig::instant())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlanError::Generate(GenerateError::CredentialMissing)
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_intake_never_calls_the_generator() {
        let generator = ScriptedGenerator::new(vec![Ok(GOOD_RESPONSE.to_owned())]);
        let intake = AssetIntake {
            name: "  ".to_owned(),
            ..sample_intake()
        };
        let err = generate_tasks(&generator, &intake, &RetryConfig::instant())
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::Intake(IntakeError::EmptyName)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn empty_plan_is_a_valid_result() {
        let generator = ScriptedGenerator::new(vec![Ok("{}".to_owned())]);
        let result = generate_tasks(&generator, &sample_intake(), &RetryConfig::instant())
            .await
            .expect("empty plan is not an error");

        assert!(result.tasks.is_empty());
    }

    #[tokio::test]
    async fn persistent_malformed_output_surfaces_typed_error() {
        let generator = ScriptedGenerator::new(vec![
            Ok("not json".to_owned()),
            Ok("still not json".to_owned()),
            Ok("never json".to_owned()),
        ]);
        let err = generate_tasks(&generator, &sample_intake(), &RetryConfig::instant())
            .await
            .unwrap_err();

        match err {
            PlanError::Malformed(NormalizeError::Malformed { raw, .. }) => {
                assert_eq!(raw, "never json");
            }
            other => panic!("expected Malformed, got: {other}"),
        }
        assert_eq!(generator.calls(), 3);
    }

    #[test]
    fn retryability_classification() {
        assert!(!PlanError::Intake(IntakeError::EmptyName).is_retryable());
        assert!(!PlanError::Generate(GenerateError::CredentialMissing).is_retryable());
        assert!(
            PlanError::Generate(GenerateError::Unavailable {
                reason: "down".to_owned()
            })
            .is_retryable()
        );
    }
}
