//! Integration tests for `create_plan` against a real PostgreSQL database.
//! Each test creates an isolated temporary database.

use async_trait::async_trait;

use pmgen_core::generate::{GenerateError, Generator};
use pmgen_core::intake::{AssetCategory, AssetIntake};
use pmgen_core::retry::RetryConfig;
use pmgen_core::service::create_plan;
use pmgen_db::queries::{intake_events, plans, tasks};
use pmgen_test_utils::{create_test_db, drop_test_db};

struct CannedGenerator {
    response: String,
}

#[async_trait]
impl Generator for CannedGenerator {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Ok(self.response.clone())
    }
}

fn sample_intake() -> AssetIntake {
    AssetIntake {
        name: "Pump #1".to_owned(),
        model: Some("CR 64-2".to_owned()),
        serial: Some("SN-0042".to_owned()),
        category: AssetCategory::Pump,
        operating_hours: Some(8760.0),
        operating_cycles: Some(120.0),
        environment: Some("indoor".to_owned()),
        plan_start_date: None,
    }
}

const TWO_TASK_RESPONSE: &str = r#"{
    "maintenance_plan": [
        {
            "task_name": "Lubricate Bearings",
            "maintenance_interval": "every 500 hours",
            "instructions": ["Check oil level", "Top off if low"],
            "reason": "prevents bearing wear",
            "scheduled_dates": ["2026-02-01"]
        },
        {
            "task_name": "Inspect Mechanical Seal",
            "maintenance_interval": "every 2000 hours",
            "instructions": "1. Depressurize | 2. Check for leakage",
            "scheduled_dates": ["2026-04-01", "2026-07-01"]
        }
    ]
}"#;

#[tokio::test]
async fn create_plan_persists_plan_and_tasks() {
    let (pool, db_name) = create_test_db().await;

    let generator = CannedGenerator {
        response: TWO_TASK_RESPONSE.to_owned(),
    };
    let outcome = create_plan(&pool, &generator, &sample_intake(), &RetryConfig::no_retry())
        .await
        .expect("create_plan should succeed");

    let plan_id = outcome.plan_id.expect("plan should be persisted");
    assert!(outcome.persist_error.is_none());
    assert_eq!(outcome.tasks.len(), 2);

    let plan = plans::get_plan(&pool, plan_id)
        .await
        .expect("query should succeed")
        .expect("plan row should exist");
    assert_eq!(plan.asset_name, "Pump #1");
    assert_eq!(plan.category, AssetCategory::Pump);
    assert_eq!(plan.operating_hours, Some(8760.0));

    let rows = tasks::list_tasks_for_plan(&pool, plan_id)
        .await
        .expect("query should succeed");
    assert_eq!(rows.len(), 2);
    let lubricate = rows
        .iter()
        .find(|t| t.task_name == "Lubricate Bearings")
        .expect("task row should exist");
    assert_eq!(
        lubricate.instructions,
        vec!["Check oil level", "Top off if low"]
    );
    assert_eq!(lubricate.scheduled_dates, vec!["2026-02-01"]);
    assert_eq!(lubricate.asset_name, "Pump #1");

    let seal = rows
        .iter()
        .find(|t| t.task_name == "Inspect Mechanical Seal")
        .expect("task row should exist");
    assert_eq!(
        seal.instructions,
        vec!["Depressurize", "Check for leakage"]
    );

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn create_plan_records_an_intake_event() {
    let (pool, db_name) = create_test_db().await;

    let generator = CannedGenerator {
        response: "{}".to_owned(),
    };
    create_plan(&pool, &generator, &sample_intake(), &RetryConfig::no_retry())
        .await
        .expect("create_plan should succeed");

    let count = intake_events::count_intake_events(&pool)
        .await
        .expect("count should succeed");
    assert_eq!(count, 1);

    let events = intake_events::list_intake_events(&pool, 10)
        .await
        .expect("list should succeed");
    assert_eq!(events[0].payload["name"], "Pump #1");
    assert_eq!(events[0].payload["category"], "pump");

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn empty_plan_persists_a_plan_row_with_no_tasks() {
    let (pool, db_name) = create_test_db().await;

    let generator = CannedGenerator {
        response: r#"{"maintenance_plan": []}"#.to_owned(),
    };
    let outcome = create_plan(&pool, &generator, &sample_intake(), &RetryConfig::no_retry())
        .await
        .expect("create_plan should succeed");

    let plan_id = outcome.plan_id.expect("plan should be persisted");
    assert!(outcome.tasks.is_empty());

    let count = tasks::count_tasks_for_plan(&pool, plan_id)
        .await
        .expect("count should succeed");
    assert_eq!(count, 0);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn persist_failure_still_returns_generated_tasks() {
    let (pool, db_name) = create_test_db().await;

    // A closed pool makes every write fail while generation still works.
    pool.close().await;

    let generator = CannedGenerator {
        response: TWO_TASK_RESPONSE.to_owned(),
    };
    let outcome = create_plan(&pool, &generator, &sample_intake(), &RetryConfig::no_retry())
        .await
        .expect("generation failure is the only hard failure");

    assert!(outcome.plan_id.is_none());
    assert!(outcome.persist_error.is_some());
    assert_eq!(outcome.tasks.len(), 2);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn deleting_a_plan_cascades_to_its_tasks() {
    let (pool, db_name) = create_test_db().await;

    let generator = CannedGenerator {
        response: TWO_TASK_RESPONSE.to_owned(),
    };
    let outcome = create_plan(&pool, &generator, &sample_intake(), &RetryConfig::no_retry())
        .await
        .expect("create_plan should succeed");
    let plan_id = outcome.plan_id.expect("plan should be persisted");

    plans::delete_plan(&pool, plan_id)
        .await
        .expect("delete should succeed");

    let count = tasks::count_tasks_for_plan(&pool, plan_id)
        .await
        .expect("count should succeed");
    assert_eq!(count, 0);

    drop_test_db(&db_name).await;
}
