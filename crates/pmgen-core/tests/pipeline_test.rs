//! End-to-end pipeline tests with a mock generator and no database:
//! intake TOML in, canonical tasks out.

use async_trait::async_trait;
use std::sync::Mutex;

use pmgen_core::generate::{GenerateError, Generator};
use pmgen_core::retry::RetryConfig;
use pmgen_core::service::generate_tasks;
use pmgen_core::{build_prompt, parse_intake_toml};

/// Mock that records the prompt it was given and replies with a canned body.
struct RecordingGenerator {
    response: String,
    seen_prompt: Mutex<Option<String>>,
}

impl RecordingGenerator {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_owned(),
            seen_prompt: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        *self.seen_prompt.lock().unwrap() = Some(prompt.to_owned());
        Ok(self.response.clone())
    }
}

const INTAKE_TOML: &str = r#"
name = "Pump #1"
model = "Grundfos CR 64-2"
category = "pump"
operating_hours = 8760
environment = "indoor, high humidity"
plan_start_date = "2026-01-01"
"#;

const FENCED_RESPONSE: &str = r#"```json
{
  "maintenance_plan": [
    {
      "task_name": "Lubricate Bearings",
      "maintenance_interval": "every 500 hours",
      "instructions": "Check oil level|Top off if low",
      "reason": "prevents bearing wear",
      "engineering_rationale": "bearing L10 life at continuous duty",
      "safety_precautions": "lock out power before opening the housing",
      "common_failures_prevented": "bearing seizure",
      "usage_insights": "8760 hours implies continuous duty",
      "scheduled_dates": ["2026-02-01", "2026-03-01"]
    }
  ]
}
```"#;

#[tokio::test]
async fn intake_toml_to_canonical_tasks() {
    let intake = parse_intake_toml(INTAKE_TOML).expect("intake should parse");
    let generator = RecordingGenerator::new(FENCED_RESPONSE);

    let result = generate_tasks(&generator, &intake, &RetryConfig::no_retry())
        .await
        .expect("pipeline should succeed");

    // The prompt carried the asset identity and usage.
    let prompt = generator.seen_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Pump #1"));
    assert!(prompt.contains("8760 hours"));
    assert!(prompt.contains("2026-01-01"));

    // The fenced, pipe-separated response came out canonical.
    assert_eq!(result.tasks.len(), 1);
    let task = &result.tasks[0];
    assert_eq!(task.task_name, "Lubricate Bearings");
    assert_eq!(
        task.instructions,
        vec!["Check oil level", "Top off if low"]
    );
    assert_eq!(task.scheduled_dates, vec!["2026-02-01", "2026-03-01"]);
    assert_eq!(task.asset_name, "Pump #1");
    assert_eq!(task.asset_model, "Grundfos CR 64-2");
}

#[tokio::test]
async fn minimal_intake_produces_placeholder_prompt() {
    let intake = parse_intake_toml("name = \"Bare Valve\"\ncategory = \"valve\"\n")
        .expect("minimal intake should parse");
    let prompt = build_prompt(&intake);

    assert!(prompt.contains("Bare Valve"));
    assert!(prompt.contains("not specified"));
    assert!(prompt.contains("0 hours"));
}

#[tokio::test]
async fn numbered_array_instructions_are_cleaned() {
    let response = r#"{
        "maintenance_plan": [
            {
                "task_name": "Inspect Seals",
                "instructions": ["1. Depressurize the line", "2. Remove the cover", "3. Inspect seal faces"]
            }
        ]
    }"#;
    let intake = parse_intake_toml(INTAKE_TOML).expect("intake should parse");
    let generator = RecordingGenerator::new(response);

    let result = generate_tasks(&generator, &intake, &RetryConfig::no_retry())
        .await
        .expect("pipeline should succeed");

    assert_eq!(
        result.tasks[0].instructions,
        vec![
            "Depressurize the line",
            "Remove the cover",
            "Inspect seal faces"
        ]
    );
}
