//! Prompt construction for the generation service.
//!
//! Renders a validated [`AssetIntake`] into a deterministic natural-language
//! prompt with an explicit output-schema contract. This module contains pure
//! logic (no I/O).

use crate::intake::AssetIntake;

/// Fixed system instruction sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are an expert in industrial preventive maintenance \
     planning. You respond with pure JSON only: a single JSON object, no markdown \
     formatting, no commentary.";

/// JSON output contract included in every prompt.
const SCHEMA_CONTRACT: &str = r#"## Required output format

Return exactly one JSON object with a single key "maintenance_plan" whose value
is an array of task objects. Each task object has exactly these fields:

{
  "maintenance_plan": [
    {
      "task_name": "short name of the maintenance task",
      "maintenance_interval": "how often to perform it, e.g. \"every 500 hours\"",
      "instructions": ["step 1", "step 2", "..."],
      "reason": "why this task matters for this asset",
      "engineering_rationale": "the engineering basis for the interval",
      "safety_precautions": "safety measures to take before and during the task",
      "common_failures_prevented": "failure modes this task prevents",
      "usage_insights": "how the stated usage pattern influenced this task",
      "scheduled_dates": ["YYYY-MM-DD", "..."]
    }
  ]
}

Rules:
- "instructions" must be an array of discrete, ordered steps.
- "scheduled_dates" must contain at most 12 ISO-8601 dates (YYYY-MM-DD),
  computed from the plan start date and the maintenance interval, and no date
  may fall more than 12 months after the plan start date.
- Do NOT wrap the JSON in markdown code fences.
- Do NOT include any text, explanation, or commentary outside the JSON object.
"#;

/// Build the full user prompt for one intake.
///
/// Deterministic: the same intake always yields the same prompt. Missing
/// optional fields are substituted with explicit placeholders so the prompt
/// never contains "null" or an empty slot.
pub fn build_prompt(intake: &AssetIntake) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("# Preventive Maintenance Plan Request\n\n");
    prompt.push_str(
        "Create a complete preventive maintenance plan for the asset described below. \
         Base the plan on the manufacturer's maintenance manual for this specific make \
         and model whenever that guidance is known to you; where it is not, fall back \
         to established best practices for the asset's category.\n\n",
    );

    prompt.push_str("## Asset\n\n");
    prompt.push_str(&format!("- Name: {}\n", intake.name));
    prompt.push_str(&format!("- Model: {}\n", intake.model_text()));
    prompt.push_str(&format!("- Serial number: {}\n", intake.serial_text()));
    prompt.push_str(&format!("- Category: {}\n", intake.category.label()));
    prompt.push_str(&format!("- Usage: {} hours", intake.hours_text()));
    prompt.push_str(&format!(", {} cycles\n", intake.cycles_text()));
    prompt.push_str(&format!("- Environment: {}\n", intake.environment_text()));
    prompt.push_str(&format!("- Plan start date: {}\n", intake.start_date()));
    prompt.push('\n');

    prompt.push_str(SCHEMA_CONTRACT);

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{AssetCategory, NOT_SPECIFIED};
    use chrono::NaiveDate;

    fn sample_intake() -> AssetIntake {
        AssetIntake {
            name: "Pump #1".to_owned(),
            model: Some("CR 64-2".to_owned()),
            serial: Some("SN-0042".to_owned()),
            category: AssetCategory::Pump,
            operating_hours: Some(8760.0),
            operating_cycles: Some(120.0),
            environment: Some("indoor, dusty".to_owned()),
            plan_start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
        }
    }

    #[test]
    fn prompt_contains_asset_identity() {
        let prompt = build_prompt(&sample_intake());
        assert!(prompt.contains("Pump #1"));
        assert!(prompt.contains("CR 64-2"));
        assert!(prompt.contains("SN-0042"));
        assert!(prompt.contains("Category: Pump"));
    }

    #[test]
    fn prompt_contains_usage_and_environment() {
        let prompt = build_prompt(&sample_intake());
        assert!(prompt.contains("8760 hours"));
        assert!(prompt.contains("120 cycles"));
        assert!(prompt.contains("indoor, dusty"));
        assert!(prompt.contains("2026-01-01"));
    }

    #[test]
    fn prompt_contains_output_contract() {
        let prompt = build_prompt(&sample_intake());
        assert!(prompt.contains("\"maintenance_plan\""));
        assert!(prompt.contains("single key"));
        assert!(prompt.contains("task_name"));
        assert!(prompt.contains("scheduled_dates"));
        assert!(prompt.contains("at most 12 ISO-8601 dates"));
    }

    #[test]
    fn prompt_forbids_markdown_and_commentary() {
        let prompt = build_prompt(&sample_intake());
        assert!(prompt.contains("Do NOT wrap the JSON in markdown code fences"));
        assert!(prompt.contains("commentary outside the JSON object"));
    }

    #[test]
    fn prompt_mentions_manual_with_category_fallback() {
        let prompt = build_prompt(&sample_intake());
        assert!(prompt.contains("manufacturer's maintenance manual"));
        assert!(prompt.contains("best practices"));
    }

    #[test]
    fn prompt_substitutes_placeholders_for_missing_fields() {
        let intake = AssetIntake {
            name: "Bare Valve".to_owned(),
            model: None,
            serial: None,
            category: AssetCategory::Valve,
            operating_hours: None,
            operating_cycles: None,
            environment: None,
            plan_start_date: None,
        };
        let prompt = build_prompt(&intake);
        assert!(prompt.contains(&format!("Model: {NOT_SPECIFIED}")));
        assert!(prompt.contains(&format!("Serial number: {NOT_SPECIFIED}")));
        assert!(prompt.contains(&format!("Environment: {NOT_SPECIFIED}")));
        assert!(prompt.contains("0 hours"));
        assert!(prompt.contains("0 cycles"));
        assert!(!prompt.contains("null"));
        assert!(!prompt.contains("None"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let intake = sample_intake();
        assert_eq!(build_prompt(&intake), build_prompt(&intake));
    }

    #[test]
    fn system_prompt_fixes_role_and_json_only() {
        assert!(SYSTEM_PROMPT.contains("preventive maintenance"));
        assert!(SYSTEM_PROMPT.contains("pure JSON"));
    }
}
