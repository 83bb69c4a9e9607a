//! Task post-processing: turn a raw provider task into the canonical record
//! the service persists and the CLI displays.
//!
//! The main job is instruction cleanup. Providers emit instructions as an
//! array, a pipe-separated string, or a numbered list, often with redundant
//! "1." prefixes. The canonical form is an ordered list of bare steps.

use serde::{Deserialize, Serialize};

use crate::intake::AssetIntake;
use crate::response::{Instructions, RawTask};

/// A canonical maintenance task, ready for persistence and display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceTask {
    pub task_name: String,
    pub maintenance_interval: String,
    /// Ordered, cleaned steps. Never contains empty entries.
    pub instructions: Vec<String>,
    pub reason: String,
    pub engineering_rationale: String,
    pub safety_precautions: String,
    pub common_failures_prevented: String,
    pub usage_insights: String,
    /// ISO dates as emitted by the generation service, passed through
    /// unmodified.
    pub scheduled_dates: Vec<String>,
    /// Denormalized from the intake so each task row is self-describing.
    pub asset_name: String,
    pub asset_model: String,
}

/// Convert a raw task into its canonical form, denormalizing the asset
/// identity from the intake.
pub fn post_process(raw: RawTask, intake: &AssetIntake) -> MaintenanceTask {
    MaintenanceTask {
        task_name: raw.task_name.trim().to_owned(),
        maintenance_interval: raw.maintenance_interval.trim().to_owned(),
        instructions: normalize_instructions(raw.instructions),
        reason: raw.reason.trim().to_owned(),
        engineering_rationale: raw.engineering_rationale.trim().to_owned(),
        safety_precautions: raw.safety_precautions.trim().to_owned(),
        common_failures_prevented: raw.common_failures_prevented.trim().to_owned(),
        usage_insights: raw.usage_insights.trim().to_owned(),
        scheduled_dates: raw.scheduled_dates,
        asset_name: intake.name.clone(),
        asset_model: intake.model_text().to_owned(),
    }
}

/// Flatten wire-format instructions into clean ordered steps.
///
/// Raw strings are split on `|`; each step is stripped of list decoration;
/// empty results are dropped. Idempotent: feeding the output back through
/// changes nothing.
fn normalize_instructions(instructions: Instructions) -> Vec<String> {
    let pieces: Vec<String> = match instructions {
        Instructions::Steps(steps) => steps,
        Instructions::Raw(text) => text.split('|').map(str::to_owned).collect(),
    };

    pieces
        .iter()
        .map(|step| clean_step(step))
        .filter(|step| !step.is_empty())
        .collect()
}

/// Strip leading list decoration from one step: numeric prefixes like
/// "1." or "2)" and bullet markers "-" or "*", repeated until stable.
/// A number followed by a non-space character ("2.5 bar") is content,
/// not decoration.
fn clean_step(step: &str) -> String {
    let mut current = step.trim();
    loop {
        let stripped = strip_one_marker(current);
        if stripped == current {
            return current.to_owned();
        }
        current = stripped;
    }
}

fn strip_one_marker(step: &str) -> &str {
    let digits = step.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &step[digits..];
        if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return after.trim_start();
            }
        }
        return step;
    }
    if let Some(after) = step.strip_prefix('-').or_else(|| step.strip_prefix('*')) {
        if after.is_empty() || after.starts_with(char::is_whitespace) {
            return after.trim_start();
        }
    }
    step
}
