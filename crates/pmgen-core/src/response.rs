//! Normalization of raw generation output into typed task records.
//!
//! Providers sometimes wrap the JSON in markdown code fences or lead with a
//! sentence of prose despite instructions not to. This module strips that
//! decoration, parses the plan envelope, and surfaces anything unparseable
//! as a typed error carrying the raw text for diagnostics.

use serde::Deserialize;
use thiserror::Error;

/// Error from normalizing generation output.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The output was not valid JSON in the expected shape, even after
    /// fence stripping. Carries the raw text so callers can log or show it.
    #[error("malformed generation response: {source}")]
    Malformed {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Instructions as they arrive on the wire: either already an array of
/// steps or a single string the post-processor must split.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Instructions {
    Steps(Vec<String>),
    Raw(String),
}

impl Default for Instructions {
    fn default() -> Self {
        Instructions::Steps(Vec::new())
    }
}

/// One task exactly as the provider emitted it. Every field is defaulted:
/// a provider that omits a field yields an empty value, not a parse error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawTask {
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub maintenance_interval: String,
    #[serde(default)]
    pub instructions: Instructions,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub engineering_rationale: String,
    #[serde(default)]
    pub safety_precautions: String,
    #[serde(default)]
    pub common_failures_prevented: String,
    #[serde(default)]
    pub usage_insights: String,
    #[serde(default)]
    pub scheduled_dates: Vec<String>,
}

#[derive(Deserialize)]
struct PlanEnvelope {
    #[serde(default)]
    maintenance_plan: Vec<RawTask>,
}

/// Strip a markdown code fence from around a JSON payload.
///
/// Tolerates a leading prose line before the opening fence, an optional
/// language tag after it, and trailing text after the closing fence. Input
/// without any fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text.trim();
    };

    let after_open = &text[open + 3..];
    // Drop an optional language tag ("json") up to the first newline.
    let body = match after_open.find('\n') {
        Some(nl) => &after_open[nl + 1..],
        None => after_open,
    };

    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parse fenced-or-bare generation output into raw tasks.
///
/// A response whose `maintenance_plan` key is missing or empty parses to an
/// empty list; only structurally invalid JSON is an error.
pub fn normalize(output: &str) -> Result<Vec<RawTask>, NormalizeError> {
    let json = strip_code_fences(output);
    let envelope: PlanEnvelope =
        serde_json::from_str(json).map_err(|source| NormalizeError::Malformed {
            raw: output.to_owned(),
            source,
        })?;
    Ok(envelope.maintenance_plan)
}
