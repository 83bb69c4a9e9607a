//! Asset intake: the user-supplied description of the equipment to be
//! maintained, parsed from a TOML file and validated before any network
//! call is attempted.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use pmgen_db::models::AssetCategory;

/// Placeholder text substituted for missing optional string fields when
/// rendering the prompt.
pub const NOT_SPECIFIED: &str = "not specified";

/// A canonical intake request. Immutable once handed to the prompt builder.
///
/// `name` and `category` are required; everything else is optional and gets
/// an explicit default when the prompt is rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetIntake {
    /// Asset name, e.g. "Feedwater Pump #1". Must be non-empty.
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    /// Asset category; drives the best-practice fallback in the prompt.
    pub category: AssetCategory,
    /// Cumulative operating hours. Must be non-negative when present.
    #[serde(default)]
    pub operating_hours: Option<f64>,
    /// Cumulative operating cycles. Must be non-negative when present.
    #[serde(default)]
    pub operating_cycles: Option<f64>,
    /// Free-text operating environment description.
    #[serde(default)]
    pub environment: Option<String>,
    /// First day of the plan window (ISO "YYYY-MM-DD" string in TOML).
    /// Defaults to today when absent.
    #[serde(default)]
    pub plan_start_date: Option<NaiveDate>,
}

/// Errors from parsing or validating an intake. These surface before any
/// generation call is made.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("intake TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("asset name must not be empty")]
    EmptyName,

    #[error("operating_hours must be non-negative, got {0}")]
    NegativeHours(f64),

    #[error("operating_cycles must be non-negative, got {0}")]
    NegativeCycles(f64),
}

impl AssetIntake {
    /// Check the intake invariants: non-empty name, non-negative hours and
    /// cycles. Category is enforced by the type.
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.name.trim().is_empty() {
            return Err(IntakeError::EmptyName);
        }
        if let Some(h) = self.operating_hours {
            if h < 0.0 {
                return Err(IntakeError::NegativeHours(h));
            }
        }
        if let Some(c) = self.operating_cycles {
            if c < 0.0 {
                return Err(IntakeError::NegativeCycles(c));
            }
        }
        Ok(())
    }

    /// The plan start date, defaulting to today (UTC) when unset.
    pub fn start_date(&self) -> NaiveDate {
        self.plan_start_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Operating hours rendered for the prompt: "0" when unset.
    pub fn hours_text(&self) -> String {
        match self.operating_hours {
            Some(h) => format!("{h}"),
            None => "0".to_owned(),
        }
    }

    /// Operating cycles rendered for the prompt: "0" when unset.
    pub fn cycles_text(&self) -> String {
        match self.operating_cycles {
            Some(c) => format!("{c}"),
            None => "0".to_owned(),
        }
    }

    /// Model string for display/prompt, with the standard placeholder.
    pub fn model_text(&self) -> &str {
        self.model.as_deref().unwrap_or(NOT_SPECIFIED)
    }

    /// Serial string for display/prompt, with the standard placeholder.
    pub fn serial_text(&self) -> &str {
        self.serial.as_deref().unwrap_or(NOT_SPECIFIED)
    }

    /// Environment string for display/prompt, with the standard placeholder.
    pub fn environment_text(&self) -> &str {
        self.environment.as_deref().unwrap_or(NOT_SPECIFIED)
    }
}

/// Parse and validate an intake TOML string.
pub fn parse_intake_toml(content: &str) -> Result<AssetIntake, IntakeError> {
    let intake: AssetIntake = toml::from_str(content)?;
    intake.validate()?;
    Ok(intake)
}
