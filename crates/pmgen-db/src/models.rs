use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Asset category taxonomy. Determines which best-practice guidance the
/// generation prompt falls back to when no manufacturer manual is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Pump,
    Motor,
    Valve,
    Sensor,
    Actuator,
    Controller,
    Other,
}

impl AssetCategory {
    /// Human-readable label used in prompts and display output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pump => "Pump",
            Self::Motor => "Motor",
            Self::Valve => "Valve",
            Self::Sensor => "Sensor",
            Self::Actuator => "Actuator",
            Self::Controller => "Controller",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pump => "pump",
            Self::Motor => "motor",
            Self::Valve => "valve",
            Self::Sensor => "sensor",
            Self::Actuator => "actuator",
            Self::Controller => "controller",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for AssetCategory {
    type Err = AssetCategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pump" => Ok(Self::Pump),
            "motor" => Ok(Self::Motor),
            "valve" => Ok(Self::Valve),
            "sensor" => Ok(Self::Sensor),
            "actuator" => Ok(Self::Actuator),
            "controller" => Ok(Self::Controller),
            "other" => Ok(Self::Other),
            other => Err(AssetCategoryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`AssetCategory`] string.
#[derive(Debug, Clone)]
pub struct AssetCategoryParseError(pub String);

impl fmt::Display for AssetCategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid asset category: {:?}", self.0)
    }
}

impl std::error::Error for AssetCategoryParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A preventive-maintenance plan -- the parent record for one generation
/// request. Carries a snapshot of the intake that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PmPlan {
    pub id: Uuid,
    pub asset_name: String,
    pub asset_model: Option<String>,
    pub asset_serial: Option<String>,
    pub category: AssetCategory,
    pub operating_hours: Option<f64>,
    pub operating_cycles: Option<f64>,
    pub environment: Option<String>,
    pub plan_start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// One maintenance task within a plan.
///
/// `instructions` is always stored as an ordered list of discrete steps;
/// the generation pipeline guarantees this shape before insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PmTask {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub task_name: String,
    pub maintenance_interval: String,
    pub instructions: Vec<String>,
    pub reason: String,
    pub engineering_rationale: String,
    pub safety_precautions: String,
    pub common_failures_prevented: String,
    pub usage_insights: String,
    pub scheduled_dates: Vec<String>,
    pub asset_name: String,
    pub asset_model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An intake tracking event, written best-effort for analytics before a
/// generation call. Stores the raw intake as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IntakeEvent {
    pub id: i64,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
