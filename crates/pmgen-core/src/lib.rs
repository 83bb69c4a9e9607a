//! The PM plan generation pipeline: intake validation, prompt construction,
//! generation client, response normalization, task post-processing, and the
//! service layer that persists finished plans.

pub mod generate;
pub mod intake;
pub mod prompt;
pub mod response;
pub mod retry;
pub mod service;
pub mod task;

pub use generate::{GenerateError, Generator, GeneratorConfig, OpenAiGenerator};
pub use intake::{AssetIntake, IntakeError, parse_intake_toml};
pub use prompt::{SYSTEM_PROMPT, build_prompt};
pub use response::{Instructions, NormalizeError, RawTask, normalize, strip_code_fences};
pub use retry::{RetryConfig, retry_if};
pub use service::{GenerationResult, PlanError, PlanOutcome, create_plan, generate_tasks};
pub use task::{MaintenanceTask, post_process};
