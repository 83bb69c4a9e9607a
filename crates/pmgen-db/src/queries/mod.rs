//! Query functions, one module per table.

pub mod intake_events;
pub mod plans;
pub mod tasks;
