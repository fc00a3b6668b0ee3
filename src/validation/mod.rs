//! Validation engine: runs rule categories over an artifact set
//!
//! Checks are isolated from each other: a check that errors or panics
//! contributes one error finding and the run continues.

mod check;
mod engine;
mod result;

pub use check::{Category, Check, CheckError};
pub use engine::{EngineConfig, EngineRun, ValidationEngine};
pub(crate) use engine::panic_message;
pub use result::{CategoryRunRecord, Detail, Metrics, Severity, ValidationResult};
