//! Phase orchestrator: sequences coarse units of work
//!
//! Executes enabled phases in priority order, retries failed attempts with
//! linear backoff, and aborts the run when a critical phase exhausts its
//! retries.
//!
//! # Phase State Machine
//!
//! ```text
//!   PENDING ──(not enabled)──▶ SKIPPED
//!      │
//!   (reached)
//!      ▼
//!   RUNNING ──(success)──▶ SUCCEEDED
//!      │  ▲
//!  (failure, retries left)
//!      └──┘ wait base_delay * retry_count
//!      │
//!  (failure, exhausted | timeout)
//!      ▼
//!   FAILED_AFTER_RETRIES ──(critical)──▶ run aborted
//! ```

mod errors;
mod phase;
mod retry;
mod runner;
mod state;

pub use errors::OrchestrationError;
pub use phase::{Phase, PhaseImplementation, PhaseImplementations, PhaseValue};
pub use retry::{AttemptResult, Delay, PhaseState, RetryPolicy, TokioDelay, Transition};
pub use runner::{OrchestratorConfig, PhaseOrchestrator};
pub use state::{generate_session_id, OrchestrationState, PhaseOutcome};
