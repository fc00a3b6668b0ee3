//! Retry policy and the per-phase transition function
//!
//! `RetryPolicy::advance` is pure: given the current state and the result
//! of one attempt it returns the next state and, when another attempt is
//! due, the backoff to wait first. The orchestrator owns the waiting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Per-phase execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PhaseState {
    Pending,
    Running { retry_count: u32 },
    Succeeded { retry_count: u32 },
    FailedAfterRetries { retry_count: u32 },
    Skipped,
}

impl PhaseState {
    /// Leave `Pending`: enabled phases start running, others are skipped
    pub fn start(enabled: bool) -> Self {
        if enabled {
            PhaseState::Running { retry_count: 0 }
        } else {
            PhaseState::Skipped
        }
    }

    /// Failed attempts consumed so far
    pub fn retry_count(&self) -> u32 {
        match self {
            PhaseState::Running { retry_count }
            | PhaseState::Succeeded { retry_count }
            | PhaseState::FailedAfterRetries { retry_count } => *retry_count,
            PhaseState::Pending | PhaseState::Skipped => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PhaseState::Succeeded { .. } | PhaseState::FailedAfterRetries { .. } | PhaseState::Skipped
        )
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseState::Pending => write!(f, "PENDING"),
            PhaseState::Running { .. } => write!(f, "RUNNING"),
            PhaseState::Succeeded { .. } => write!(f, "SUCCEEDED"),
            PhaseState::FailedAfterRetries { .. } => write!(f, "FAILED_AFTER_RETRIES"),
            PhaseState::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Result of one implementation invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Succeeded,
    Failed,
    /// The phase's cumulative time budget ran out
    TimedOut,
}

/// Outcome of applying one attempt result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Invoke the implementation again after `delay`
    Retry { state: PhaseState, delay: Duration },
    /// The phase reached a terminal state
    Finished(PhaseState),
}

/// Retry configuration for phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt
    pub retry_attempts: u32,
    /// Backoff unit; the n-th retry waits `base_delay * n`
    pub base_delay: Duration,
    /// Cumulative wall-time budget per phase, retries included
    pub phase_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            base_delay: Duration::from_millis(1000),
            phase_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_attempts: u32, base_delay: Duration) -> Self {
        Self {
            retry_attempts,
            base_delay,
            phase_timeout: None,
        }
    }

    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = Some(timeout);
        self
    }

    /// Linear backoff keyed by retry number (1-based)
    pub fn backoff_for(&self, retry_count: u32) -> Duration {
        self.base_delay.saturating_mul(retry_count)
    }

    /// Time left in the phase budget, or None when unbounded
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.phase_timeout.map(|t| t.saturating_sub(elapsed))
    }

    /// Whether `elapsed` has used up the phase budget
    pub fn budget_exceeded(&self, elapsed: Duration) -> bool {
        self.phase_timeout.is_some_and(|t| elapsed >= t)
    }

    /// Apply one attempt result to a running phase
    ///
    /// Non-running states are returned unchanged as finished.
    pub fn advance(&self, state: PhaseState, attempt: AttemptResult) -> Transition {
        let PhaseState::Running { retry_count } = state else {
            return Transition::Finished(state);
        };

        match attempt {
            AttemptResult::Succeeded => Transition::Finished(PhaseState::Succeeded { retry_count }),
            AttemptResult::TimedOut => Transition::Finished(PhaseState::FailedAfterRetries {
                retry_count: retry_count + 1,
            }),
            AttemptResult::Failed => {
                let retry_count = retry_count + 1;
                if retry_count <= self.retry_attempts {
                    Transition::Retry {
                        state: PhaseState::Running { retry_count },
                        delay: self.backoff_for(retry_count),
                    }
                } else {
                    Transition::Finished(PhaseState::FailedAfterRetries { retry_count })
                }
            }
        }
    }
}

/// Backoff wait, injectable so tests run without real delays
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
