//! Orchestrator errors

use super::state::OrchestrationState;

/// Orchestrator errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// A critical phase exhausted its retries; carries the state up to the abort
    #[error("Critical phase '{phase_id}' failed after retries: {last_error}")]
    CriticalPhaseFailed {
        phase_id: String,
        last_error: String,
        state: Box<OrchestrationState>,
    },

    #[error("No implementation registered for enabled phase '{0}'")]
    MissingImplementation(String),

    #[error("Duplicate phase id: '{0}'")]
    DuplicatePhase(String),
}

impl OrchestrationError {
    /// State recorded before the abort, if any phase ran
    pub fn partial_state(&self) -> Option<&OrchestrationState> {
        match self {
            OrchestrationError::CriticalPhaseFailed { state, .. } => Some(state),
            _ => None,
        }
    }

    /// Take ownership of the partial state
    pub fn into_partial_state(self) -> Option<OrchestrationState> {
        match self {
            OrchestrationError::CriticalPhaseFailed { state, .. } => Some(*state),
            _ => None,
        }
    }
}
