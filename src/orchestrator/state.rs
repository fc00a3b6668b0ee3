//! OrchestrationState: the record of one orchestration run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::phase::PhaseValue;

/// Result of one phase, created when the phase finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PhaseValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Failed attempts consumed
    pub retry_count: u32,
    /// Total implementation invocations
    pub attempts: u32,
}

impl PhaseOutcome {
    pub fn succeeded(phase_id: &str, value: PhaseValue, duration_ms: u64, retry_count: u32) -> Self {
        Self {
            phase_id: phase_id.to_string(),
            success: true,
            result: Some(value),
            error: None,
            duration_ms,
            retry_count,
            attempts: retry_count + 1,
        }
    }

    pub fn failed(
        phase_id: &str,
        error: impl Into<String>,
        duration_ms: u64,
        retry_count: u32,
        attempts: u32,
    ) -> Self {
        Self {
            phase_id: phase_id.to_string(),
            success: false,
            result: None,
            error: Some(error.into()),
            duration_ms,
            retry_count,
            attempts,
        }
    }
}

/// Progress and outcomes of one orchestration run
///
/// Only the orchestrator's execution loop mutates this; callers get it back
/// by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationState {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed_phases: Vec<String>,
    pub failed_phases: Vec<String>,
    pub skipped_phases: Vec<String>,
    pub outcomes_by_phase: BTreeMap<String, PhaseOutcome>,
    /// Phase id → duration in milliseconds
    pub metrics: BTreeMap<String, u64>,
    /// Finished phase ids in execution order
    pub execution_order: Vec<String>,
}

impl OrchestrationState {
    pub(crate) fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            start_time: Utc::now(),
            end_time: None,
            completed_phases: Vec::new(),
            failed_phases: Vec::new(),
            skipped_phases: Vec::new(),
            outcomes_by_phase: BTreeMap::new(),
            metrics: BTreeMap::new(),
            execution_order: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: PhaseOutcome) {
        let id = outcome.phase_id.clone();
        if outcome.success {
            self.completed_phases.push(id.clone());
        } else {
            self.failed_phases.push(id.clone());
        }
        self.metrics.insert(id.clone(), outcome.duration_ms);
        self.execution_order.push(id.clone());
        self.outcomes_by_phase.insert(id, outcome);
    }

    pub(crate) fn skip(&mut self, phase_id: &str) {
        self.skipped_phases.push(phase_id.to_string());
    }

    pub(crate) fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn outcome(&self, phase_id: &str) -> Option<&PhaseOutcome> {
        self.outcomes_by_phase.get(phase_id)
    }

    /// Outcomes in execution order
    pub fn outcomes(&self) -> impl Iterator<Item = &PhaseOutcome> {
        self.execution_order
            .iter()
            .filter_map(|id| self.outcomes_by_phase.get(id))
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_phases.is_empty()
    }

    /// Wall time of the run, once finished
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds().max(0) as u64)
    }
}

/// Timestamp plus random suffix, e.g. `20260118T093000-1a2b3c4d`
pub fn generate_session_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), &suffix[..8])
}
