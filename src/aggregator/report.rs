//! AggregatedReport: everything a report emitter needs from one run

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::recommend::{recommend, AggregationError, Recommendation};
use crate::orchestrator::OrchestrationState;
use crate::validation::{CategoryRunRecord, EngineRun, Metrics};

/// Per-category totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFindings {
    pub checks: usize,
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Headline numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub success_rate: f64,
    pub findings_by_category: BTreeMap<String, CategoryFindings>,
    /// `category/check` ids that reported at least one error
    pub failed_checks: Vec<String>,
    /// Phases that ran to a terminal outcome
    pub phase_count: usize,
}

impl Summary {
    fn build(metrics: &Metrics, run_log: &[CategoryRunRecord], state: &OrchestrationState) -> Self {
        let mut findings_by_category: BTreeMap<String, CategoryFindings> = BTreeMap::new();
        let mut failed_checks = Vec::new();
        let mut seen = HashSet::new();

        for record in run_log {
            let entry = findings_by_category
                .entry(record.category_id.clone())
                .or_default();
            entry.checks += 1;
            entry.passed += record.result.passed;
            entry.warnings += record.result.warnings;
            entry.errors += record.result.errors;

            let id = format!("{}/{}", record.category_id, record.check_id);
            if record.result.has_errors() && seen.insert(id.clone()) {
                failed_checks.push(id);
            }
        }

        Self {
            success_rate: metrics.success_rate(),
            findings_by_category,
            failed_checks,
            phase_count: state.execution_order.len(),
        }
    }
}

/// Combined output of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub session_id: String,
    pub metrics: Metrics,
    pub run_log: Vec<CategoryRunRecord>,
    pub orchestration_state: OrchestrationState,
    pub recommendations: Vec<Recommendation>,
    pub summary: Summary,
}

impl AggregatedReport {
    /// Bundle an engine run and orchestration state, ranking recommendations
    pub fn build(
        engine_run: &EngineRun,
        state: &OrchestrationState,
        top_n: usize,
    ) -> Result<Self, AggregationError> {
        let recommendations = recommend(&engine_run.details(), top_n)?;
        Ok(Self::assemble(engine_run, state, recommendations))
    }

    /// Bundle with recommendations that were already ranked
    pub fn assemble(
        engine_run: &EngineRun,
        state: &OrchestrationState,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        let summary = Summary::build(&engine_run.metrics, &engine_run.run_log, state);
        Self {
            session_id: state.session_id.clone(),
            metrics: engine_run.metrics,
            run_log: engine_run.run_log.clone(),
            orchestration_state: state.clone(),
            recommendations,
            summary,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.metrics.errors > 0
    }
}
