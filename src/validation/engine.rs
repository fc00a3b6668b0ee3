//! ValidationEngine: runs categories of checks and accumulates metrics

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::check::{Category, Check, CheckError};
use super::result::{CategoryRunRecord, Detail, Metrics, ValidationResult};
use crate::artifacts::{Artifact, ArtifactReader};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Checks of one category allowed in flight at once (1 = sequential)
    pub max_concurrent_checks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: 1,
        }
    }
}

/// Output of one validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineRun {
    pub metrics: Metrics,
    pub run_log: Vec<CategoryRunRecord>,
}

impl EngineRun {
    /// All findings in run-log order
    pub fn details(&self) -> Vec<Detail> {
        self.run_log
            .iter()
            .flat_map(|record| record.result.details.iter().cloned())
            .collect()
    }

    /// Records for one category, in check order
    pub fn records_for_category<'a>(
        &'a self,
        category_id: &'a str,
    ) -> impl Iterator<Item = &'a CategoryRunRecord> + 'a {
        self.run_log
            .iter()
            .filter(move |r| r.category_id == category_id)
    }
}

/// Validation engine
///
/// Holds no per-run state: every `run` starts from a fresh `Metrics`
/// accumulator and returns it together with the run log. Totals are not
/// carried across runs of the same engine; callers that want cumulative
/// numbers sum the returned `Metrics` or `tally` a combined run log.
pub struct ValidationEngine {
    reader: Arc<dyn ArtifactReader>,
    config: EngineConfig,
}

impl ValidationEngine {
    /// Create engine with default configuration
    pub fn new(reader: Arc<dyn ArtifactReader>) -> Self {
        Self::with_config(reader, EngineConfig::default())
    }

    /// Create engine with custom configuration
    pub fn with_config(reader: Arc<dyn ArtifactReader>, config: EngineConfig) -> Self {
        Self { reader, config }
    }

    /// Run every category over the artifact set
    ///
    /// Categories run in the order supplied, checks in declaration order.
    /// Records are appended in (category, check) order even when checks of a
    /// category run concurrently.
    pub async fn run(&self, categories: &[Category], artifacts: &[Artifact]) -> EngineRun {
        let start = Instant::now();
        let mut metrics = Metrics::for_artifacts(artifacts.len());
        let mut run_log = Vec::new();
        let concurrency = self.config.max_concurrent_checks.max(1);

        info!(
            categories = categories.len(),
            artifacts = artifacts.len(),
            concurrency,
            "validation run started"
        );

        for category in categories {
            debug!(category = %category.id, checks = category.checks.len(), "running category");

            let pending: Vec<_> = category
                .checks
                .iter()
                .map(|check| {
                    let check = Arc::clone(check);
                    let reader = Arc::clone(&self.reader);
                    async move {
                        let result = run_isolated(check.as_ref(), artifacts, reader.as_ref()).await;
                        (check.id().to_string(), result)
                    }
                })
                .collect();

            let results: Vec<(String, ValidationResult)> = stream::iter(pending)
                .buffered(concurrency)
                .collect()
                .await;

            for (check_id, result) in results {
                metrics.absorb(&result);
                debug!(
                    category = %category.id,
                    check = %check_id,
                    passed = result.passed,
                    warnings = result.warnings,
                    errors = result.errors,
                    "check completed"
                );
                run_log.push(CategoryRunRecord {
                    category_id: category.id.clone(),
                    check_id,
                    result,
                    timestamp: Utc::now(),
                });
            }
        }

        info!(
            passed = metrics.passed,
            warnings = metrics.warnings,
            errors = metrics.errors,
            duration_ms = start.elapsed().as_millis() as u64,
            "validation run finished"
        );

        EngineRun { metrics, run_log }
    }
}

/// Run one check, converting an error or panic into a failure result
async fn run_isolated(
    check: &dyn Check,
    artifacts: &[Artifact],
    reader: &dyn ArtifactReader,
) -> ValidationResult {
    let outcome = AssertUnwindSafe(check.run(artifacts, reader))
        .catch_unwind()
        .await;

    let error = match outcome {
        Ok(Ok(result)) => return result,
        Ok(Err(err)) => err,
        Err(payload) => CheckError::Panicked(panic_message(payload.as_ref())),
    };

    warn!(check = %check.id(), error = %error, "check failed; isolating");
    ValidationResult::check_failure(check.id(), error.to_string())
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
