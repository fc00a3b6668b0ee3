//! Pipeline: the default phases wired to the engine, aggregator and reports
//!
//! | phase | priority | critical by default |
//! |---|---|---|
//! | setup | 10 | yes |
//! | validation | 20 | yes |
//! | integration | 30 | no |
//! | reporting | 40 | no |

mod context;
mod phases;

pub use context::{CommandResult, PipelineContext};
pub use phases::{IntegrationPhase, ReportingPhase, SetupPhase, ValidationPhase};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::aggregator::{AggregatedReport, AggregationError};
use crate::artifacts::{ArtifactReader, FsArtifactReader};
use crate::checks::default_categories_for;
use crate::config::{ConfigError, PipelineConfig};
use crate::orchestrator::{
    generate_session_id, Delay, OrchestrationError, OrchestrationState, Phase,
    PhaseImplementations, PhaseOrchestrator, TokioDelay,
};
use crate::report::{write_reports, ReportError};
use crate::validation::{EngineRun, ValidationEngine};

pub const SETUP: &str = "setup";
pub const VALIDATION: &str = "validation";
pub const INTEGRATION: &str = "integration";
pub const REPORTING: &str = "reporting";

/// Phase ids the pipeline knows how to run
pub const KNOWN_PHASES: [&str; 4] = [SETUP, VALIDATION, INTEGRATION, REPORTING];

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Phase descriptors with criticality taken from `critical`
pub fn default_phases(critical: &[String]) -> Vec<Phase> {
    let is_critical = |id: &str| critical.iter().any(|c| c == id);
    vec![
        Phase::new(SETUP, "Setup", 10).with_critical(is_critical(SETUP)),
        Phase::new(VALIDATION, "Validation", 20).with_critical(is_critical(VALIDATION)),
        Phase::new(INTEGRATION, "Integration", 30).with_critical(is_critical(INTEGRATION)),
        Phase::new(REPORTING, "Reporting", 40).with_critical(is_critical(REPORTING)),
    ]
}

/// Result of a pipeline run that did not hit a critical failure
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub state: OrchestrationState,
    pub engine_run: EngineRun,
    pub report: AggregatedReport,
    pub command_results: Vec<CommandResult>,
    /// Report files written, empty when reporting did not complete
    pub report_paths: Vec<PathBuf>,
}

impl PipelineOutcome {
    /// Any error finding or failed phase
    pub fn has_failures(&self) -> bool {
        self.state.has_failures() || self.report.has_errors()
    }
}

/// One configured validation run over a corpus root
pub struct Pipeline {
    root: PathBuf,
    config: PipelineConfig,
    reader: Arc<dyn ArtifactReader>,
    delay: Arc<dyn Delay>,
    session_id: Option<String>,
}

impl Pipeline {
    /// Create pipeline after validating the configuration
    pub fn new(root: impl Into<PathBuf>, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            root: root.into(),
            config,
            reader: Arc::new(FsArtifactReader),
            delay: Arc::new(TokioDelay),
            session_id: None,
        })
    }

    /// Read artifact content through a custom reader
    pub fn with_reader(mut self, reader: Arc<dyn ArtifactReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Replace the retry backoff wait
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    /// Use a fixed session id instead of generating one
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn phases(&self) -> Vec<Phase> {
        default_phases(&self.config.phases.critical)
    }

    fn enabled(&self) -> HashSet<String> {
        self.config.phases.enabled.iter().cloned().collect()
    }

    /// Report output directory, relative paths resolved against the root
    pub fn output_dir(&self) -> PathBuf {
        if self.config.report.output_dir.is_absolute() {
            self.config.report.output_dir.clone()
        } else {
            self.root.join(&self.config.report.output_dir)
        }
    }

    fn implementations(&self, context: &Arc<PipelineContext>, session_id: &str) -> PhaseImplementations {
        let engine = ValidationEngine::with_config(Arc::clone(&self.reader), self.config.engine.clone());

        PhaseImplementations::new()
            .register(
                SETUP,
                SetupPhase {
                    root: self.root.clone(),
                    discovery: self.config.discovery.clone(),
                    context: Arc::clone(context),
                },
            )
            .register(
                VALIDATION,
                ValidationPhase {
                    engine,
                    categories: default_categories_for(&self.root, &self.config.checks),
                    context: Arc::clone(context),
                },
            )
            .register(
                INTEGRATION,
                IntegrationPhase {
                    root: self.root.clone(),
                    commands: self.config.integration.commands.clone(),
                    command_timeout: Duration::from_millis(self.config.integration.command_timeout_ms),
                    context: Arc::clone(context),
                },
            )
            .register(
                REPORTING,
                ReportingPhase {
                    top_n: self.config.report.top_n,
                    session_dir: self.output_dir().join(session_id),
                    context: Arc::clone(context),
                },
            )
    }

    /// Run every enabled phase and assemble the aggregated report
    ///
    /// Report files are written only when the reporting phase completed.
    /// A critical phase failure returns the orchestration error, which
    /// carries the partial state.
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let session_id = self.session_id.clone().unwrap_or_else(generate_session_id);
        let context = Arc::new(PipelineContext::new());
        let implementations = self.implementations(&context, &session_id);

        info!(root = %self.root.display(), session = %session_id, "pipeline started");

        let orchestrator =
            PhaseOrchestrator::with_delay(self.config.orchestrator.policy(), Arc::clone(&self.delay));
        let state = orchestrator
            .execute_in_session(session_id, &self.phases(), &self.enabled(), &implementations)
            .await?;

        let engine_run = context.engine_run().await.unwrap_or_default();
        let report = match context.recommendations().await {
            Some(recommendations) => AggregatedReport::assemble(&engine_run, &state, recommendations),
            None => AggregatedReport::build(&engine_run, &state, self.config.report.top_n)?,
        };

        let report_paths = if state.completed_phases.iter().any(|id| id == REPORTING) {
            write_reports(&report, &self.output_dir(), &self.config.report.formats).await?
        } else {
            Vec::new()
        };

        info!(
            session = %state.session_id,
            errors = report.metrics.errors,
            warnings = report.metrics.warnings,
            failed_phases = state.failed_phases.len(),
            "pipeline finished"
        );

        Ok(PipelineOutcome {
            state,
            engine_run,
            report,
            command_results: context.command_results().await,
            report_paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phases_follow_critical_list() {
        let phases = default_phases(&[SETUP.to_string(), REPORTING.to_string()]);
        let ids: Vec<&str> = phases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, KNOWN_PHASES.to_vec());
        let critical: Vec<bool> = phases.iter().map(|p| p.is_critical).collect();
        assert_eq!(critical, vec![true, false, false, true]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.report.top_n = 0;
        assert!(Pipeline::new(".", config).is_err());
    }

    #[test]
    fn test_output_dir_resolves_against_root() {
        let pipeline = Pipeline::new("/corpus", PipelineConfig::default()).expect("valid config");
        assert_eq!(pipeline.output_dir(), PathBuf::from("/corpus/reports"));
    }
}
