//! CLI dispatch
//!
//! Resolves the root, loads and overrides configuration, runs the pipeline
//! and maps the outcome to an exit code.

use tracing::error;

use crate::cli::{Args, Error, Result, EXIT_FAILURE, EXIT_SUCCESS};
use crate::config::{resolve_root, PipelineConfig};
use crate::pipeline::{Pipeline, PipelineError, PipelineOutcome};

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Run the pipeline for parsed arguments and return the exit code
pub async fn run_cli(args: Args) -> ExitCode {
    match run(args).await {
        Ok(outcome) => {
            print_summary(&outcome);
            if outcome.has_failures() {
                EXIT_FAILURE
            } else {
                EXIT_SUCCESS
            }
        }
        Err(e) => {
            if let Error::Pipeline(PipelineError::Orchestration(err)) = &e {
                if let Some(state) = err.partial_state() {
                    error!(session = %state.session_id, "run aborted");
                    let completed = if state.completed_phases.is_empty() {
                        "none".to_string()
                    } else {
                        state.completed_phases.join(", ")
                    };
                    eprintln!("Completed before abort: {}", completed);
                }
            }
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

async fn run(args: Args) -> Result<PipelineOutcome> {
    let root = resolve_root(args.root.clone())?;
    let mut config = PipelineConfig::load_for_root(&root, args.config.as_deref())?;
    apply_overrides(&args, &mut config)?;

    let pipeline = Pipeline::new(root, config)?;
    Ok(pipeline.run().await?)
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(args: &Args, config: &mut PipelineConfig) -> Result<()> {
    if let Some(ref phases) = args.phases {
        let phases: Vec<String> = phases
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if phases.is_empty() {
            return Err(Error::InvalidArgs("--phases must name at least one phase".to_string()));
        }
        config.phases.enabled = phases;
    }
    if let Some(retry_attempts) = args.retry_attempts {
        config.orchestrator.retry_attempts = retry_attempts;
    }
    if let Some(top_n) = args.top_n {
        config.report.top_n = top_n;
    }
    if let Some(ref formats) = args.format {
        config.report.formats = formats.clone();
    }
    if let Some(ref output_dir) = args.output_dir {
        config.report.output_dir = output_dir.clone();
    }
    Ok(())
}

fn print_summary(outcome: &PipelineOutcome) {
    let metrics = &outcome.report.metrics;
    let state = &outcome.state;

    println!("Session: {}", state.session_id);
    println!(
        "Artifacts: {}  Passed: {}  Warnings: {}  Errors: {}",
        metrics.total_artifacts, metrics.passed, metrics.warnings, metrics.errors
    );
    println!(
        "Phases: {} completed, {} failed, {} skipped",
        state.completed_phases.len(),
        state.failed_phases.len(),
        state.skipped_phases.len()
    );
    for outcome in state.outcomes().filter(|o| !o.success) {
        println!(
            "  {} failed: {}",
            outcome.phase_id,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    for rec in &outcome.report.recommendations {
        println!(
            "  [{}] {} x{}: {}",
            rec.priority, rec.issue_text, rec.occurrence_count, rec.suggested_action
        );
    }
    for path in &outcome.report_paths {
        println!("Report: {}", path.display());
    }
}
