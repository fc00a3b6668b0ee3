//! Pipeline Tests
//!
//! Tests for:
//! - A. Full run over a temp corpus writes reports
//! - B. Disabled phases are skipped and write nothing
//! - C. Failing integration command is non-critical
//! - D. Critical setup failure returns the partial state

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corpus_validator::aggregator::Priority;
use corpus_validator::config::{CommandSpec, PipelineConfig};
use corpus_validator::orchestrator::{Delay, OrchestrationError};
use corpus_validator::pipeline::{Pipeline, PipelineError, REPORTING, SETUP, VALIDATION};
use corpus_validator::report::ReportFormat;
use tempfile::TempDir;

// Test utilities

struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

fn sample_corpus(root: &Path) {
    write(root, "README.md", "# Project\n\nSee [guide](docs/guide.md).\n");
    write(
        root,
        "docs/guide.md",
        "---\nname: guide\ndescription: how to\n---\n# Guide\n\nTODO: expand\n",
    );
    write(root, "docs/orphan.md", "orphan text without a heading\n");
    write(root, "config/settings.json", "{\"ok\": true}");
    write(root, "scripts/run.sh", "#!/bin/sh\necho run\n");
}

fn pipeline(root: &Path, config: PipelineConfig) -> Pipeline {
    Pipeline::new(root, config)
        .expect("valid config")
        .with_delay(Arc::new(NoDelay))
        .with_session_id("20260101T000000-test0001")
}

// ===== A. Full run =====

#[tokio::test]
async fn test_full_run_writes_reports() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    sample_corpus(root);

    let outcome = pipeline(root, PipelineConfig::default())
        .run()
        .await
        .expect("pipeline should complete");

    assert_eq!(
        outcome.state.completed_phases,
        vec!["setup", "validation", "integration", "reporting"]
    );
    assert_eq!(outcome.report.metrics.total_artifacts, 5);
    assert!(outcome.has_failures());

    let top = &outcome.report.recommendations[0];
    assert_eq!(top.priority, Priority::High);
    assert_eq!(top.issue_text, "Missing title");

    let session_dir = root.join("reports").join("20260101T000000-test0001");
    assert_eq!(
        outcome.report_paths,
        vec![session_dir.join("report.json"), session_dir.join("report.md")]
    );
    let json = fs::read_to_string(session_dir.join("report.json")).expect("Failed to read report");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(parsed["session_id"], "20260101T000000-test0001");
    assert_eq!(parsed["orchestration_state"]["completed_phases"][0], "setup");
}

#[tokio::test]
async fn test_report_directory_is_not_rediscovered() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    sample_corpus(root);

    let first = pipeline(root, PipelineConfig::default()).run().await.expect("first run");
    let second = pipeline(root, PipelineConfig::default()).run().await.expect("second run");

    assert_eq!(
        first.report.metrics.total_artifacts,
        second.report.metrics.total_artifacts
    );
    assert_eq!(first.report.run_log.len(), second.report.run_log.len());
}

// ===== B. Phase selection =====

#[tokio::test]
async fn test_disabled_reporting_writes_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    sample_corpus(root);

    let mut config = PipelineConfig::default();
    config.phases.enabled = vec![SETUP.to_string(), VALIDATION.to_string()];

    let outcome = pipeline(root, config).run().await.expect("pipeline should complete");

    assert_eq!(outcome.state.skipped_phases, vec!["integration", REPORTING]);
    assert!(outcome.report_paths.is_empty());
    assert!(!root.join("reports").exists());
    // Recommendations are still computed for the caller
    assert!(!outcome.report.recommendations.is_empty());
}

#[tokio::test]
async fn test_markdown_only_format() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    write(root, "ok.md", "# Fine\n\nContent.\n");

    let mut config = PipelineConfig::default();
    config.report.formats = vec![ReportFormat::Markdown];

    let outcome = pipeline(root, config).run().await.expect("pipeline should complete");

    assert!(!outcome.has_failures());
    assert_eq!(outcome.report_paths.len(), 1);
    let markdown = fs::read_to_string(&outcome.report_paths[0]).expect("Failed to read report");
    assert!(markdown.contains("No issues found."));
}

// ===== C. Integration commands =====

#[cfg(unix)]
#[tokio::test]
async fn test_failing_command_is_retried_then_recorded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    write(root, "ok.md", "# Fine\n\nContent.\n");

    let mut config = PipelineConfig::default();
    config.orchestrator.retry_attempts = 1;
    config.integration.commands = vec![
        CommandSpec {
            name: "passes".to_string(),
            program: "true".to_string(),
            args: vec![],
        },
        CommandSpec {
            name: "fails".to_string(),
            program: "false".to_string(),
            args: vec![],
        },
    ];

    let outcome = pipeline(root, config).run().await.expect("non-critical failure");

    assert_eq!(outcome.state.failed_phases, vec!["integration"]);
    assert_eq!(outcome.state.completed_phases, vec!["setup", "validation", "reporting"]);
    let integration = outcome.state.outcome("integration").expect("recorded");
    assert_eq!(integration.attempts, 2);
    assert!(integration.error.as_deref().unwrap_or_default().contains("fails"));
    assert_eq!(outcome.command_results.len(), 2);
    assert!(outcome.command_results[0].success());
    assert!(outcome.has_failures());
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_timeout() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    write(root, "ok.md", "# Fine\n\nContent.\n");

    let mut config = PipelineConfig::default();
    config.orchestrator.retry_attempts = 0;
    config.integration.command_timeout_ms = 100;
    config.integration.commands = vec![CommandSpec {
        name: "sleepy".to_string(),
        program: "sleep".to_string(),
        args: vec!["5".to_string()],
    }];

    let outcome = pipeline(root, config).run().await.expect("non-critical failure");

    assert!(outcome.command_results[0].timed_out);
    let error = outcome
        .state
        .outcome("integration")
        .and_then(|o| o.error.clone())
        .unwrap_or_default();
    assert!(error.contains("timed out"));
}

// ===== D. Critical failure =====

#[tokio::test]
async fn test_invalid_pattern_aborts_at_setup() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let mut config = PipelineConfig::default();
    config.orchestrator.retry_attempts = 2;
    config.discovery.exclude = vec!["[".to_string()];

    let err = pipeline(root, config).run().await.expect_err("setup is critical");

    match err {
        PipelineError::Orchestration(OrchestrationError::CriticalPhaseFailed {
            phase_id,
            state,
            ..
        }) => {
            assert_eq!(phase_id, SETUP);
            assert_eq!(state.failed_phases, vec![SETUP]);
            assert_eq!(state.outcome(SETUP).map(|o| o.attempts), Some(3));
            assert!(state.completed_phases.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}
