//! Default phase implementations

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::context::{CommandResult, PipelineContext};
use crate::aggregator::recommend;
use crate::artifacts::discover;
use crate::config::{CommandSpec, DiscoveryConfig};
use crate::orchestrator::{PhaseImplementation, PhaseValue};
use crate::validation::{Category, ValidationEngine};

/// Discovers the artifact set
pub struct SetupPhase {
    pub(crate) root: PathBuf,
    pub(crate) discovery: DiscoveryConfig,
    pub(crate) context: Arc<PipelineContext>,
}

#[async_trait]
impl PhaseImplementation for SetupPhase {
    async fn run(&self) -> anyhow::Result<PhaseValue> {
        let artifacts = discover(&self.root, &self.discovery.include, &self.discovery.exclude)
            .with_context(|| format!("discovery under {} failed", self.root.display()))?;

        if artifacts.is_empty() {
            warn!(root = %self.root.display(), "no artifacts matched the include patterns");
        }
        info!(artifacts = artifacts.len(), "artifacts discovered");

        let count = artifacts.len();
        *self.context.artifacts.write().await = artifacts;
        Ok(json!({ "artifacts": count }))
    }
}

/// Runs the validation engine over the discovered artifacts
pub struct ValidationPhase {
    pub(crate) engine: ValidationEngine,
    pub(crate) categories: Vec<Category>,
    pub(crate) context: Arc<PipelineContext>,
}

#[async_trait]
impl PhaseImplementation for ValidationPhase {
    async fn run(&self) -> anyhow::Result<PhaseValue> {
        let artifacts = self.context.artifacts().await;
        let engine_run = self.engine.run(&self.categories, &artifacts).await;
        let value = json!({
            "checks": engine_run.run_log.len(),
            "metrics": engine_run.metrics,
        });
        *self.context.engine_run.write().await = Some(engine_run);
        Ok(value)
    }
}

/// Runs configured external commands from the corpus root
pub struct IntegrationPhase {
    pub(crate) root: PathBuf,
    pub(crate) commands: Vec<CommandSpec>,
    pub(crate) command_timeout: Duration,
    pub(crate) context: Arc<PipelineContext>,
}

impl IntegrationPhase {
    async fn run_command(&self, command: &CommandSpec) -> anyhow::Result<CommandResult> {
        let start = Instant::now();
        let child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", command.program))?;

        let result = match tokio::time::timeout(self.command_timeout, child.wait_with_output()).await
        {
            Ok(output) => {
                let output = output.with_context(|| format!("failed to wait for '{}'", command.name))?;
                CommandResult {
                    name: command.name.clone(),
                    exit_code: output.status.code(),
                    timed_out: false,
                    duration_ms: start.elapsed().as_millis() as u64,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
            }
            // Dropping the future kills the child
            Err(_) => CommandResult {
                name: command.name.clone(),
                exit_code: None,
                timed_out: true,
                duration_ms: start.elapsed().as_millis() as u64,
                stderr: String::new(),
            },
        };
        Ok(result)
    }
}

#[async_trait]
impl PhaseImplementation for IntegrationPhase {
    async fn run(&self) -> anyhow::Result<PhaseValue> {
        let mut results = Vec::with_capacity(self.commands.len());
        for command in &self.commands {
            debug!(command = %command.name, program = %command.program, "running integration command");
            let result = self.run_command(command).await?;
            debug!(
                command = %result.name,
                exit_code = ?result.exit_code,
                timed_out = result.timed_out,
                duration_ms = result.duration_ms,
                "integration command finished"
            );
            results.push(result);
        }

        let failed: Vec<String> = results
            .iter()
            .filter(|r| !r.success())
            .map(|r| {
                if r.timed_out {
                    format!("{} (timed out after {}ms)", r.name, self.command_timeout.as_millis())
                } else {
                    format!("{} (exit code {:?})", r.name, r.exit_code)
                }
            })
            .collect();

        let value = json!({ "commands": results });
        *self.context.command_results.write().await = results;

        if !failed.is_empty() {
            bail!("integration commands failed: {}", failed.join(", "));
        }
        Ok(value)
    }
}

/// Ranks recommendations and prepares the session report directory
///
/// Report files are written by the pipeline once the orchestration state
/// is final.
pub struct ReportingPhase {
    pub(crate) top_n: usize,
    pub(crate) session_dir: PathBuf,
    pub(crate) context: Arc<PipelineContext>,
}

#[async_trait]
impl PhaseImplementation for ReportingPhase {
    async fn run(&self) -> anyhow::Result<PhaseValue> {
        let details = self
            .context
            .engine_run()
            .await
            .map(|run| run.details())
            .unwrap_or_default();

        let recommendations = recommend(&details, self.top_n)?;
        tokio::fs::create_dir_all(&self.session_dir)
            .await
            .with_context(|| format!("failed to create {}", self.session_dir.display()))?;

        let value = json!({
            "recommendations": recommendations.len(),
            "report_dir": self.session_dir.display().to_string(),
        });
        *self.context.recommendations.write().await = Some(recommendations);
        *self.context.report_dir.write().await = Some(self.session_dir.clone());
        Ok(value)
    }
}
