//! Pipeline-owned state shared between phase implementations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::aggregator::Recommendation;
use crate::artifacts::Artifact;
use crate::validation::EngineRun;

/// Result of one integration command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub name: String,
    /// None when the command was killed on timeout
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u64,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Values phases hand to later phases
///
/// Each field is written by exactly one phase.
#[derive(Debug, Default)]
pub struct PipelineContext {
    pub(crate) artifacts: RwLock<Vec<Artifact>>,
    pub(crate) engine_run: RwLock<Option<EngineRun>>,
    pub(crate) command_results: RwLock<Vec<CommandResult>>,
    pub(crate) recommendations: RwLock<Option<Vec<Recommendation>>>,
    pub(crate) report_dir: RwLock<Option<PathBuf>>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.read().await.clone()
    }

    pub async fn engine_run(&self) -> Option<EngineRun> {
        self.engine_run.read().await.clone()
    }

    pub async fn command_results(&self) -> Vec<CommandResult> {
        self.command_results.read().await.clone()
    }

    pub async fn recommendations(&self) -> Option<Vec<Recommendation>> {
        self.recommendations.read().await.clone()
    }

    /// Directory prepared by the reporting phase, if it ran
    pub async fn report_dir(&self) -> Option<PathBuf> {
        self.report_dir.read().await.clone()
    }
}
