//! Pipeline configuration
//!
//! Loaded from TOML (`--config <file>` or `corpus-validator.toml` in the
//! corpus root). Every field has a default, so an empty file is valid.
//!
//! ```toml
//! [discovery]
//! include = ["**/*.md", "**/*.json"]
//!
//! [orchestrator]
//! retry_attempts = 2
//! base_delay_ms = 1000
//!
//! [report]
//! top_n = 5
//! formats = ["json", "markdown"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::checks::CheckSettings;
use crate::orchestrator::OrchestratorConfig;
use crate::pipeline::KNOWN_PHASES;
use crate::report::ReportFormat;
use crate::validation::EngineConfig;

/// Config file looked up in the corpus root
pub const DEFAULT_CONFIG_FILE: &str = "corpus-validator.toml";

/// Environment variable naming the corpus root
pub const ROOT_ENV_VAR: &str = "CORPUS_VALIDATOR_ROOT";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Root directory '{0}' does not exist")]
    RootNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Which files make up the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Globs relative to the root
    pub include: Vec<String>,
    /// Globs matched against paths relative to the root
    pub exclude: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            include: ["**/*.md", "**/*.markdown", "**/*.json", "**/*.sh", "**/*.bash"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude: [".git/**", "**/node_modules/**", "target/**", "reports/**"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Phase selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasesConfig {
    /// Phases to run; the rest are skipped
    pub enabled: Vec<String>,
    /// Phases whose exhaustion aborts the run
    pub critical: Vec<String>,
}

impl Default for PhasesConfig {
    fn default() -> Self {
        Self {
            enabled: KNOWN_PHASES.iter().map(|s| s.to_string()).collect(),
            critical: vec!["setup".to_string(), "validation".to_string()],
        }
    }
}

/// One external command run by the integration phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Integration phase settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Commands run from the corpus root, in order
    pub commands: Vec<CommandSpec>,
    /// Per-command timeout
    pub command_timeout_ms: u64,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            command_timeout_ms: 30_000, // 30 seconds
        }
    }
}

/// Reporting phase settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Recommendations kept per priority tier
    pub top_n: usize,
    pub formats: Vec<ReportFormat>,
    /// Relative paths resolve against the corpus root
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: crate::aggregator::DEFAULT_TOP_N,
            formats: vec![ReportFormat::Json, ReportFormat::Markdown],
            output_dir: PathBuf::from("reports"),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub discovery: DiscoveryConfig,
    pub checks: CheckSettings,
    pub engine: EngineConfig,
    pub orchestrator: OrchestratorConfig,
    pub phases: PhasesConfig,
    pub integration: IntegrationConfig,
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load a config file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content, &path.display().to_string())?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Explicit file, else `corpus-validator.toml` in `root`, else defaults
    pub fn load_for_root(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = root.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }

        debug!(root = %root.display(), "no config file, using defaults");
        Ok(Self::default())
    }

    /// Check value ranges and phase ids
    pub fn validate(&self) -> Result<()> {
        if self.orchestrator.base_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.base_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.orchestrator.phase_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "orchestrator.phase_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.report.top_n == 0 {
            return Err(ConfigError::Invalid(
                "report.top_n must be greater than 0".to_string(),
            ));
        }
        if self.engine.max_concurrent_checks == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_concurrent_checks must be greater than 0".to_string(),
            ));
        }
        if self.integration.command_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "integration.command_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.discovery.include.is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.include must list at least one pattern".to_string(),
            ));
        }

        for id in self.phases.enabled.iter().chain(&self.phases.critical) {
            if !KNOWN_PHASES.contains(&id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown phase '{}' (known: {})",
                    id,
                    KNOWN_PHASES.join(", ")
                )));
            }
        }

        Ok(())
    }
}

/// Resolve the corpus root: flag, then `CORPUS_VALIDATOR_ROOT`, then `.`
pub fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    resolve_root_from(explicit, std::env::var(ROOT_ENV_VAR).ok())
}

fn resolve_root_from(explicit: Option<PathBuf>, env_root: Option<String>) -> Result<PathBuf> {
    let root = explicit
        .or_else(|| env_root.filter(|s| !s.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    if !root.is_dir() {
        return Err(ConfigError::RootNotFound(root.display().to_string()));
    }
    Ok(root)
}
