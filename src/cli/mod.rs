//! CLI module
//!
//! Provides:
//! - Argument parsing (clap derive)
//! - Corpus root resolution (flag → env → cwd)
//! - Config overrides and pipeline dispatch with deterministic exit codes

pub mod args;
pub mod dispatch;

// Re-exports
pub use args::Args;
pub use dispatch::{apply_overrides, run_cli, ExitCode};

use crate::config::ConfigError;
use crate::pipeline::PipelineError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl Error {
    /// Exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::InvalidArgs(_) | Error::Config(_) => EXIT_CONFIG_ERROR,
            Error::Pipeline(PipelineError::Orchestration(_)) => EXIT_CONFIG_ERROR,
            Error::Pipeline(_) => EXIT_FAILURE,
        }
    }
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
/// Error findings or a failed non-critical phase
pub const EXIT_FAILURE: i32 = 1;
/// Bad configuration or a critical phase failure
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;
