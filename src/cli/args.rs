//! CLI argument parsing
//!
//! ```text
//! corpus-validator [--root <dir>] [--config <file>] [--phases a,b]
//!                  [--retry-attempts N] [--top-n N] [--format json,markdown]
//!                  [--output-dir <dir>] [--json-logs] [-v...]
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::report::ReportFormat;

/// Parsed CLI arguments
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "corpus-validator", version, about = "Validate a corpus of documents and scripts")]
pub struct Args {
    /// Corpus root (defaults to $CORPUS_VALIDATOR_ROOT, then the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Config file (defaults to corpus-validator.toml in the root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Phases to run, comma separated
    #[arg(long, value_delimiter = ',')]
    pub phases: Option<Vec<String>>,

    /// Retries after a phase's first failed attempt
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Recommendations kept per priority tier
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Report formats, comma separated (json, markdown)
    #[arg(long, value_delimiter = ',')]
    pub format: Option<Vec<ReportFormat>>,

    /// Report output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
