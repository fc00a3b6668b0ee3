//! Report emitter: renders an AggregatedReport and writes it to disk
//!
//! Reports land in `<dir>/<session_id>/report.<ext>`, one file per format.

mod markdown;

pub use markdown::render_markdown;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

use crate::aggregator::AggregatedReport;

/// Errors that can occur while emitting reports
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown report format: {0} (expected json or markdown)")]
    UnknownFormat(String),
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }

    pub fn render(&self, report: &AggregatedReport) -> Result<String> {
        match self {
            ReportFormat::Json => render_json(report),
            ReportFormat::Markdown => Ok(render_markdown(report)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Pretty-printed JSON
pub fn render_json(report: &AggregatedReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write one file per format under `<dir>/<session_id>/`
///
/// Each file is written to a temporary sibling and renamed into place.
/// Returns the written paths in `formats` order.
pub async fn write_reports(
    report: &AggregatedReport,
    dir: &Path,
    formats: &[ReportFormat],
) -> Result<Vec<PathBuf>> {
    let session_dir = dir.join(&report.session_id);
    tokio::fs::create_dir_all(&session_dir)
        .await
        .map_err(|source| io_error(&session_dir, source))?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = session_dir.join(format!("report.{}", format.extension()));
        let content = format.render(report)?;
        write_atomic(&path, &content).await?;
        info!(path = %path.display(), format = %format, "report written");
        written.push(path);
    }
    Ok(written)
}

async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(|source| io_error(&temp_path, source))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.display().to_string(),
        source,
    }
}
