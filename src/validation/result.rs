//! Validation result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub artifact_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

impl Detail {
    pub fn warning(artifact_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            line: None,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(artifact_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            line: None,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Attach a 1-based line number
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Output of one check
///
/// Summary counts are accumulated independently of `details`: a check may
/// count several occurrences while emitting a single detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
    pub artifacts_checked: usize,
    pub details: Vec<Detail>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passing artifact
    pub fn pass(&mut self) {
        self.passed += 1;
    }

    /// Record a finding and bump the matching counter
    pub fn push(&mut self, detail: Detail) {
        match detail.severity {
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
        self.details.push(detail);
    }

    /// Synthesized result for a check that failed to run
    pub fn check_failure(check_id: &str, message: impl Into<String>) -> Self {
        Self {
            passed: 0,
            warnings: 0,
            errors: 1,
            artifacts_checked: 0,
            details: vec![Detail::error(format!("check:{}", check_id), message)],
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// One check execution, appended to the run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRunRecord {
    pub category_id: String,
    pub check_id: String,
    pub result: ValidationResult,
    pub timestamp: DateTime<Utc>,
}

/// Running totals for one validation pass
///
/// `checked_artifacts` is the sum of every check's own `artifacts_checked`,
/// so an artifact inspected by three checks counts three times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_artifacts: usize,
    pub checked_artifacts: usize,
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl Metrics {
    /// Fresh accumulator for a run over `total_artifacts` artifacts
    pub fn for_artifacts(total_artifacts: usize) -> Self {
        Self {
            total_artifacts,
            ..Default::default()
        }
    }

    /// Fold one check result into the totals
    pub fn absorb(&mut self, result: &ValidationResult) {
        self.checked_artifacts += result.artifacts_checked;
        self.passed += result.passed;
        self.warnings += result.warnings;
        self.errors += result.errors;
    }

    /// Recompute totals from a run log
    pub fn tally(total_artifacts: usize, run_log: &[CategoryRunRecord]) -> Self {
        run_log.iter().fold(Self::for_artifacts(total_artifacts), |mut acc, record| {
            acc.absorb(&record.result);
            acc
        })
    }

    /// Share of evaluated outcomes that passed (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        let total = self.passed + self.warnings + self.errors;
        if total == 0 {
            return 1.0;
        }
        self.passed as f64 / total as f64
    }
}
