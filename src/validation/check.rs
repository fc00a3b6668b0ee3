//! Check and Category definitions

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::result::ValidationResult;
use crate::artifacts::{Artifact, ArtifactReader};

/// Failure raised by a check body
///
/// Never escapes the engine: it is converted into a single error finding.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("{0}")]
    Failed(String),

    #[error("check panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CheckError {
    pub fn failed(message: impl Into<String>) -> Self {
        CheckError::Failed(message.into())
    }
}

/// One independent validation function over the full artifact set
///
/// A check filters the artifacts down to the kinds it cares about. Artifact
/// read failures are the check's responsibility and should become findings.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable check identifier (e.g. `markdown-title`)
    fn id(&self) -> &str;

    /// Evaluate the check
    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError>;
}

/// Named, ordered list of checks sharing a theme
#[derive(Clone)]
pub struct Category {
    pub id: String,
    pub checks: Vec<Arc<dyn Check>>,
}

impl Category {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            checks: Vec::new(),
        }
    }

    /// Append a check (declaration order is execution order)
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Check ids in declaration order
    pub fn check_ids(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.id().to_string()).collect()
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("id", &self.id)
            .field("checks", &self.check_ids())
            .finish()
    }
}
