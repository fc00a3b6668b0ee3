//! Performance checks: artifact size budget

use async_trait::async_trait;

use super::{messages, read_or_report};
use crate::artifacts::{Artifact, ArtifactReader};
use crate::validation::{Check, CheckError, Detail, ValidationResult};

/// Artifacts loaded into a context window should stay under a byte budget
pub struct ArtifactSizeCheck {
    max_bytes: usize,
}

impl ArtifactSizeCheck {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl Check for ArtifactSizeCheck {
    fn id(&self) -> &str {
        "artifact-size"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in artifacts {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            if content.len() > self.max_bytes {
                result.push(Detail::warning(
                    artifact.display_path(),
                    messages::OVERSIZED_ARTIFACT,
                ));
            } else {
                result.pass();
            }
        }

        Ok(result)
    }
}
