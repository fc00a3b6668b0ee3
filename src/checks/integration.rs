//! Integration checks: cross-file links and script entry points

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::{messages, prose_lines, read_or_report};
use crate::artifacts::{Artifact, ArtifactKind, ArtifactReader};
use crate::validation::{Check, CheckError, Detail, ValidationResult};

/// Relative Markdown links must resolve to an existing path
///
/// Targets starting with `/` resolve against the corpus root, everything
/// else against the linking artifact's directory.
pub struct RelativeLinksCheck {
    link: Regex,
    root: PathBuf,
}

impl RelativeLinksCheck {
    pub fn new() -> Self {
        Self {
            link: Regex::new(r#"\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#)
                .expect("static regex is valid"),
            root: PathBuf::new(),
        }
    }

    /// Resolve root-relative links against `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    fn resolve(&self, base: &Path, target: &str) -> PathBuf {
        match target.strip_prefix('/') {
            Some(rooted) => self.root.join(rooted.trim_start_matches('/')),
            None => base.join(target),
        }
    }
}

impl Default for RelativeLinksCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded local link target without `#fragment` or `?query`, or None for
/// external links
fn local_target(target: &str) -> Option<String> {
    if target.starts_with('#') || target.contains("://") || target.starts_with("mailto:") {
        return None;
    }
    let path = target.split(['#', '?']).next().unwrap_or(target);
    if path.is_empty() {
        None
    } else {
        Some(percent_decode_str(path).decode_utf8_lossy().into_owned())
    }
}

#[async_trait]
impl Check for RelativeLinksCheck {
    fn id(&self) -> &str {
        "relative-links"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in artifacts.iter().filter(|a| a.kind == ArtifactKind::Markdown) {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            let base = artifact.path.parent().unwrap_or_else(|| Path::new(""));
            let before = result.details.len();

            for (number, line) in prose_lines(&content) {
                for capture in self.link.captures_iter(line) {
                    let Some(target) = capture.get(1).and_then(|m| local_target(m.as_str())) else {
                        continue;
                    };
                    if !reader.exists(&self.resolve(base, &target)).await {
                        result.push(
                            Detail::error(artifact.display_path(), messages::BROKEN_LINK)
                                .at_line(number),
                        );
                    }
                }
            }

            if result.details.len() == before {
                result.pass();
            }
        }

        Ok(result)
    }
}

/// Shell scripts must declare an interpreter
pub struct ScriptShebangCheck;

#[async_trait]
impl Check for ScriptShebangCheck {
    fn id(&self) -> &str {
        "script-shebang"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in artifacts.iter().filter(|a| a.is_shell_script()) {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            if content.starts_with("#!") {
                result.pass();
            } else {
                result.push(
                    Detail::warning(artifact.display_path(), messages::MISSING_SHEBANG).at_line(1),
                );
            }
        }

        Ok(result)
    }
}
