//! Content-quality checks: line length, TODO markers, empty sections

use async_trait::async_trait;
use regex::Regex;

use super::{messages, prose_lines, read_or_report, strip_frontmatter};
use crate::artifacts::{Artifact, ArtifactKind, ArtifactReader};
use crate::validation::{Check, CheckError, Detail, ValidationResult};

/// Markdown prose lines must not exceed a character budget
///
/// Emits one finding per artifact (at the first offending line) but counts
/// one warning per offending line.
pub struct LineLengthCheck {
    max_chars: usize,
}

impl LineLengthCheck {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait]
impl Check for LineLengthCheck {
    fn id(&self) -> &str {
        "line-length"
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

            let offending: Vec<usize> = prose_lines(&content)
                .into_iter()
                .filter(|(_, line)| line.chars().count() > self.max_chars)
                .map(|(number, _)| number)
                .collect();

            match offending.first() {
                None => result.pass(),
                Some(&first) => {
                    result.push(
                        Detail::warning(artifact.display_path(), messages::LINE_TOO_LONG)
                            .at_line(first),
                    );
                    result.warnings += offending.len() - 1;
                }
            }
        }

        Ok(result)
    }
}

/// Flags TODO / FIXME / XXX markers left in any artifact
pub struct TodoMarkersCheck {
    pattern: Regex,
}

impl TodoMarkersCheck {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\b(TODO|FIXME|XXX)\b").expect("static regex is valid"),
        }
    }
}

impl Default for TodoMarkersCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for TodoMarkersCheck {
    fn id(&self) -> &str {
        "todo-markers"
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

            let before = result.details.len();
            for (idx, line) in content.lines().enumerate() {
                if self.pattern.is_match(line) {
                    result.push(
                        Detail::warning(artifact.display_path(), messages::TODO_MARKER)
                            .at_line(idx + 1),
                    );
                }
            }
            if result.details.len() == before {
                result.pass();
            }
        }

        Ok(result)
    }
}

/// A heading immediately followed by a heading of the same or higher level
/// (or by the end of the document) introduces an empty section
pub struct EmptySectionsCheck;

fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) && line[hashes..].starts_with(' ') {
        Some(hashes)
    } else {
        None
    }
}

#[async_trait]
impl Check for EmptySectionsCheck {
    fn id(&self) -> &str {
        "empty-sections"
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

            let (body, skipped) = strip_frontmatter(&content);
            let lines: Vec<(usize, &str)> = prose_lines(body)
                .into_iter()
                .filter(|(_, line)| !line.trim().is_empty())
                .collect();

            let before = result.details.len();
            for (pos, (number, line)) in lines.iter().enumerate() {
                let Some(level) = heading_level(line) else {
                    continue;
                };
                let empty = match lines.get(pos + 1) {
                    None => true,
                    Some((_, next)) => heading_level(next).is_some_and(|next| next <= level),
                };
                if empty {
                    result.push(
                        Detail::warning(artifact.display_path(), messages::EMPTY_SECTION)
                            .at_line(number + skipped),
                    );
                }
            }
            if result.details.len() == before {
                result.pass();
            }
        }

        Ok(result)
    }
}
