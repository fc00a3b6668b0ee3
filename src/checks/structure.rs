//! Structural checks: titles, frontmatter, code fences, JSON syntax

use async_trait::async_trait;

use super::{messages, prose_lines, read_or_report, strip_frontmatter};
use crate::artifacts::{Artifact, ArtifactKind, ArtifactReader};
use crate::validation::{Check, CheckError, Detail, ValidationResult};

fn of_kind(artifacts: &[Artifact], kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
    artifacts.iter().filter(move |a| a.kind == kind)
}

/// Every Markdown artifact needs a top-level `# ` heading
pub struct MarkdownTitleCheck;

#[async_trait]
impl Check for MarkdownTitleCheck {
    fn id(&self) -> &str {
        "markdown-title"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in of_kind(artifacts, ArtifactKind::Markdown) {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            let (body, _) = strip_frontmatter(&content);
            let has_title = prose_lines(body)
                .iter()
                .any(|(_, line)| line.starts_with("# "));

            if has_title {
                result.pass();
            } else {
                result.push(Detail::error(artifact.display_path(), messages::MISSING_TITLE));
            }
        }

        Ok(result)
    }
}

/// Frontmatter, when present, must be closed and carry `name` and `description`
pub struct FrontmatterCheck;

#[async_trait]
impl Check for FrontmatterCheck {
    fn id(&self) -> &str {
        "frontmatter"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in of_kind(artifacts, ArtifactKind::Markdown) {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            let mut lines = content.lines();
            if lines.next().map(str::trim_end) != Some("---") {
                // Frontmatter is optional
                result.pass();
                continue;
            }

            let mut keys = Vec::new();
            let mut closed = false;
            for line in lines {
                if line.trim_end() == "---" {
                    closed = true;
                    break;
                }
                if let Some((key, _)) = line.split_once(':') {
                    keys.push(key.trim().to_string());
                }
            }

            let path = artifact.display_path();
            if !closed {
                result.push(Detail::error(&path, messages::UNTERMINATED_FRONTMATTER).at_line(1));
                continue;
            }

            let before = result.details.len();
            if !keys.iter().any(|k| k == "name") {
                result.push(Detail::warning(&path, messages::FRONTMATTER_MISSING_NAME).at_line(1));
            }
            if !keys.iter().any(|k| k == "description") {
                result.push(
                    Detail::warning(&path, messages::FRONTMATTER_MISSING_DESCRIPTION).at_line(1),
                );
            }
            if result.details.len() == before {
                result.pass();
            }
        }

        Ok(result)
    }
}

/// Fenced code blocks must be closed
pub struct CodeFenceCheck;

#[async_trait]
impl Check for CodeFenceCheck {
    fn id(&self) -> &str {
        "code-fences"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in of_kind(artifacts, ArtifactKind::Markdown) {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            let mut open_at: Option<usize> = None;
            for (idx, line) in content.lines().enumerate() {
                if super::is_fence(line) {
                    open_at = match open_at {
                        Some(_) => None,
                        None => Some(idx + 1),
                    };
                }
            }

            match open_at {
                Some(line) => result.push(
                    Detail::error(artifact.display_path(), messages::UNCLOSED_CODE_FENCE)
                        .at_line(line),
                ),
                None => result.pass(),
            }
        }

        Ok(result)
    }
}

/// JSON configuration files must parse
pub struct JsonSyntaxCheck;

#[async_trait]
impl Check for JsonSyntaxCheck {
    fn id(&self) -> &str {
        "json-syntax"
    }

    async fn run(
        &self,
        artifacts: &[Artifact],
        reader: &dyn ArtifactReader,
    ) -> Result<ValidationResult, CheckError> {
        let mut result = ValidationResult::new();

        for artifact in of_kind(artifacts, ArtifactKind::Json) {
            result.artifacts_checked += 1;
            let Some(content) = read_or_report(reader, artifact, &mut result).await else {
                continue;
            };

            match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(_) => result.pass(),
                Err(e) => result.push(
                    Detail::error(artifact.display_path(), messages::INVALID_JSON).at_line(e.line()),
                ),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::MemoryArtifactReader;
    use crate::validation::Severity;

    async fn run_on(check: &dyn Check, files: &[(&str, &str)]) -> ValidationResult {
        let mut reader = MemoryArtifactReader::new();
        let mut artifacts = Vec::new();
        for (path, content) in files {
            reader = reader.with_file(*path, *content);
            artifacts.push(Artifact::new(*path));
        }
        check.run(&artifacts, &reader).await.expect("check should not fail")
    }

    #[tokio::test]
    async fn test_title_present_and_missing() {
        let result = run_on(
            &MarkdownTitleCheck,
            &[
                ("ok.md", "---\nname: a\n---\n# Title\n"),
                ("bad.md", "## Only a subheading\n"),
                ("skip.json", "{}"),
            ],
        )
        .await;

        assert_eq!(result.artifacts_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.details[0].message, messages::MISSING_TITLE);
        assert_eq!(result.details[0].artifact_path, "bad.md");
    }

    #[tokio::test]
    async fn test_title_inside_fence_does_not_count() {
        let result = run_on(&MarkdownTitleCheck, &[("a.md", "```\n# not a title\n```\n")]).await;
        assert_eq!(result.errors, 1);
    }

    #[tokio::test]
    async fn test_unreadable_artifact_becomes_finding() {
        let reader = MemoryArtifactReader::new();
        let artifacts = vec![Artifact::new("gone.md")];
        let result = MarkdownTitleCheck
            .run(&artifacts, &reader)
            .await
            .expect("check should not fail");

        assert_eq!(result.errors, 1);
        assert_eq!(result.details[0].message, messages::UNREADABLE_ARTIFACT);
    }

    #[tokio::test]
    async fn test_frontmatter_rules() {
        let result = run_on(
            &FrontmatterCheck,
            &[
                ("none.md", "# Title\n"),
                ("good.md", "---\nname: x\ndescription: y\n---\n# T\n"),
                ("partial.md", "---\nname: x\n---\n# T\n"),
                ("open.md", "---\nname: x\n# T\n"),
            ],
        )
        .await;

        assert_eq!(result.artifacts_checked, 4);
        assert_eq!(result.passed, 2);
        assert_eq!(result.warnings, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.details[0].message, messages::FRONTMATTER_MISSING_DESCRIPTION);
        assert_eq!(result.details[1].message, messages::UNTERMINATED_FRONTMATTER);
        assert_eq!(result.details[1].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_unclosed_fence_reports_opening_line() {
        let result = run_on(
            &CodeFenceCheck,
            &[("a.md", "# T\n```rust\nfn main() {}\n```\n\n```\nopen\n")],
        )
        .await;

        assert_eq!(result.errors, 1);
        assert_eq!(result.details[0].line, Some(6));
    }

    #[tokio::test]
    async fn test_json_syntax() {
        let result = run_on(
            &JsonSyntaxCheck,
            &[("ok.json", "{\"a\": 1}"), ("bad.json", "{\n\"a\": }")],
        )
        .await;

        assert_eq!(result.passed, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(result.details[0].artifact_path, "bad.json");
        assert_eq!(result.details[0].line, Some(2));
    }
}
