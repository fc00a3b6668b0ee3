//! Built-in rule catalog
//!
//! Four categories, in priority order: structure, content, integration,
//! performance. Finding messages are file-name-free so identical problems
//! aggregate into one recommendation.

mod content;
mod integration;
mod performance;
mod structure;

pub use content::{EmptySectionsCheck, LineLengthCheck, TodoMarkersCheck};
pub use integration::{RelativeLinksCheck, ScriptShebangCheck};
pub use performance::ArtifactSizeCheck;
pub use structure::{CodeFenceCheck, FrontmatterCheck, JsonSyntaxCheck, MarkdownTitleCheck};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::artifacts::{Artifact, ArtifactReader};
use crate::validation::{Category, Detail, ValidationResult};

/// Category identifiers, in execution order
pub const STRUCTURE: &str = "structure";
pub const CONTENT: &str = "content";
pub const INTEGRATION: &str = "integration";
pub const PERFORMANCE: &str = "performance";

/// Exact finding messages emitted by the catalog
pub mod messages {
    pub const MISSING_TITLE: &str = "Missing title";
    pub const UNTERMINATED_FRONTMATTER: &str = "Unterminated frontmatter";
    pub const FRONTMATTER_MISSING_NAME: &str = "Frontmatter missing name";
    pub const FRONTMATTER_MISSING_DESCRIPTION: &str = "Frontmatter missing description";
    pub const UNCLOSED_CODE_FENCE: &str = "Unclosed code fence";
    pub const INVALID_JSON: &str = "Invalid JSON";
    pub const LINE_TOO_LONG: &str = "Line too long";
    pub const TODO_MARKER: &str = "Unresolved TODO marker";
    pub const EMPTY_SECTION: &str = "Empty section";
    pub const BROKEN_LINK: &str = "Broken relative link";
    pub const MISSING_SHEBANG: &str = "Missing shebang";
    pub const OVERSIZED_ARTIFACT: &str = "Artifact exceeds size budget";
    pub const UNREADABLE_ARTIFACT: &str = "Unreadable artifact";
}

/// Thresholds used by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSettings {
    /// Longest allowed Markdown line, in characters
    pub max_line_length: usize,

    /// Largest allowed artifact, in bytes
    pub max_artifact_bytes: usize,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            max_line_length: 120,
            max_artifact_bytes: 50 * 1024,
        }
    }
}

/// Build the default catalog, resolving root-relative links against the
/// current directory
pub fn default_categories(settings: &CheckSettings) -> Vec<Category> {
    default_categories_for(Path::new(""), settings)
}

/// Build the default catalog for a corpus rooted at `root`
pub fn default_categories_for(root: &Path, settings: &CheckSettings) -> Vec<Category> {
    vec![
        Category::new(STRUCTURE)
            .with_check(MarkdownTitleCheck)
            .with_check(FrontmatterCheck)
            .with_check(CodeFenceCheck)
            .with_check(JsonSyntaxCheck),
        Category::new(CONTENT)
            .with_check(LineLengthCheck::new(settings.max_line_length))
            .with_check(TodoMarkersCheck::new())
            .with_check(EmptySectionsCheck),
        Category::new(INTEGRATION)
            .with_check(RelativeLinksCheck::new().with_root(root))
            .with_check(ScriptShebangCheck),
        Category::new(PERFORMANCE).with_check(ArtifactSizeCheck::new(settings.max_artifact_bytes)),
    ]
}

/// Read an artifact, turning a read failure into an error finding
pub(crate) async fn read_or_report(
    reader: &dyn ArtifactReader,
    artifact: &Artifact,
    result: &mut ValidationResult,
) -> Option<String> {
    match reader.read(&artifact.path).await {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(path = %artifact.path.display(), error = %e, "artifact unreadable");
            result.push(Detail::error(
                artifact.display_path(),
                messages::UNREADABLE_ARTIFACT,
            ));
            None
        }
    }
}

/// Lines outside fenced code blocks, with 1-based line numbers
pub(crate) fn prose_lines(content: &str) -> Vec<(usize, &str)> {
    let mut in_fence = false;
    let mut lines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            lines.push((idx + 1, line));
        }
    }
    lines
}

pub(crate) fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Markdown body with a leading frontmatter block removed
///
/// Returns the body and the number of lines skipped.
pub(crate) fn strip_frontmatter(content: &str) -> (&str, usize) {
    let mut lines = content.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return (content, 0),
    }

    let mut offset = content.split_inclusive('\n').next().map_or(0, str::len);
    for (idx, line) in lines.enumerate() {
        offset += line.len();
        if line.trim_end() == "---" {
            return (&content[offset..], idx + 2);
        }
    }
    (content, 0)
}
