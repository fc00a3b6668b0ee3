//! Artifacts: discovery and content access
//!
//! The validation engine never walks the filesystem itself. Discovery
//! produces an ordered `[Artifact]`, and checks read content through an
//! `ArtifactReader` so tests can substitute an in-memory corpus.

mod discovery;
mod reader;

pub use discovery::{discover, DiscoveryError};
pub use reader::{ArtifactError, ArtifactReader, FsArtifactReader, MemoryArtifactReader};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Artifact kind, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Instruction documents (`.md`, `.markdown`)
    Markdown,
    /// Configuration files (`.json`)
    Json,
    /// Small scripts (`.sh`, `.bash`, `.py`, `.js`, `.ts`)
    Script,
    /// Anything else that matched an include pattern
    Other,
}

impl ArtifactKind {
    /// Classify a path by extension (case-insensitive)
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("md") | Some("markdown") => ArtifactKind::Markdown,
            Some("json") => ArtifactKind::Json,
            Some("sh") | Some("bash") | Some("py") | Some("js") | Some("ts") => {
                ArtifactKind::Script
            }
            _ => ArtifactKind::Other,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Markdown => write!(f, "markdown"),
            ArtifactKind::Json => write!(f, "json"),
            ArtifactKind::Script => write!(f, "script"),
            ArtifactKind::Other => write!(f, "other"),
        }
    }
}

/// One discoverable file under validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Create an artifact, classifying it by extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ArtifactKind::from_path(&path);
        Self { path, kind }
    }

    /// Path rendered for findings and reports
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Whether this is a shell script (`.sh` / `.bash`)
    pub fn is_shell_script(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("sh") | Some("bash")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ArtifactKind::from_path(Path::new("a/README.md")), ArtifactKind::Markdown);
        assert_eq!(ArtifactKind::from_path(Path::new("guide.MARKDOWN")), ArtifactKind::Markdown);
        assert_eq!(ArtifactKind::from_path(Path::new("plugin.json")), ArtifactKind::Json);
        assert_eq!(ArtifactKind::from_path(Path::new("hooks/run.sh")), ArtifactKind::Script);
        assert_eq!(ArtifactKind::from_path(Path::new("tool.py")), ArtifactKind::Script);
        assert_eq!(ArtifactKind::from_path(Path::new("LICENSE")), ArtifactKind::Other);
    }

    #[test]
    fn test_shell_script_detection() {
        assert!(Artifact::new("scripts/install.sh").is_shell_script());
        assert!(!Artifact::new("scripts/tool.py").is_shell_script());
    }
}
