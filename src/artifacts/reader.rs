//! Artifact content access
//!
//! Reads artifacts as UTF-8 strings. A missing file is reported as
//! `NotFound` so the calling check can turn it into a finding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading an artifact
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("IO error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Content access collaborator used by checks
#[async_trait]
pub trait ArtifactReader: Send + Sync {
    /// Read the full artifact content
    async fn read(&self, path: &Path) -> Result<String, ArtifactError>;

    /// Whether a path resolves to something readable
    async fn exists(&self, path: &Path) -> bool {
        self.read(path).await.is_ok()
    }
}

/// Reads artifacts from the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactReader;

#[async_trait]
impl ArtifactReader for FsArtifactReader {
    async fn read(&self, path: &Path) -> Result<String, ArtifactError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(ArtifactError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

/// In-memory corpus (path → text)
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryArtifactReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the corpus
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

#[async_trait]
impl ArtifactReader for MemoryArtifactReader {
    async fn read(&self, path: &Path) -> Result<String, ArtifactError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(path.display().to_string()))
    }
}
