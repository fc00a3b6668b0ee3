//! discover: expand include globs under a root into an ordered artifact set
//!
//! Uses the glob crate for pattern matching.
//! Returns deterministically sorted, de-duplicated results.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::Artifact;

/// Errors that can occur during artifact discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Root directory not found: {0}")]
    RootNotFound(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Result type for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// List artifacts matching any include pattern and no exclude pattern
///
/// Include patterns are joined onto `root`; exclude patterns are matched
/// against the path relative to `root`.
///
/// # Examples
/// ```ignore
/// use corpus_validator::artifacts::discover;
/// use std::path::Path;
///
/// let artifacts = discover(Path::new("."), &["**/*.md".into()], &["target/**".into()])?;
/// ```
pub fn discover(root: &Path, include: &[String], exclude: &[String]) -> Result<Vec<Artifact>> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootNotFound(root.display().to_string()));
    }

    let excluded = exclude
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| DiscoveryError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut paths: BTreeSet<PathBuf> = BTreeSet::new();

    for pattern in include {
        let full_pattern = root.join(pattern);
        let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
            DiscoveryError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            }
        })?;

        for entry in entries {
            // Unreadable directory entries are skipped, not fatal
            let path = match entry {
                Ok(path) if path.is_file() => path,
                _ => continue,
            };

            let relative = path.strip_prefix(root).unwrap_or(&path);
            if excluded.iter().any(|p| p.matches_path(relative)) {
                debug!(path = %relative.display(), "excluded by pattern");
                continue;
            }

            paths.insert(path);
        }
    }

    Ok(paths.into_iter().map(Artifact::new).collect())
}
