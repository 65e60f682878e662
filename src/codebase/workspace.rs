//! Working-directory boundary for disk writes.
//!
//! Disk promotion only ever touches paths inside the declared working
//! directory. Containment is checked on path component boundaries, so a
//! `src2/file` never matches a `src` root.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Errors from disk promotion.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("path outside working directory: {0}")]
    OutsideWorkingDir(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The declared working directory and the disk operations confined to it.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root the workspace was declared with.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a path lies inside the working directory. The root itself
    /// counts as inside. Comparison is component-wise, not textual.
    pub fn contains(&self, path: &str) -> bool {
        Path::new(path).starts_with(&self.root)
    }

    /// Write content to a path, creating parent directories as needed.
    pub fn write_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        if !self.contains(path) {
            return Err(WorkspaceError::OutsideWorkingDir(path.to_string()));
        }
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        info!(path, "applied change to disk");
        Ok(())
    }

    /// Delete a path. A missing target reports false rather than erroring;
    /// only real I/O failures come back as errors.
    pub fn delete_file(&self, path: &str) -> Result<bool, WorkspaceError> {
        if !self.contains(path) {
            return Err(WorkspaceError::OutsideWorkingDir(path.to_string()));
        }
        if !Path::new(path).exists() {
            warn!(path, "delete target does not exist");
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        info!(path, "deleted file from disk");
        Ok(true)
    }

    /// Whether the path currently exists on disk.
    pub fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}
