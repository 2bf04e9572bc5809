//! Whole-file content resource.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::helpers::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A text file whose entire content is owned by the updater.
///
/// The file is rewritten only when its bytes differ, so repeated runs leave
/// the modification time alone.
#[derive(Debug, Clone)]
pub struct FileContentResource {
    /// File to write.
    pub path: PathBuf,
    /// Desired content.
    pub content: String,
}

impl FileContentResource {
    /// Create a new file content resource.
    #[must_use]
    pub const fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }
}

impl Applicable for FileContentResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.path)?;
        std::fs::write(&self.path, &self.content)
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for FileContentResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} is a directory", self.path.display()),
            });
        }
        match std::fs::read(&self.path) {
            Ok(existing) if existing == self.content.as_bytes() => Ok(ResourceState::Correct),
            Ok(existing) => Ok(ResourceState::Incorrect {
                current: format!("{} bytes differ", existing.len()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }
}
