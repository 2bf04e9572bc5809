//! Symlink resource.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::helpers::fs::{ensure_parent_dir, entry_exists, is_symlink, remove_existing};
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A symlink at `link` that must point at `source`.
///
/// Only symlinks are ever replaced. Anything else at `link` makes the
/// resource [`ResourceState::Invalid`] and is left untouched.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// What the symlink points to.
    pub source: PathBuf,
    /// Where the symlink lives.
    pub link: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, link: PathBuf) -> Self {
        Self { source, link }
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.link.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        if entry_exists(&self.link) && !is_symlink(&self.link) {
            anyhow::bail!("refusing to replace non-symlink: {}", self.link.display());
        }
        ensure_parent_dir(&self.link)?;
        remove_existing(&self.link)?;
        create_symlink(&self.source, &self.link)?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !entry_exists(&self.link) {
            return Ok(ResourceState::Missing);
        }
        if !is_symlink(&self.link) {
            return Ok(ResourceState::Invalid {
                reason: format!("{} is not a symlink", self.link.display()),
            });
        }

        let existing = std::fs::read_link(&self.link)
            .with_context(|| format!("read link: {}", self.link.display()))?;
        if existing == self.source {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("points to {}", existing.display()),
            })
        }
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &std::path::Path, link: &std::path::Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })
    }

    #[cfg(not(unix))]
    {
        anyhow::bail!(
            "symlinks are not supported on this platform: {} -> {}",
            link.display(),
            target.display()
        )
    }
}
