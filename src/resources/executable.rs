//! Executable permission resource.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// Mode given to installed artifacts and the desktop entry.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// A file that must carry a specific permission mode (Unix only).
#[derive(Debug, Clone)]
pub struct ExecutableResource {
    /// Target file path.
    pub target: PathBuf,
    /// Desired permission bits.
    pub mode: u32,
}

impl ExecutableResource {
    /// A resource making `target` mode `0755`.
    #[must_use]
    pub const fn new(target: PathBuf) -> Self {
        Self {
            target,
            mode: EXECUTABLE_MODE,
        }
    }
}

impl Applicable for ExecutableResource {
    fn description(&self) -> String {
        format!("{:o} {}", self.mode, self.target.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            std::fs::set_permissions(&self.target, std::fs::Permissions::from_mode(self.mode))
                .with_context(|| format!("set permissions: {}", self.target.display()))?;
            Ok(ResourceChange::Applied)
        }

        #[cfg(not(unix))]
        {
            Ok(ResourceChange::Skipped {
                reason: "chmod not supported on this platform".to_string(),
            })
        }
    }
}

impl Resource for ExecutableResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.target.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("target does not exist: {}", self.target.display()),
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let current = std::fs::metadata(&self.target)
                .with_context(|| format!("read metadata: {}", self.target.display()))?
                .permissions()
                .mode()
                & 0o7777;

            if current == self.mode {
                Ok(ResourceState::Correct)
            } else {
                Ok(ResourceState::Incorrect {
                    current: format!("{current:o}"),
                })
            }
        }

        #[cfg(not(unix))]
        {
            Ok(ResourceState::Invalid {
                reason: "chmod not supported on this platform".to_string(),
            })
        }
    }
}
