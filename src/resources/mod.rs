//! Idempotent filesystem state: inspect first, change only what differs.
//!
//! The installer and desktop integration describe each file they own (the
//! stable link, the executable artifact, the desktop entry) as a
//! [`Resource`] and call [`Resource::ensure`], so a second run with the same
//! inputs touches nothing.
pub mod executable;
pub mod file_content;
pub mod helpers;
pub mod symlink;

use anyhow::Result;

/// Something that can be described and forced into its desired state.
pub trait Applicable {
    /// Short description used in log lines, such as `link -> target`.
    fn description(&self) -> String;

    /// Make the resource match, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the filesystem change fails.
    fn apply(&self) -> Result<ResourceChange>;
}

/// What is on disk compared with what is wanted.
///
/// ```
/// use orca_nightly::resources::ResourceState;
///
/// let stale = ResourceState::Incorrect {
///     current: "/opt/orca/old.AppImage".into(),
/// };
/// assert_ne!(stale, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing there yet.
    Missing,
    /// Already as wanted.
    Correct,
    /// Present but different.
    Incorrect {
        /// What is there now.
        current: String,
    },
    /// Occupied by something this updater does not own; left untouched.
    Invalid {
        /// What is in the way.
        reason: String,
    },
}

/// Outcome of [`Resource::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Created or updated.
    Applied,
    /// Nothing to do.
    AlreadyCorrect,
    /// Left alone; see [`ResourceState::Invalid`].
    Skipped {
        /// Why nothing was changed.
        reason: String,
    },
}

/// A resource whose current state can be inspected.
pub trait Resource: Applicable {
    /// Inspect the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read.
    fn current_state(&self) -> Result<ResourceState>;

    /// Whether [`ensure`](Self::ensure) would call [`apply`](Applicable::apply).
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }

    /// Check, then apply only when needed.
    ///
    /// `Invalid` resources are skipped with their reason; the caller decides
    /// whether a skip is fatal.
    ///
    /// # Errors
    ///
    /// Propagates errors from `current_state()` and `apply()`.
    fn ensure(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            ResourceState::Missing | ResourceState::Incorrect { .. } => self.apply(),
        }
    }
}
