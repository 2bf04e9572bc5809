//! Command: report what is currently installed.
use anyhow::{Context as _, Result};
use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::config::Layout;
use crate::config::layout::BACKUP_SUFFIX;
use crate::logging::Log;
use crate::resources::helpers::fs::{entry_exists, is_symlink};

/// State of the stable link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing at the link path.
    Absent,
    /// A symlink; `exists` tells whether its target is present.
    Linked {
        /// Where the link points.
        target: PathBuf,
        /// Whether the target exists.
        exists: bool,
    },
    /// Something other than a symlink occupies the link path.
    Blocked,
}

/// Snapshot of the installed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// The stable link path.
    pub link_path: PathBuf,
    /// State of the stable link.
    pub link: LinkState,
    /// Backups of previous artifacts, sorted.
    pub backups: Vec<PathBuf>,
    /// The extracted icon, if one exists.
    pub icon: Option<PathBuf>,
    /// The desktop entry, if one exists.
    pub entry: Option<PathBuf>,
}

fn present(path: &Path) -> Option<PathBuf> {
    path.exists().then(|| path.to_path_buf())
}

/// Resolve a link target against the directory holding the link.
fn resolve_target(link: &Path, target: &Path) -> PathBuf {
    link.parent()
        .map_or_else(|| target.to_path_buf(), |dir| dir.join(target))
}

impl StatusReport {
    /// Inspect `layout`. Missing state is reported, never an error.
    #[must_use]
    pub fn gather(layout: &Layout) -> Self {
        let link = if is_symlink(&layout.link_path) {
            std::fs::read_link(&layout.link_path).map_or(LinkState::Blocked, |target| {
                LinkState::Linked {
                    exists: resolve_target(&layout.link_path, &target).exists(),
                    target,
                }
            })
        } else if entry_exists(&layout.link_path) {
            LinkState::Blocked
        } else {
            LinkState::Absent
        };

        let mut backups: Vec<PathBuf> = std::fs::read_dir(&layout.install_dir)
            .map(|read| {
                read.filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.to_string_lossy().ends_with(BACKUP_SUFFIX) && p.is_file())
                    .collect()
            })
            .unwrap_or_default();
        backups.sort();

        Self {
            link_path: layout.link_path.clone(),
            link,
            backups,
            icon: present(&layout.icon_path),
            entry: present(&layout.entry_path),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_none = |p: &Option<PathBuf>| {
            p.as_ref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string())
        };

        writeln!(f, "link:    {}", self.link_path.display())?;
        match &self.link {
            LinkState::Absent => writeln!(f, "target:  not installed")?,
            LinkState::Linked { target, exists } => writeln!(
                f,
                "target:  {}{}",
                target.display(),
                if *exists { "" } else { " (missing)" }
            )?,
            LinkState::Blocked => writeln!(f, "target:  link path is not a symlink")?,
        }
        if self.backups.is_empty() {
            writeln!(f, "backup:  none")?;
        }
        for backup in &self.backups {
            writeln!(f, "backup:  {}", backup.display())?;
        }
        writeln!(f, "icon:    {}", or_none(&self.icon))?;
        writeln!(f, "entry:   {}", or_none(&self.entry))
    }
}

/// Run the `status` command.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or stdout cannot be
/// written.
pub fn run(global: &GlobalOpts, log: &dyn Log) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let report = StatusReport::gather(&setup.layout);
    write!(std::io::stdout().lock(), "{report}").context("write status")
}
