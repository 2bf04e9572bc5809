//! Best-effort desktop integration: icon, menu entry, and menu cache refresh.
//!
//! Nothing here can fail the run. Every problem is logged as a warning and
//! reflected in the returned [`DesktopOutcome`].
pub mod entry;
pub mod icon;

use std::path::Path;

use crate::config::{DesktopConfig, Layout};
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::executable::ExecutableResource;
use crate::resources::file_content::FileContentResource;
use crate::resources::{Resource as _, ResourceChange};

pub use entry::{IconRef, render};
pub use icon::{AppImageIconExtractor, IconExtractor};

/// Program refreshing the menu cache, run when it is on `PATH`.
const DATABASE_UPDATER: &str = "update-desktop-database";

/// What happened to the desktop entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    /// The file was created or its content replaced.
    Written,
    /// The file already had the rendered content.
    Unchanged,
    /// The file could not be written.
    Failed(String),
}

/// Result of one integration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopOutcome {
    /// The icon the entry refers to.
    pub icon: IconRef,
    /// What happened to the entry file.
    pub entry: EntryStatus,
}

impl DesktopOutcome {
    /// Whether the pass fell short anywhere (fallback icon or unwritten entry).
    #[must_use]
    pub const fn degraded(&self) -> bool {
        matches!(self.icon, IconRef::Named(_)) || matches!(self.entry, EntryStatus::Failed(_))
    }
}

/// Extract the icon, falling back to the configured icon name.
fn resolve_icon(
    artifact: &Path,
    layout: &Layout,
    desktop: &DesktopConfig,
    extractor: &dyn IconExtractor,
    log: &dyn Log,
) -> IconRef {
    match extractor.extract(artifact, &layout.icon_path) {
        Ok(()) => {
            log.info(&format!("icon: {}", layout.icon_path.display()));
            IconRef::File(layout.icon_path.clone())
        }
        Err(e) => {
            log.warn(&format!(
                "{e}; using icon '{}' instead",
                desktop.fallback_icon
            ));
            IconRef::Named(desktop.fallback_icon.clone())
        }
    }
}

/// Write the entry if its content changed, then make it executable.
fn write_entry(layout: &Layout, content: String) -> anyhow::Result<ResourceChange> {
    let file = FileContentResource::new(layout.entry_path.clone(), content);
    let change = file.ensure()?;
    if let ResourceChange::Skipped { reason } = change {
        anyhow::bail!(reason);
    }
    ExecutableResource::new(layout.entry_path.clone()).ensure()?;
    Ok(change)
}

/// Integrate the artifact at `artifact` with the desktop menu.
pub fn integrate(
    artifact: &Path,
    layout: &Layout,
    desktop: &DesktopConfig,
    extractor: &dyn IconExtractor,
    executor: &dyn Executor,
    log: &dyn Log,
) -> DesktopOutcome {
    let icon = resolve_icon(artifact, layout, desktop, extractor, log);
    let content = render(desktop, &layout.link_path, &icon);

    let entry = match write_entry(layout, content) {
        Ok(ResourceChange::AlreadyCorrect) => {
            log.debug(&format!(
                "{} is up to date",
                layout.entry_path.display()
            ));
            EntryStatus::Unchanged
        }
        Ok(_) => {
            log.info(&format!("wrote {}", layout.entry_path.display()));
            EntryStatus::Written
        }
        Err(e) => {
            log.warn(&format!(
                "cannot write {}: {e:#}",
                layout.entry_path.display()
            ));
            EntryStatus::Failed(format!("{e:#}"))
        }
    };

    if executor.which(DATABASE_UPDATER) {
        let dir = layout.applications_dir.to_string_lossy();
        match executor.run_unchecked(DATABASE_UPDATER, &[&dir]) {
            Ok(result) if result.success => log.debug(&format!("ran {DATABASE_UPDATER}")),
            Ok(result) => log.debug(&format!(
                "{DATABASE_UPDATER} exited with {:?}",
                result.code
            )),
            Err(e) => log.debug(&format!("{DATABASE_UPDATER}: {e:#}")),
        }
    }

    DesktopOutcome { icon, entry }
}

/// Describe integration without touching the filesystem.
pub fn preview(layout: &Layout, log: &dyn Log) {
    log.dry_run(&format!(
        "would extract icon to {}",
        layout.icon_path.display()
    ));
    log.dry_run(&format!(
        "would write {}",
        layout.entry_path.display()
    ));
}
