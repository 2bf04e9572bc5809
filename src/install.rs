//! Fetch the selected artifact and swap the stable link over to it.
//!
//! Installation is split into [`plan`], which inspects the install directory
//! and decides every filesystem change, and [`apply`] / [`preview`], which
//! carry the plan out or describe it.
use anyhow::{Context as _, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::Layout;
use crate::config::layout::backup_path;
use crate::error::UpdateError;
use crate::logging::Log;
use crate::release::Transport;
use crate::resources::executable::ExecutableResource;
use crate::resources::helpers::fs::{entry_exists, is_symlink, remove_existing, replace_with};
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, Resource as _};
use crate::select::url_file_name;

/// Suffix of the file a download streams into before it is renamed.
const PARTIAL_SUFFIX: &str = ".part";

/// A superseded artifact and where it will be moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    /// Current target of the stable link.
    pub from: PathBuf,
    /// `<from>.bak`.
    pub to: PathBuf,
}

/// Every change an install will make, decided before any of them is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// URL to download.
    pub url: String,
    /// Local artifact path.
    pub artifact: PathBuf,
    /// Stable link path.
    pub link: PathBuf,
    /// Target the link points at now, if it is a symlink.
    pub previous: Option<PathBuf>,
    /// Backup rotation, when the link target has a different file name.
    pub backup: Option<Backup>,
}

/// What an applied install changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The installed artifact.
    pub artifact: PathBuf,
    /// The stable link, now pointing at `artifact`.
    pub link: PathBuf,
    /// Where the previous artifact was moved, if it was.
    pub backed_up: Option<PathBuf>,
    /// Bytes downloaded.
    pub bytes: u64,
}

/// Derive the local file name from a download URL.
///
/// # Errors
///
/// Returns [`UpdateError::DownloadFailure`] when the URL's final segment is
/// empty, `.` or `..`, or collides with the stable link name.
pub fn artifact_file_name(url: &str, link_name: &str) -> Result<String, UpdateError> {
    let name = url_file_name(url);
    let reason = if name.is_empty() || name == "." || name == ".." {
        Some(format!("URL has no usable file name ('{name}')"))
    } else if name == link_name {
        Some(format!("file name '{name}' collides with the stable link"))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(UpdateError::DownloadFailure {
            url: url.to_string(),
            reason,
        }),
        None => Ok(name.to_string()),
    }
}

/// Resolve a link target relative to the directory holding the link.
fn absolute_target(link: &Path, target: PathBuf) -> PathBuf {
    if target.is_absolute() {
        return target;
    }
    match link.parent() {
        Some(dir) => dir.join(target),
        None => target,
    }
}

/// Inspect the install directory and decide what installing `url` changes.
///
/// Nothing is modified.
///
/// # Errors
///
/// Returns [`UpdateError::DownloadFailure`] for an unusable file name and
/// [`UpdateError::UnexpectedFile`] when something other than a symlink
/// occupies the stable link path.
pub fn plan(layout: &Layout, url: &str) -> Result<InstallPlan, UpdateError> {
    let link_name = layout
        .link_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = artifact_file_name(url, &link_name)?;

    if entry_exists(&layout.link_path) && !is_symlink(&layout.link_path) {
        return Err(UpdateError::UnexpectedFile {
            path: layout.link_path.clone(),
        });
    }

    let previous = std::fs::read_link(&layout.link_path)
        .ok()
        .map(|t| absolute_target(&layout.link_path, t));

    let backup = previous
        .as_ref()
        .filter(|target| target.exists())
        .filter(|target| target.file_name() != Some(OsStr::new(&name)))
        .map(|target| Backup {
            from: target.clone(),
            to: backup_path(target),
        });

    Ok(InstallPlan {
        url: url.to_string(),
        artifact: layout.artifact_path(&name),
        link: layout.link_path.clone(),
        previous,
        backup,
    })
}

/// Describe `plan` without touching the filesystem.
pub fn preview(plan: &InstallPlan, log: &dyn Log) {
    if let Some(backup) = &plan.backup {
        log.dry_run(&format!(
            "would rename {} to {}",
            backup.from.display(),
            backup.to.display()
        ));
    }
    log.dry_run(&format!(
        "would download {} to {}",
        plan.url,
        plan.artifact.display()
    ));
    log.dry_run(&format!(
        "would link {} -> {}",
        plan.link.display(),
        plan.artifact.display()
    ));
}

/// Stream `url` into `<artifact>.part`, then rename it into place.
fn download(plan: &InstallPlan, transport: &dyn Transport) -> Result<u64, UpdateError> {
    let mut part = plan.artifact.clone().into_os_string();
    part.push(PARTIAL_SUFFIX);
    let part = PathBuf::from(part);

    let failure = |reason: String| UpdateError::DownloadFailure {
        url: plan.url.clone(),
        reason,
    };

    let bytes = match transport.download(&plan.url, &part) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = std::fs::remove_file(&part);
            return Err(failure(format!("{e:#}")));
        }
    };
    if !part.is_file() {
        return Err(failure("no file was written".to_string()));
    }
    replace_with(&part, &plan.artifact).map_err(|e| {
        let _ = std::fs::remove_file(&part);
        failure(format!("{e:#}"))
    })?;
    Ok(bytes)
}

/// Carry out `plan`: rotate the backup, drop the old link, download, mark
/// the artifact executable, and link it.
///
/// There is no rollback: a failed download leaves the link absent and the
/// previous artifact under its backup name.
///
/// # Errors
///
/// Returns [`UpdateError::DownloadFailure`] when the transfer fails, and an
/// I/O error for any other filesystem failure.
pub fn apply(plan: &InstallPlan, transport: &dyn Transport, log: &dyn Log) -> Result<InstallOutcome> {
    if let Some(parent) = plan.artifact.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create install dir: {}", parent.display()))?;
    }

    if let Some(backup) = &plan.backup {
        log.info(&format!(
            "moving previous build to {}",
            backup.to.display()
        ));
        replace_with(&backup.from, &backup.to)?;
    }

    if is_symlink(&plan.link) {
        remove_existing(&plan.link)?;
    }

    log.info(&format!("downloading {}", plan.url));
    let bytes = download(plan, transport)?;
    log.debug(&format!("wrote {bytes} bytes to {}", plan.artifact.display()));

    let executable = ExecutableResource::new(plan.artifact.clone());
    executable.ensure()?;
    log.debug(&format!("chmod {}", executable.description()));

    let link = SymlinkResource::new(plan.artifact.clone(), plan.link.clone());
    link.ensure()?;
    log.info(&format!("linked {}", link.description()));

    Ok(InstallOutcome {
        artifact: plan.artifact.clone(),
        link: plan.link.clone(),
        backed_up: plan.backup.as_ref().map(|b| b.to.clone()),
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use crate::logging::isolated_logger;
    use crate::release::transport::MockTransport;

    fn layout(dir: &Path) -> Layout {
        let paths = PathsConfig {
            install_dir: Some(dir.join("install")),
            ..PathsConfig::default()
        };
        Layout::resolve(&paths, dir)
    }

    /// A transport whose downloads write `content` to the destination.
    fn serving(content: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_download().returning(move |_, dest| {
            std::fs::write(dest, content)?;
            Ok(u64::try_from(content.len()).unwrap())
        });
        transport
    }

    fn install(layout: &Layout, url: &str, transport: &MockTransport) -> InstallOutcome {
        let (log, _tmp, _guard) = isolated_logger();
        let plan = plan(layout, url).unwrap();
        apply(&plan, transport, &log).unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    // ------------------------------------------------------------------
    // artifact_file_name
    // ------------------------------------------------------------------

    #[test]
    fn file_name_is_last_url_segment() {
        assert_eq!(
            artifact_file_name("https://host/dl/x.AppImage?token=1", "orca-slicer").unwrap(),
            "x.AppImage"
        );
    }

    #[test]
    fn file_name_rejects_empty_and_dot_segments() {
        for url in ["https://host/dir/", "https://host/.", "https://host/.."] {
            let err = artifact_file_name(url, "orca-slicer").unwrap_err();
            assert!(matches!(err, UpdateError::DownloadFailure { .. }), "{url}");
        }
    }

    #[test]
    fn file_name_rejects_link_name() {
        let err = artifact_file_name("https://host/orca-slicer", "orca-slicer").unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    // ------------------------------------------------------------------
    // plan
    // ------------------------------------------------------------------

    #[test]
    fn plan_fresh_install_has_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let plan = plan(&layout, "https://host/x.AppImage").unwrap();
        assert_eq!(plan.artifact, dir.path().join("install/x.AppImage"));
        assert_eq!(plan.previous, None);
        assert_eq!(plan.backup, None);
        assert!(!layout.install_dir.exists(), "planning must not create anything");
    }

    #[cfg(unix)]
    #[test]
    fn plan_rejects_regular_file_at_link_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        std::fs::create_dir_all(&layout.install_dir).unwrap();
        std::fs::write(&layout.link_path, "mine").unwrap();

        let err = plan(&layout, "https://host/x.AppImage").unwrap_err();
        assert!(matches!(err, UpdateError::UnexpectedFile { .. }));
        assert_eq!(std::fs::read_to_string(&layout.link_path).unwrap(), "mine");
    }

    #[cfg(unix)]
    #[test]
    fn plan_ignores_dangling_previous_target() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        std::fs::create_dir_all(&layout.install_dir).unwrap();
        std::os::unix::fs::symlink(layout.install_dir.join("gone.AppImage"), &layout.link_path)
            .unwrap();

        let plan = plan(&layout, "https://host/x.AppImage").unwrap();
        assert!(plan.previous.is_some());
        assert_eq!(plan.backup, None);
    }

    #[cfg(unix)]
    #[test]
    fn plan_resolves_relative_link_target() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        std::fs::create_dir_all(&layout.install_dir).unwrap();
        std::fs::write(layout.install_dir.join("a.AppImage"), "a").unwrap();
        std::os::unix::fs::symlink("a.AppImage", &layout.link_path).unwrap();

        let plan = plan(&layout, "https://host/b.AppImage").unwrap();
        assert_eq!(
            plan.backup.unwrap().to,
            layout.install_dir.join("a.AppImage.bak")
        );
    }

    // ------------------------------------------------------------------
    // apply
    // ------------------------------------------------------------------

    #[cfg(unix)]
    #[test]
    fn fresh_install_links_executable_artifact() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let outcome = install(&layout, "https://host/x.AppImage", &serving("bin"));

        assert_eq!(outcome.bytes, 3);
        assert_eq!(outcome.backed_up, None);
        assert_eq!(std::fs::read_link(&layout.link_path).unwrap(), outcome.artifact);
        assert!(outcome.artifact.is_absolute());
        let mode = std::fs::metadata(&outcome.artifact).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
        assert_eq!(file_names(&layout.install_dir), ["orca-slicer", "x.AppImage"]);
    }

    #[cfg(unix)]
    #[test]
    fn same_asset_twice_makes_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let transport = serving("bin");
        install(&layout, "https://host/x.AppImage", &transport);
        let outcome = install(&layout, "https://host/x.AppImage", &transport);

        assert_eq!(outcome.backed_up, None);
        assert_eq!(file_names(&layout.install_dir), ["orca-slicer", "x.AppImage"]);
        assert_eq!(
            std::fs::read_link(&layout.link_path).unwrap(),
            layout.install_dir.join("x.AppImage")
        );
    }

    #[cfg(unix)]
    #[test]
    fn different_asset_rotates_previous_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        install(&layout, "https://host/a.AppImage", &serving("old"));
        let outcome = install(&layout, "https://host/b.AppImage", &serving("new"));

        assert_eq!(
            outcome.backed_up,
            Some(layout.install_dir.join("a.AppImage.bak"))
        );
        assert_eq!(
            file_names(&layout.install_dir),
            ["a.AppImage.bak", "b.AppImage", "orca-slicer"]
        );
        assert_eq!(
            std::fs::read_to_string(layout.install_dir.join("a.AppImage.bak")).unwrap(),
            "old"
        );
        assert_eq!(
            std::fs::read_link(&layout.link_path).unwrap(),
            layout.install_dir.join("b.AppImage")
        );
    }

    #[cfg(unix)]
    #[test]
    fn newer_backup_replaces_older_one() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        std::fs::create_dir_all(&layout.install_dir).unwrap();
        std::fs::write(layout.install_dir.join("a.AppImage.bak"), "stale").unwrap();

        install(&layout, "https://host/a.AppImage", &serving("a"));
        install(&layout, "https://host/b.AppImage", &serving("b"));

        assert_eq!(
            std::fs::read_to_string(layout.install_dir.join("a.AppImage.bak")).unwrap(),
            "a"
        );
        assert_eq!(
            file_names(&layout.install_dir),
            ["a.AppImage.bak", "b.AppImage", "orca-slicer"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn failed_download_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let mut transport = MockTransport::new();
        transport.expect_download().returning(|_, dest| {
            std::fs::write(dest, "trunc")?;
            Err(anyhow::anyhow!("connection reset"))
        });

        let (log, _tmp, _guard) = isolated_logger();
        let plan = plan(&layout, "https://host/x.AppImage").unwrap();
        let err = apply(&plan, &transport, &log).unwrap_err();

        let update_err = err.downcast_ref::<UpdateError>().unwrap();
        assert!(matches!(update_err, UpdateError::DownloadFailure { .. }));
        assert!(err.to_string().contains("connection reset"));
        assert!(file_names(&layout.install_dir).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn download_that_writes_nothing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let mut transport = MockTransport::new();
        transport.expect_download().returning(|_, _| Ok(0));

        let (log, _tmp, _guard) = isolated_logger();
        let plan = plan(&layout, "https://host/x.AppImage").unwrap();
        let err = apply(&plan, &transport, &log).unwrap_err();
        assert!(err.to_string().contains("no file was written"));
        assert!(!layout.link_path.exists());
    }
}
