//! Resolved filesystem locations for one run.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::PathsConfig;

/// Suffix appended to a superseded artifact.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Every fixed path the updater reads or writes.
///
/// Built once from configuration and the environment, then passed to each
/// component explicitly so tests can point all of it at a temp directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory holding artifacts, the backup, and the stable link.
    pub install_dir: PathBuf,
    /// The stable symlink.
    pub link_path: PathBuf,
    /// The extracted icon.
    pub icon_path: PathBuf,
    /// Directory holding the desktop entry.
    pub applications_dir: PathBuf,
    /// The desktop entry file.
    pub entry_path: PathBuf,
}

impl Layout {
    /// Resolve configured paths, defaulting unset ones under `data_home`.
    #[must_use]
    pub fn resolve(paths: &PathsConfig, data_home: &Path) -> Self {
        let install_dir = paths
            .install_dir
            .clone()
            .unwrap_or_else(|| data_home.join("orca-nightly"));
        let applications_dir = paths
            .applications_dir
            .clone()
            .unwrap_or_else(|| data_home.join("applications"));
        let icon_path = paths
            .icon_path
            .clone()
            .unwrap_or_else(|| data_home.join("icons").join("orca-slicer-nightly.png"));

        Self {
            link_path: install_dir.join(&paths.link_name),
            entry_path: applications_dir.join(&paths.entry_file_name),
            install_dir,
            icon_path,
            applications_dir,
        }
    }

    /// Return `$XDG_DATA_HOME`, or `~/.local/share` when it is unset, empty,
    /// or relative (relative values are invalid per the XDG base directory
    /// specification).
    #[must_use]
    pub fn data_home(home: &Path, xdg_data_home: Option<&Path>) -> PathBuf {
        xdg_data_home
            .filter(|p| p.is_absolute())
            .map_or_else(|| home.join(".local").join("share"), Path::to_path_buf)
    }

    /// Path of an artifact inside the install directory.
    #[must_use]
    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.install_dir.join(file_name)
    }
}

/// Return `path` with [`BACKUP_SUFFIX`] appended to its file name.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(BACKUP_SUFFIX);
    path.with_file_name(name)
}
