//! Configuration: built-in defaults overridable by an optional TOML file.
pub mod layout;
pub mod toml_loader;
pub mod validation;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub use layout::Layout;

/// Complete runtime configuration.
///
/// Every field has a default, so an empty (or absent) config file yields a
/// working setup for the upstream OrcaSlicer nightly builds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Candidate repositories in `owner/name` form, tried in order.
    pub repositories: Vec<String>,
    /// Release tag to query in every candidate repository.
    pub tag: String,
    /// Base URL of the releases JSON API.
    pub api_base: String,
    /// Base URL of the release web pages (used in diagnostics).
    pub web_base: String,
    /// Asset selection tags.
    pub selection: SelectionConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Desktop entry contents.
    pub desktop: DesktopConfig,
    /// External tools that must be present before anything is downloaded.
    pub requirements: Vec<Requirement>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositories: vec![
                "OrcaSlicer/OrcaSlicer".to_string(),
                "SoftFever/OrcaSlicer".to_string(),
            ],
            tag: "nightly-builds".to_string(),
            api_base: "https://api.github.com".to_string(),
            web_base: "https://github.com".to_string(),
            selection: SelectionConfig::default(),
            paths: PathsConfig::default(),
            desktop: DesktopConfig::default(),
            requirements: vec![Requirement {
                name: "FUSE".to_string(),
                any_of: vec!["fusermount".to_string(), "fusermount3".to_string()],
                hint: "AppImages need FUSE to run. Install it with your package manager \
                       (e.g. `sudo apt install libfuse2t64` or `sudo dnf install fuse`)."
                    .to_string(),
            }],
        }
    }
}

/// Tags driving the tiered asset selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Tier 1 platform tag.
    pub primary_tag: String,
    /// Tier 2 platform tag.
    pub secondary_tag: String,
    /// Tier 3 generic platform family tag.
    pub family_tag: String,
    /// Required artifact extension.
    pub extension: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            primary_tag: "Ubuntu2404".to_string(),
            secondary_tag: "Ubuntu2204".to_string(),
            family_tag: "Linux".to_string(),
            extension: ".AppImage".to_string(),
        }
    }
}

/// Filesystem locations; unset paths resolve under `$XDG_DATA_HOME`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding artifacts, the backup, and the stable link.
    pub install_dir: Option<PathBuf>,
    /// File name of the stable link inside `install_dir`.
    pub link_name: String,
    /// Fixed path of the extracted icon.
    pub icon_path: Option<PathBuf>,
    /// Directory holding the desktop entry.
    pub applications_dir: Option<PathBuf>,
    /// File name of the desktop entry.
    pub entry_file_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            install_dir: None,
            link_name: "orca-slicer".to_string(),
            icon_path: None,
            applications_dir: None,
            entry_file_name: "orca-slicer-nightly.desktop".to_string(),
        }
    }
}

/// Values written into the desktop entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesktopConfig {
    /// `Name=`
    pub name: String,
    /// `Comment=`
    pub comment: String,
    /// Named system icon used when no icon could be extracted.
    pub fallback_icon: String,
    /// `Categories=`
    pub categories: Vec<String>,
    /// `MimeType=`
    pub mime_types: Vec<String>,
    /// `Keywords=`
    pub keywords: Vec<String>,
    /// `StartupWMClass=`
    pub wm_class: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(ToString::to_string).collect();
        Self {
            name: "OrcaSlicer Nightly".to_string(),
            comment: "Slice 3D models for FFF printers (nightly build)".to_string(),
            fallback_icon: "applications-engineering".to_string(),
            categories: list(&["Graphics", "3DGraphics", "Engineering"]),
            mime_types: list(&[
                "model/stl",
                "model/3mf",
                "application/vnd.ms-3mfdocument",
                "application/prs.wavefront-obj",
                "application/x-amf",
                "text/x.gcode",
            ]),
            keywords: list(&["3D", "Printing", "Slicer", "STL", "3MF", "G-code"]),
            wm_class: "orca-slicer".to_string(),
        }
    }
}

/// An external tool requirement, satisfied if any listed program is on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Requirement {
    /// Display name used in diagnostics.
    pub name: String,
    /// Programs that each satisfy the requirement.
    pub any_of: Vec<String>,
    /// Install instructions printed when the requirement is unmet.
    #[serde(default)]
    pub hint: String,
}

impl Config {
    /// Default config file location: `$XDG_CONFIG_HOME/orca-nightly/config.toml`.
    #[must_use]
    pub fn default_path(home: &Path, xdg_config_home: Option<&Path>) -> PathBuf {
        xdg_config_home
            .map_or_else(|| home.join(".config"), Path::to_path_buf)
            .join("orca-nightly")
            .join("config.toml")
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults unless `required` is set (an
    /// explicit `--config` that does not exist is an error). The result is
    /// validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// TOML, contains unknown keys, or fails validation.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let config: Self = toml_loader::load_config(path, required)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Manual-check URL of the release page for `repository`.
    #[must_use]
    pub fn release_page(&self, repository: &str) -> String {
        format!(
            "{}/{repository}/releases/tag/{}",
            self.web_base.trim_end_matches('/'),
            self.tag
        )
    }

    /// API endpoint returning the release metadata for `repository`.
    #[must_use]
    pub fn release_api_url(&self, repository: &str) -> String {
        format!(
            "{}/repos/{repository}/releases/tags/{}",
            self.api_base.trim_end_matches('/'),
            self.tag
        )
    }
}
