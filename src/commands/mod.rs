//! Top-level subcommand orchestration.
pub mod completions;
pub mod status;
pub mod update;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::config::validation;
use crate::config::{Config, Layout};
use crate::logging::Log;

/// The environment variables the updater reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// `$HOME`.
    pub home: PathBuf,
    /// `$XDG_CONFIG_HOME`, if set and non-empty.
    pub xdg_config_home: Option<PathBuf>,
    /// `$XDG_DATA_HOME`, if set and non-empty.
    pub xdg_data_home: Option<PathBuf>,
    /// `$XDG_CACHE_HOME`, if set and non-empty.
    pub xdg_cache_home: Option<PathBuf>,
}

impl Environment {
    /// Read the environment of the current process.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOME` is not set.
    pub fn from_process() -> Result<Self> {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        let home = var("HOME").context("HOME environment variable is not set")?;
        Ok(Self {
            home,
            xdg_config_home: var("XDG_CONFIG_HOME"),
            xdg_data_home: var("XDG_DATA_HOME"),
            xdg_cache_home: var("XDG_CACHE_HOME"),
        })
    }

    /// `$XDG_CACHE_HOME`, or `~/.cache` when it is unset or relative.
    #[must_use]
    pub fn cache_home(&self) -> PathBuf {
        self.xdg_cache_home
            .clone()
            .filter(|p| p.is_absolute())
            .unwrap_or_else(|| self.home.join(".cache"))
    }
}

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates configuration loading and path resolution so that each
/// command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded and validated configuration.
    pub config: Config,
    /// Resolved filesystem locations.
    pub layout: Layout,
}

impl CommandSetup {
    /// Load configuration and resolve the layout from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOME` is unset or the configuration cannot be
    /// loaded.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        Self::from_env(global, &Environment::from_process()?, log)
    }

    /// Load configuration and resolve the layout from `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or fails
    /// validation, or if the install directory cannot be made absolute.
    pub fn from_env(global: &GlobalOpts, env: &Environment, log: &dyn Log) -> Result<Self> {
        let (path, required) = global.config.as_ref().map_or_else(
            || {
                (
                    Config::default_path(&env.home, env.xdg_config_home.as_deref()),
                    false,
                )
            },
            |p| (p.clone(), true),
        );

        log.debug(&format!("configuration: {}", path.display()));
        let mut config = Config::load(&path, required)?;

        let warnings = validation::warnings(&config);
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  {}: {}", warning.key, warning.message));
            }
        }

        if let Some(dir) = &global.install_dir {
            config.paths.install_dir = Some(dir.clone());
        }
        if let Some(dir) = config.paths.install_dir.take() {
            config.paths.install_dir = Some(absolute(&dir)?);
        }

        let data_home = Layout::data_home(&env.home, env.xdg_data_home.as_deref());
        let layout = Layout::resolve(&config.paths, &data_home);
        log.debug(&format!("install dir: {}", layout.install_dir.display()));

        Ok(Self { config, layout })
    }
}

/// Make `path` absolute against the current directory without touching the
/// filesystem, so link targets never depend on where the updater ran.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolve path: {}", path.display()))
}
