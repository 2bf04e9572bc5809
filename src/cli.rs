//! Command-line interface definition.
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::launch::LaunchMode;

/// Top-level CLI entry point for the nightly updater.
#[derive(Parser, Debug)]
#[command(
    name = "orca-nightly",
    about = "Install and update nightly OrcaSlicer AppImage builds",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Configuration file (default: $XDG_CONFIG_HOME/orca-nightly/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Override the install directory
    #[arg(long, global = true)]
    pub install_dir: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the newest nightly build and install it
    Update(UpdateOpts),
    /// Show what is currently installed
    Status,
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the per-command log file.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Update(_) => "update",
            Self::Status => "status",
            Self::Completions { .. } => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for the `update` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UpdateOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Launch the new build without asking
    #[arg(long, conflicts_with = "no_launch")]
    pub launch: bool,

    /// Do not offer to launch the new build
    #[arg(long)]
    pub no_launch: bool,
}

impl UpdateOpts {
    /// The launch behaviour selected by the flags.
    #[must_use]
    pub const fn launch_mode(&self) -> LaunchMode {
        if self.launch {
            LaunchMode::Always
        } else if self.no_launch {
            LaunchMode::Never
        } else {
            LaunchMode::Ask
        }
    }
}
