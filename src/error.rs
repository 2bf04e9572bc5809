//! Domain-specific error types for the nightly updater.
//!
//! Internal modules return typed errors (e.g., [`UpdateError`],
//! [`ConfigError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! UpdateError                fatal, ends the run with a non-zero exit code
//! ├── MissingDependency      a required external tool is absent
//! ├── ResolutionFailure      no candidate repository yielded a release
//! ├── NoMatchingAsset        release found, but no asset matched any tier
//! ├── DownloadFailure        the transfer did not produce a local file
//! └── UnexpectedFile         a non-symlink occupies the stable link path
//! ConfigError                configuration file problems
//! DesktopError               recovered inside desktop integration
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

/// A repository that was queried during release resolution, with the URL an
/// operator can open to check it by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Repository identifier in `owner/name` form.
    pub repository: String,
    /// Release page for the configured tag.
    pub manual_url: String,
}

/// Fatal errors raised by the update pipeline.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A required external tool is not on `PATH`.
    #[error("Required tool '{tool}' not found. {hint}")]
    MissingDependency {
        /// Requirement name (e.g., `"FUSE"`).
        tool: String,
        /// Install instructions shown to the operator.
        hint: String,
    },

    /// Every candidate repository was exhausted without a usable release.
    #[error("{}", render_resolution_failure(.tag, .candidates))]
    ResolutionFailure {
        /// The release tag that was requested.
        tag: String,
        /// Every candidate that was tried, in order.
        candidates: Vec<Candidate>,
    },

    /// The release was found but no asset matched any selection tier.
    #[error("{}", render_no_matching_asset(.repository, .names, .release_page))]
    NoMatchingAsset {
        /// Repository the release was resolved from.
        repository: String,
        /// Every asset name in the release, in original order.
        names: Vec<String>,
        /// Release page for manual download.
        release_page: String,
    },

    /// The asset download did not produce a local file.
    #[error("Download of {url} failed: {reason}")]
    DownloadFailure {
        /// URL that was being fetched.
        url: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Something other than a symlink exists at the stable link path.
    #[error(
        "{} exists and is not a symlink; move it out of the way and run again",
        .path.display()
    )]
    UnexpectedFile {
        /// The stable link path.
        path: PathBuf,
    },
}

/// Errors that arise from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("Invalid TOML in {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A value is syntactically valid but unusable.
    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid {
        /// Dotted key name (e.g., `"selection.extension"`).
        key: String,
        /// Why the value was rejected.
        message: String,
    },
}

/// Errors that desktop integration recovers from locally.
#[derive(Error, Debug)]
pub enum DesktopError {
    /// No icon could be extracted from the artifact.
    #[error("Icon extraction failed: {0}")]
    IconExtraction(String),
}

fn render_resolution_failure(tag: &str, candidates: &[Candidate]) -> String {
    let mut out = format!("No release '{tag}' with assets found in any candidate repository.");
    out.push_str("\nCheck manually:");
    for candidate in candidates {
        let _ = write!(out, "\n  {}", candidate.manual_url);
    }
    out
}

fn render_no_matching_asset(repository: &str, names: &[String], release_page: &str) -> String {
    let mut out = format!("No matching AppImage asset found in {repository}.");
    out.push_str("\nAssets found:");
    if names.is_empty() {
        out.push_str("\n  (no assets)");
    }
    for name in names {
        let _ = write!(out, "\n  {name}");
    }
    let _ = write!(out, "\nDownload manually from: {release_page}");
    out
}
