//! Command: print version information.
use anyhow::{Context as _, Result};
use std::io::Write as _;

/// Version string baked in at build time, falling back to the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("ORCA_NIGHTLY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the updater version to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> Result<()> {
    writeln!(std::io::stdout().lock(), "orca-nightly {}", version()).context("write version")
}
