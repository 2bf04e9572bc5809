//! HTTP transport for release metadata and asset downloads.
use anyhow::{Context as _, Result};
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// User agent sent with every request; the GitHub API rejects requests
/// without one.
const USER_AGENT: &str = concat!("orca-nightly/", env!("CARGO_PKG_VERSION"));

/// Network access used by the resolver and the installer.
///
/// Production code uses [`UreqTransport`]; tests substitute canned responses.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// `GET` a JSON API endpoint and return the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failures and HTTP error statuses.
    fn get_json(&self, url: &str) -> Result<String>;

    /// `GET` `url`, following redirects, and write the body to `dest`.
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failures, HTTP error statuses, or if
    /// `dest` cannot be written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// [`Transport`] backed by a blocking [`ureq::Agent`].
///
/// No timeouts are configured: a stalled transfer blocks the run.
#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with ureq's defaults (redirects followed, HTTP
    /// error statuses reported as errors).
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get_json(&self, url: &str) -> Result<String> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .call()
            .with_context(|| format!("GET {url}"))?;
        response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("reading response body from {url}"))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .with_context(|| format!("GET {url}"))?;

        let mut file = fs::File::create(dest)
            .with_context(|| format!("create {}", dest.display()))?;
        let mut reader = response.body_mut().as_reader();
        let written = std::io::copy(&mut reader, &mut file)
            .with_context(|| format!("write {}", dest.display()))?;
        file.flush()
            .with_context(|| format!("flush {}", dest.display()))?;
        Ok(written)
    }
}
