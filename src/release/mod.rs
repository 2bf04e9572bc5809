//! Release resolution across an ordered list of candidate repositories.
pub mod transport;

use anyhow::Context as _;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Candidate, UpdateError};
use crate::logging::Log;

pub use transport::{Transport, UreqTransport};

/// A single release asset (downloadable file).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// File name as shown on the release page.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
}

impl Asset {
    /// Create an asset from its name and download URL.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browser_download_url: url.into(),
        }
    }
}

/// The subset of the release payload the updater reads. `assets` is optional
/// so a payload without it (e.g., an API error document) is distinguishable
/// from an empty release.
#[derive(Debug, Deserialize)]
struct ReleasePayload {
    #[serde(default)]
    assets: Option<Vec<Asset>>,
}

/// Release metadata from the first candidate that had an asset list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    /// Repository the release came from, in `owner/name` form.
    pub repository: String,
    /// The release tag.
    pub tag: String,
    /// Assets in the order the API listed them.
    pub assets: Vec<Asset>,
    /// Web page of this release, for manual fallback.
    pub release_page: String,
}

/// Query `repository` and return its asset list, if the payload has one.
fn fetch_assets(
    config: &Config,
    transport: &dyn Transport,
    repository: &str,
) -> anyhow::Result<Option<Vec<Asset>>> {
    let url = config.release_api_url(repository);
    let body = transport.get_json(&url)?;
    let payload: ReleasePayload =
        serde_json::from_str(&body).with_context(|| format!("parsing release JSON from {url}"))?;
    Ok(payload.assets)
}

/// Query each configured repository in order and return the first release
/// whose payload carries a non-null `assets` array.
///
/// Request failures, HTTP errors, malformed JSON, and payloads without assets
/// all move on to the next candidate. Only one request is made per
/// candidate, and iteration stops at the first success.
///
/// # Errors
///
/// Returns [`UpdateError::ResolutionFailure`] listing a manual-check URL for
/// every candidate when none of them yields an asset list.
pub fn resolve(
    config: &Config,
    transport: &dyn Transport,
    log: &dyn Log,
) -> Result<ResolvedRelease, UpdateError> {
    let mut tried = Vec::with_capacity(config.repositories.len());

    for repository in &config.repositories {
        log.debug(&format!(
            "querying {}",
            config.release_api_url(repository)
        ));

        match fetch_assets(config, transport, repository) {
            Ok(Some(assets)) => {
                log.info(&format!(
                    "found release '{}' in {repository} ({} assets)",
                    config.tag,
                    assets.len()
                ));
                return Ok(ResolvedRelease {
                    repository: repository.clone(),
                    tag: config.tag.clone(),
                    assets,
                    release_page: config.release_page(repository),
                });
            }
            Ok(None) => log.debug(&format!("{repository}: response has no asset list")),
            Err(e) => log.debug(&format!("{repository}: {e:#}")),
        }

        tried.push(Candidate {
            repository: repository.clone(),
            manual_url: config.release_page(repository),
        });
    }

    Err(UpdateError::ResolutionFailure {
        tag: config.tag.clone(),
        candidates: tried,
    })
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use mockall::predicate::eq;
    use transport::MockTransport;

    fn config(repos: &[&str]) -> Config {
        Config {
            repositories: repos.iter().map(ToString::to_string).collect(),
            tag: "nightly-builds".to_string(),
            api_base: "https://api".to_string(),
            web_base: "https://web".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn picks_second_candidate_when_first_lacks_assets() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut transport = MockTransport::new();
        transport
            .expect_get_json()
            .with(eq("https://api/repos/a/one/releases/tags/nightly-builds"))
            .times(1)
            .returning(|_| Ok(r#"{"message":"Not Found"}"#.to_string()));
        transport
            .expect_get_json()
            .with(eq("https://api/repos/b/two/releases/tags/nightly-builds"))
            .times(1)
            .returning(|_| {
                Ok(r#"{"assets":[{"name":"x-linux-Ubuntu2404.AppImage","browser_download_url":"https://host/x.AppImage"}]}"#.to_string())
            });

        let release = resolve(&config(&["a/one", "b/two"]), &transport, &log).unwrap();
        assert_eq!(release.repository, "b/two");
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].name, "x-linux-Ubuntu2404.AppImage");
        assert_eq!(release.release_page, "https://web/b/two/releases/tag/nightly-builds");
    }

    #[test]
    fn stops_at_first_success() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut transport = MockTransport::new();
        transport
            .expect_get_json()
            .times(1)
            .returning(|_| Ok(r#"{"assets":[]}"#.to_string()));

        let release = resolve(&config(&["a/one", "b/two"]), &transport, &log).unwrap();
        assert_eq!(release.repository, "a/one");
        assert!(release.assets.is_empty());
    }

    #[test]
    fn null_assets_is_treated_as_missing() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut transport = MockTransport::new();
        transport
            .expect_get_json()
            .times(1)
            .returning(|_| Ok(r#"{"assets":null}"#.to_string()));

        let err = resolve(&config(&["a/one"]), &transport, &log).unwrap_err();
        assert!(matches!(err, UpdateError::ResolutionFailure { .. }));
    }

    #[test]
    fn transport_errors_and_bad_json_fall_through() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut transport = MockTransport::new();
        transport
            .expect_get_json()
            .with(eq("https://api/repos/a/one/releases/tags/nightly-builds"))
            .returning(|_| Err(anyhow::anyhow!("http status: 404")));
        transport
            .expect_get_json()
            .with(eq("https://api/repos/b/two/releases/tags/nightly-builds"))
            .returning(|_| Ok("<html>rate limited</html>".to_string()));

        let err = resolve(&config(&["a/one", "b/two"]), &transport, &log).unwrap_err();
        match err {
            UpdateError::ResolutionFailure { tag, candidates } => {
                assert_eq!(tag, "nightly-builds");
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].repository, "a/one");
                assert_eq!(
                    candidates[0].manual_url,
                    "https://web/a/one/releases/tag/nightly-builds"
                );
                assert_eq!(
                    candidates[1].manual_url,
                    "https://web/b/two/releases/tag/nightly-builds"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ignores_unknown_fields_in_payload() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut transport = MockTransport::new();
        transport.expect_get_json().returning(|_| {
            Ok(r#"{"tag_name":"nightly-builds","assets":[{"id":1,"name":"a","browser_download_url":"https://h/a","size":3}]}"#.to_string())
        });

        let release = resolve(&config(&["a/one"]), &transport, &log).unwrap();
        assert_eq!(release.assets, vec![Asset::new("a", "https://h/a")]);
    }
}
