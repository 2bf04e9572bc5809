//! Tiered selection of the download asset.
use std::fmt;

use crate::config::SelectionConfig;
use crate::error::UpdateError;
use crate::release::{Asset, ResolvedRelease};

/// One ranked level of the selection policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    /// Position in the policy, starting at 1.
    pub rank: usize,
    /// Tag the asset must mention.
    pub tag: String,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {} ({})", self.rank, self.tag)
    }
}

/// Ordered tiers plus the extension every tier requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    tiers: Vec<Tier>,
    extension: String,
}

/// The chosen asset and the tier that matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The selected asset.
    pub asset: Asset,
    /// The tier that produced the match.
    pub tier: Tier,
}

impl Selection {
    /// Download URL of the selected asset.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.asset.browser_download_url
    }
}

/// Return the final path segment of `url`, ignoring any query or fragment.
#[must_use]
pub fn url_file_name(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = url.get(..end).unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn ends_with_ignore_case(haystack: &str, suffix: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .ends_with(&suffix.to_ascii_lowercase())
}

impl SelectionPolicy {
    /// Build the three-tier policy: primary tag, secondary tag, family tag.
    #[must_use]
    pub fn from_config(config: &SelectionConfig) -> Self {
        let tags = [
            &config.primary_tag,
            &config.secondary_tag,
            &config.family_tag,
        ];
        Self {
            tiers: tags
                .iter()
                .enumerate()
                .map(|(i, tag)| Tier {
                    rank: i + 1,
                    tag: (*tag).clone(),
                })
                .collect(),
            extension: config.extension.clone(),
        }
    }

    /// The tiers in evaluation order.
    #[must_use]
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Whether `asset` satisfies `tier`: the tag appears in its URL or name,
    /// and its URL file name carries the artifact extension.
    #[must_use]
    pub fn matches(&self, tier: &Tier, asset: &Asset) -> bool {
        let url = &asset.browser_download_url;
        ends_with_ignore_case(url_file_name(url), &self.extension)
            && (contains_ignore_case(url, &tier.tag) || contains_ignore_case(&asset.name, &tier.tag))
    }

    /// Pick the first asset of the first tier with any match.
    ///
    /// Tier priority is strict: a lower tier is consulted only when every
    /// higher tier matched nothing. Within a tier, list order decides.
    #[must_use]
    pub fn select(&self, assets: &[Asset]) -> Option<Selection> {
        self.tiers.iter().find_map(|tier| {
            assets
                .iter()
                .find(|asset| self.matches(tier, asset))
                .map(|asset| Selection {
                    asset: asset.clone(),
                    tier: tier.clone(),
                })
        })
    }

    /// Select from a resolved release.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::NoMatchingAsset`] with every asset name and the
    /// release page when no tier matches.
    pub fn select_from(&self, release: &ResolvedRelease) -> Result<Selection, UpdateError> {
        self.select(&release.assets)
            .ok_or_else(|| UpdateError::NoMatchingAsset {
                repository: release.repository.clone(),
                names: release.assets.iter().map(|a| a.name.clone()).collect(),
                release_page: release.release_page.clone(),
            })
    }
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

    fn policy() -> SelectionPolicy {
        SelectionPolicy::from_config(&SelectionConfig::default())
    }

    fn release(assets: Vec<Asset>) -> ResolvedRelease {
        ResolvedRelease {
            repository: "a/one".to_string(),
            tag: "nightly-builds".to_string(),
            assets,
            release_page: "https://github.com/a/one/releases/tag/nightly-builds".to_string(),
        }
    }

    fn asset(name: &str) -> Asset {
        Asset::new(name, format!("https://host/dl/{name}"))
    }

    #[test]
    fn url_file_name_strips_query_and_fragment() {
        assert_eq!(url_file_name("https://h/a/b/x.AppImage"), "x.AppImage");
        assert_eq!(url_file_name("https://h/x.AppImage?sig=1"), "x.AppImage");
        assert_eq!(url_file_name("https://h/x.AppImage#frag"), "x.AppImage");
        assert_eq!(url_file_name("https://h/dir/"), "");
    }

    #[test]
    fn tiers_follow_config_order() {
        let p = policy();
        let tags: Vec<&str> = p.tiers().iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, ["Ubuntu2404", "Ubuntu2204", "Linux"]);
        assert_eq!(p.tiers()[2].to_string(), "tier 3 (Linux)");
    }

    #[test]
    fn primary_tier_wins_even_when_listed_last() {
        let assets = vec![
            asset("OrcaSlicer_Linux_AppImage_nightly.AppImage"),
            asset("OrcaSlicer_Linux_AppImage_Ubuntu2204_nightly.AppImage"),
            asset("OrcaSlicer_Linux_AppImage_Ubuntu2404_nightly.AppImage"),
        ];
        let selection = policy().select(&assets).unwrap();
        assert_eq!(selection.tier.rank, 1);
        assert_eq!(selection.asset, assets[2]);
    }

    #[test]
    fn secondary_tier_used_when_primary_absent() {
        let assets = vec![
            asset("OrcaSlicer_Linux_AppImage_nightly.AppImage"),
            asset("OrcaSlicer_Linux_AppImage_Ubuntu2204_nightly.AppImage"),
        ];
        let selection = policy().select(&assets).unwrap();
        assert_eq!(selection.tier.rank, 2);
        assert_eq!(selection.asset, assets[1]);
    }

    #[test]
    fn generic_tier_is_last_resort() {
        let assets = vec![
            asset("OrcaSlicer_Windows_nightly.zip"),
            asset("OrcaSlicer_Linux_nightly.AppImage"),
        ];
        let selection = policy().select(&assets).unwrap();
        assert_eq!(selection.tier.rank, 3);
        assert_eq!(selection.asset, assets[1]);
    }

    #[test]
    fn first_in_list_order_wins_within_a_tier() {
        let assets = vec![
            asset("b_Ubuntu2404.AppImage"),
            asset("a_Ubuntu2404.AppImage"),
        ];
        let selection = policy().select(&assets).unwrap();
        assert_eq!(selection.asset.name, "b_Ubuntu2404.AppImage");
    }

    #[test]
    fn extension_is_required_in_every_tier() {
        let assets = vec![
            asset("OrcaSlicer_Linux_Ubuntu2404.tar.gz"),
            asset("OrcaSlicer_Linux_Ubuntu2404.AppImage.zsync"),
        ];
        assert!(policy().select(&assets).is_none());
    }

    #[test]
    fn tag_may_come_from_name_when_url_lacks_it() {
        let assets = vec![Asset::new(
            "x-linux-Ubuntu2404.AppImage",
            "https://host/x.AppImage",
        )];
        let selection = policy().select(&assets).unwrap();
        assert_eq!(selection.tier.rank, 1);
        assert_eq!(selection.url(), "https://host/x.AppImage");
    }

    #[test]
    fn matching_ignores_ascii_case() {
        let assets = vec![asset("orca_linux_ubuntu2404.appimage")];
        assert_eq!(policy().select(&assets).unwrap().tier.rank, 1);
    }

    #[test]
    fn no_match_lists_names_verbatim() {
        let err = policy()
            .select_from(&release(vec![asset("x.zip"), asset("y.exe")]))
            .unwrap_err();
        match err {
            UpdateError::NoMatchingAsset {
                repository,
                names,
                release_page,
            } => {
                assert_eq!(repository, "a/one");
                assert_eq!(names, vec!["x.zip", "y.exe"]);
                assert!(release_page.ends_with("/releases/tag/nightly-builds"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_asset_list_reports_no_assets() {
        let err = policy().select_from(&release(vec![])).unwrap_err();
        assert!(err.to_string().contains("(no assets)"));
    }
}
