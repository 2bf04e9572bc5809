//! Configuration validation.
//!
//! [`validate`] rejects values no run could succeed with; [`warnings`]
//! reports suspicious but usable settings, which the CLI logs and ignores.
use super::Config;
use crate::error::ConfigError;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Dotted key the warning is about.
    pub key: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Check that `repository` has the form `owner/name`.
#[must_use]
pub fn is_repository_id(repository: &str) -> bool {
    let mut parts = repository.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None) if !owner.trim().is_empty() && !name.trim().is_empty()
    )
}

/// Check that `name` is a single path component usable as a file name.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/') && !name.contains('\0')
}

/// Reject configuration values that make every run fail.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first offending key.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.repositories.is_empty() {
        return Err(invalid("repositories", "at least one repository is required"));
    }
    if let Some(bad) = config.repositories.iter().find(|r| !is_repository_id(r)) {
        return Err(invalid(
            "repositories",
            format!("'{bad}' is not of the form owner/name"),
        ));
    }
    if config.tag.trim().is_empty() {
        return Err(invalid("tag", "must not be empty"));
    }
    if config.selection.extension.is_empty() {
        return Err(invalid("selection.extension", "must not be empty"));
    }
    for (key, tag) in [
        ("selection.primary_tag", &config.selection.primary_tag),
        ("selection.secondary_tag", &config.selection.secondary_tag),
        ("selection.family_tag", &config.selection.family_tag),
    ] {
        if tag.is_empty() {
            return Err(invalid(key, "must not be empty"));
        }
    }
    if !is_plain_file_name(&config.paths.link_name) {
        return Err(invalid("paths.link_name", "must be a plain file name"));
    }
    if !is_plain_file_name(&config.paths.entry_file_name) {
        return Err(invalid("paths.entry_file_name", "must be a plain file name"));
    }
    if let Some(req) = config.requirements.iter().find(|r| r.any_of.is_empty()) {
        return Err(invalid(
            "requirements.any_of",
            format!("requirement '{}' lists no programs", req.name),
        ));
    }
    Ok(())
}

/// Report settings that are usable but probably unintended.
#[must_use]
pub fn warnings(config: &Config) -> Vec<ValidationWarning> {
    let mut out = Vec::new();

    let sel = &config.selection;
    if sel.primary_tag.eq_ignore_ascii_case(&sel.secondary_tag) {
        out.push(ValidationWarning::new(
            "selection.secondary_tag",
            "same as primary_tag; tier 2 can never match",
        ));
    }
    if !config
        .paths
        .entry_file_name
        .to_ascii_lowercase()
        .ends_with(".desktop")
    {
        out.push(ValidationWarning::new(
            "paths.entry_file_name",
            "does not end in .desktop; menus will ignore it",
        ));
    }
    if config.desktop.fallback_icon.trim().is_empty() {
        out.push(ValidationWarning::new(
            "desktop.fallback_icon",
            "empty; the menu entry has no icon when extraction fails",
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for repo in &config.repositories {
        if !seen.insert(repo.to_ascii_lowercase()) {
            out.push(ValidationWarning::new(
                "repositories",
                format!("'{repo}' is listed more than once"),
            ));
        }
    }

    out
}
