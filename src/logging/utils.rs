//! Helpers shared by the console and file outputs.
use std::path::{Path, PathBuf};

/// Remove ANSI CSI sequences (`ESC [ params final`) from `s`.
///
/// Any other escape drops itself and the character that follows it.
pub(super) fn strip_ansi(s: &str) -> String {
    #[derive(Clone, Copy)]
    enum State {
        Text,
        Escape,
        Csi,
    }

    let mut state = State::Text;
    s.chars()
        .filter(|&c| {
            let (next, keep) = match (state, c) {
                (State::Text, '\x1b') => (State::Escape, false),
                (State::Text, _) => (State::Text, true),
                (State::Escape, '[') => (State::Csi, false),
                (State::Escape, _) | (State::Csi, '@'..='~') => (State::Text, false),
                (State::Csi, _) => (State::Csi, false),
            };
            state = next;
            keep
        })
        .collect()
}

/// Per-command log file: `<cache_home>/orca-nightly/<command>.log`.
#[must_use]
pub fn log_file_path(cache_home: &Path, command: &str) -> PathBuf {
    cache_home
        .join("orca-nightly")
        .join(format!("{command}.log"))
}

/// Where the previous run's log is kept: `<command>.log.old`.
pub(super) fn previous_log_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".old");
    PathBuf::from(name)
}

/// Run header timestamp, RFC 3339 in UTC.
pub(super) fn run_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Per-line timestamp, `HH:MM:SS` in UTC.
pub(super) fn line_timestamp() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
