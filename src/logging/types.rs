//! Stage records and the [`Log`] trait the pipeline logs through.

/// One line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEntry {
    /// Stage name as shown in the summary.
    pub name: String,
    /// How the stage ended.
    pub status: StageStatus,
    /// Detail shown in parentheses, such as the chosen asset or a skip reason.
    pub message: Option<String>,
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Completed.
    Ok,
    /// Not run, or only partly applied (fallback icon, launch declined).
    Skipped,
    /// Described but not applied.
    DryRun,
    /// Ended the run.
    Failed,
}

impl StageStatus {
    /// Summary marker.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Skipped => "○",
            Self::DryRun => "~",
            Self::Failed => "✗",
        }
    }

    /// Word used in the summary tally.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }

    /// SGR color code.
    pub(super) const fn color(self) -> &'static str {
        match self {
            Self::Ok => "32",
            Self::Skipped => "33",
            Self::DryRun => "37",
            Self::Failed => "31",
        }
    }
}

/// Logging backend used by every pipeline stage.
///
/// Stages take `&dyn Log` so unit tests can run against an isolated
/// subscriber.
pub trait Log: Send + Sync {
    /// Stage header.
    fn stage(&self, msg: &str);
    /// Progress line.
    fn info(&self, msg: &str);
    /// Detail line, shown on the console only with `--verbose`.
    fn debug(&self, msg: &str);
    /// Recoverable problem.
    fn warn(&self, msg: &str);
    /// Fatal problem.
    fn error(&self, msg: &str);
    /// A change that `--dry-run` skipped.
    fn dry_run(&self, msg: &str);
    /// Record how a stage ended, for the summary.
    fn record_stage(&self, name: &str, status: StageStatus, message: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_distinct_symbol_and_label() {
        let all = [
            StageStatus::Ok,
            StageStatus::Skipped,
            StageStatus::DryRun,
            StageStatus::Failed,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.symbol(), b.symbol());
                assert_ne!(a.label(), b.label());
            }
        }
    }
}
