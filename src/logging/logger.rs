//! [`Logger`]: the production [`Log`] backend.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, StageEntry, StageStatus};

/// Emits every message as a [`tracing`] event and collects stage results
/// for the closing summary.
///
/// Rendering is left to the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber).
#[derive(Debug, Default)]
pub struct Logger {
    stages: Mutex<Vec<StageEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger whose summary points at `log_file`.
    ///
    /// The file itself is written by the subscriber's file layer.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            stages: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Path of the run log, if one is kept.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Snapshot of the recorded stages, in order.
    #[must_use]
    pub fn stage_entries(&self) -> Vec<StageEntry> {
        self.stages
            .lock()
            .map(|stages| stages.clone())
            .unwrap_or_default()
    }

    /// Number of stages recorded as failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.stage_entries()
            .iter()
            .filter(|s| s.status == StageStatus::Failed)
            .count()
    }

    /// Log the summary of every recorded stage. Does nothing when no stage
    /// was recorded.
    pub fn print_summary(&self) {
        let stages = self.stage_entries();
        if stages.is_empty() {
            return;
        }
        self.stage("Summary");
        for line in summary_lines(&stages) {
            self.info(&line);
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

/// Render `stages` as colored summary lines followed by a tally of the
/// statuses that occurred.
fn summary_lines(stages: &[StageEntry]) -> Vec<String> {
    let mut lines: Vec<String> = stages
        .iter()
        .map(|stage| {
            let detail = stage
                .message
                .as_deref()
                .map(|m| format!(" ({m})"))
                .unwrap_or_default();
            format!(
                "\x1b[{}m{} {}{detail}\x1b[0m",
                stage.status.color(),
                stage.status.symbol(),
                stage.name
            )
        })
        .collect();

    let tally: Vec<String> = [
        StageStatus::Ok,
        StageStatus::Skipped,
        StageStatus::DryRun,
        StageStatus::Failed,
    ]
    .into_iter()
    .filter_map(|status| {
        let n = stages.iter().filter(|s| s.status == status).count();
        (n > 0).then(|| format!("\x1b[{}m{n} {}\x1b[0m", status.color(), status.label()))
    })
    .collect();
    lines.push(format!("{} stages: {}", stages.len(), tally.join(", ")));
    lines
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    fn record_stage(&self, name: &str, status: StageStatus, message: Option<&str>) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(StageEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
