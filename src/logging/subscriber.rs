//! Tracing subscriber: colored console output plus a plain-text run log.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;

use super::utils::{line_timestamp, previous_log_path, run_timestamp, strip_ansi};

/// Target of stage header events.
pub(super) const STAGE_TARGET: &str = "orca_nightly::stage";
/// Target of dry-run events.
pub(super) const DRY_RUN_TARGET: &str = "orca_nightly::dry_run";

/// Pulls the `message` field out of an event.
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut extractor = MessageExtractor::default();
    event.record(&mut extractor);
    extractor.message
}

/// One run log line: `HH:MM:SS tag   message`, escape codes removed.
fn file_line(level: Level, target: &str, msg: &str) -> String {
    let msg = strip_ansi(msg);
    let ts = line_timestamp();
    let tag = match (level, target) {
        (Level::INFO, STAGE_TARGET) => return format!("{ts} ==> {msg}"),
        (Level::INFO, DRY_RUN_TARGET) => "dry",
        (Level::ERROR, _) => "error",
        (Level::WARN, _) => "warn",
        (Level::DEBUG | Level::TRACE, _) => "debug",
        _ => "info",
    };
    format!("{ts} {tag:<5} {msg}")
}

/// Layer appending every event to the run log.
///
/// The previous run's log is kept beside it as `<name>.old`.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Start a new run log at `path`.
    ///
    /// Returns `None` when the file cannot be created; logging then goes to
    /// the console only.
    pub(super) fn at(path: &Path) -> Option<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok()?;
        }
        if path.exists() {
            fs::rename(path, previous_log_path(path)).ok()?;
        }

        let version = option_env!("ORCA_NIGHTLY_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        let mut file = fs::File::create(path).ok()?;
        writeln!(file, "# orca-nightly {version}, run started {}", run_timestamp()).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _: tracing_subscriber::layer::Context<'_, S>) {
        let metadata = event.metadata();
        let line = file_line(*metadata.level(), metadata.target(), &message_of(event));
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

/// Console rendering of one event, without the trailing newline.
fn console_line(level: Level, target: &str, msg: &str) -> String {
    match (level, target) {
        (Level::ERROR, _) => format!("\x1b[31merror:\x1b[0m {msg}"),
        (Level::WARN, _) => format!("\x1b[33mwarning:\x1b[0m {msg}"),
        (Level::INFO, STAGE_TARGET) => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
        (Level::INFO, DRY_RUN_TARGET) => format!("  \x1b[33m[dry run]\x1b[0m {msg}"),
        (Level::INFO, _) => format!("  {msg}"),
        _ => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// Console event format. With `color` off, escape codes are stripped.
struct ConsoleFormatter {
    color: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let line = console_line(*metadata.level(), metadata.target(), &message_of(event));
        if self.color {
            writeln!(writer, "{line}")
        } else {
            writeln!(writer, "{}", strip_ansi(&line))
        }
    }
}

/// Install the global subscriber. Call once, before anything logs.
///
/// Warnings and errors go to stderr, everything else to stdout. `debug`
/// reaches the console only when `verbose` is set but is always written to
/// `log_file`.
pub fn init_subscriber(verbose: bool, color: bool, log_file: Option<&Path>) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));
    let console = fmt::layer()
        .event_format(ConsoleFormatter { color })
        .with_writer(writer)
        .with_filter(console_level);

    let file = log_file
        .and_then(FileLayer::at)
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}
