//! Optional launch of the freshly installed build.
use std::io::{self, IsTerminal as _};
use std::path::Path;

use console::{Key, Term};

use crate::exec::Executor;
use crate::logging::Log;

/// How the launch stage decides whether to start the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    /// Ask on the terminal.
    #[default]
    Ask,
    /// Launch without asking.
    Always,
    /// Skip the stage.
    Never,
}

/// Source of yes/no answers.
pub trait Confirm: Send + Sync + std::fmt::Debug {
    /// Ask `question`; `true` only for an affirmative answer.
    fn confirm(&self, question: &str) -> bool;
}

/// Whether a key read answers "yes". Only `y` or `Y` does; a failed read
/// is a no.
#[must_use]
pub const fn is_affirmative(key: &io::Result<Key>) -> bool {
    matches!(key, Ok(Key::Char('y' | 'Y')))
}

/// [`Confirm`] answered by a single keystroke on the terminal.
///
/// A non-interactive stdin is answered "no" without printing the question.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, question: &str) -> bool {
        if !io::stdin().is_terminal() {
            return false;
        }

        let term = Term::stdout();
        if term.write_str(&format!("{question} [y/N] ")).is_err() {
            return false;
        }
        let key = term.read_key();
        let _ = term.write_line("");
        is_affirmative(&key)
    }
}

/// Run the launch stage for the stable link at `link`.
///
/// Returns `true` when the application was started. A failed spawn is
/// logged as a warning; the install itself already succeeded.
pub fn offer(
    mode: LaunchMode,
    app_name: &str,
    link: &Path,
    confirm: &dyn Confirm,
    executor: &dyn Executor,
    log: &dyn Log,
) -> bool {
    let wanted = match mode {
        LaunchMode::Never => false,
        LaunchMode::Always => true,
        LaunchMode::Ask => confirm.confirm(&format!("Launch {app_name} now?")),
    };
    if !wanted {
        log.debug("launch declined");
        return false;
    }

    match executor.spawn_detached(link) {
        Ok(()) => {
            log.info(&format!("launched {app_name}"));
            true
        }
        Err(e) => {
            log.warn(&format!("could not launch {}: {e:#}", link.display()));
            false
        }
    }
}
