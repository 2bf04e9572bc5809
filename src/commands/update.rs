//! Command: resolve, select, install, integrate, and optionally launch.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{GlobalOpts, UpdateOpts};
use crate::context::Context;
use crate::desktop::{self, DesktopOutcome};
use crate::install::{self, InstallOutcome};
use crate::launch::{self, LaunchMode};
use crate::logging::{Log, Logger, StageStatus};
use crate::preflight;
use crate::release;
use crate::select::{Selection, SelectionPolicy};

/// The stages of an update, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Required tools are present.
    Preflight,
    /// A release with assets was found.
    Resolve,
    /// An asset was chosen.
    Select,
    /// The artifact was downloaded and linked.
    Install,
    /// Icon and menu entry were written.
    Desktop,
    /// The application was offered for launch.
    Launch,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Self; 6] = [
        Self::Preflight,
        Self::Resolve,
        Self::Select,
        Self::Install,
        Self::Desktop,
        Self::Launch,
    ];

    /// Human-readable stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preflight => "Check requirements",
            Self::Resolve => "Resolve release",
            Self::Select => "Select asset",
            Self::Install => "Install artifact",
            Self::Desktop => "Desktop integration",
            Self::Launch => "Launch",
        }
    }
}

/// What an update run did, stage by stage.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// Repository the release came from.
    pub repository: Option<String>,
    /// The chosen asset.
    pub selection: Option<Selection>,
    /// Install result; `None` in dry-run mode.
    pub install: Option<InstallOutcome>,
    /// Desktop integration result; `None` in dry-run mode.
    pub desktop: Option<DesktopOutcome>,
    /// Whether the application was started.
    pub launched: bool,
}

/// Record the outcome of a fatal stage and pass the value or error on.
///
/// A failure is also logged as an error so it reaches the run log.
fn finish<T, E>(log: &dyn Log, stage: Stage, result: Result<T, E>) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    result.map_err(|e| {
        let e = e.into();
        let detail = format!("{e:#}");
        log.error(&format!("{}: {detail}", stage.name()));
        log.record_stage(stage.name(), StageStatus::Failed, Some(&detail));
        e
    })
}

/// Run every stage against `ctx`.
///
/// Stages up to and including install are fatal. Desktop integration and
/// launch only ever degrade to `skipped`.
///
/// # Errors
///
/// Returns the first fatal stage error, typically an
/// [`UpdateError`](crate::error::UpdateError).
pub fn execute(ctx: &Context, launch_mode: LaunchMode) -> Result<UpdateReport> {
    let log = ctx.log.as_ref();
    let mut report = UpdateReport::default();

    log.stage(Stage::Preflight.name());
    finish(
        log,
        Stage::Preflight,
        preflight::check(&ctx.config.requirements, ctx.executor.as_ref(), log),
    )?;
    log.record_stage(Stage::Preflight.name(), StageStatus::Ok, None);

    log.stage(Stage::Resolve.name());
    let release = finish(
        log,
        Stage::Resolve,
        release::resolve(&ctx.config, ctx.transport.as_ref(), log),
    )?;
    log.record_stage(
        Stage::Resolve.name(),
        StageStatus::Ok,
        Some(&release.repository),
    );
    report.repository = Some(release.repository.clone());

    log.stage(Stage::Select.name());
    let policy = SelectionPolicy::from_config(&ctx.config.selection);
    let selection = finish(log, Stage::Select, policy.select_from(&release))?;
    log.info(&format!("{}: {}", selection.tier, selection.asset.name));
    log.record_stage(
        Stage::Select.name(),
        StageStatus::Ok,
        Some(&selection.asset.name),
    );
    let url = selection.url().to_string();
    report.selection = Some(selection);

    log.stage(Stage::Install.name());
    let plan = finish(log, Stage::Install, install::plan(&ctx.layout, &url))?;

    if ctx.dry_run {
        install::preview(&plan, log);
        log.record_stage(Stage::Install.name(), StageStatus::DryRun, None);
        log.stage(Stage::Desktop.name());
        desktop::preview(&ctx.layout, log);
        log.record_stage(Stage::Desktop.name(), StageStatus::DryRun, None);
        log.record_stage(Stage::Launch.name(), StageStatus::Skipped, Some("dry run"));
        return Ok(report);
    }

    let outcome = finish(
        log,
        Stage::Install,
        install::apply(&plan, ctx.transport.as_ref(), log),
    )?;
    let note = outcome.backed_up.as_ref().map_or_else(
        || artifact_name(&outcome),
        |bak| format!("{}, previous kept as {}", artifact_name(&outcome), bak.display()),
    );
    log.record_stage(Stage::Install.name(), StageStatus::Ok, Some(&note));

    log.stage(Stage::Desktop.name());
    let integration = desktop::integrate(
        &outcome.artifact,
        &ctx.layout,
        &ctx.config.desktop,
        ctx.extractor.as_ref(),
        ctx.executor.as_ref(),
        log,
    );
    if integration.degraded() {
        log.record_stage(
            Stage::Desktop.name(),
            StageStatus::Skipped,
            Some("partially applied, see warnings"),
        );
    } else {
        log.record_stage(Stage::Desktop.name(), StageStatus::Ok, None);
    }
    report.desktop = Some(integration);

    if launch_mode != LaunchMode::Never {
        log.stage(Stage::Launch.name());
    }
    report.launched = launch::offer(
        launch_mode,
        &ctx.config.desktop.name,
        &outcome.link,
        ctx.confirm.as_ref(),
        ctx.executor.as_ref(),
        log,
    );
    if report.launched {
        log.record_stage(Stage::Launch.name(), StageStatus::Ok, None);
    } else {
        log.record_stage(Stage::Launch.name(), StageStatus::Skipped, Some("not launched"));
    }
    report.install = Some(outcome);

    Ok(report)
}

fn artifact_name(outcome: &InstallOutcome) -> String {
    outcome
        .artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run the `update` command.
///
/// # Errors
///
/// Returns an error if setup fails or any fatal stage fails.
pub fn run(global: &GlobalOpts, opts: &UpdateOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.as_ref())?;
    let ctx = Context::new(
        setup.config,
        setup.layout,
        Arc::clone(log) as Arc<dyn Log>,
        opts.dry_run,
    );

    let result = execute(&ctx, opts.launch_mode());
    log.print_summary();
    result.map(|_| ())
}
