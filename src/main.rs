//! `orca-nightly` binary entry point.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use orca_nightly::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let command = args.command.log_name();

    let log_file = commands::Environment::from_process()
        .ok()
        .map(|env| logging::log_file_path(&env.cache_home(), command));
    let color = std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty());
    logging::init_subscriber(args.verbose, color, log_file.as_deref());
    let log = Arc::new(logging::Logger::new(log_file));

    match args.command {
        cli::Command::Update(opts) => commands::update::run(&args.global, &opts, &log),
        cli::Command::Status => commands::status::run(&args.global, log.as_ref()),
        cli::Command::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
        cli::Command::Version => commands::version::run(),
    }
}
