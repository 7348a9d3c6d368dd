//! CLI entry point and dispatch
//!
//! `run()` owns all output, errors included. `main.rs` only maps the
//! returned code to the process exit status.

use clap::Parser;

use plancoach_config::Config;
use plancoach_utils::error::PlanCoachError;
use plancoach_utils::exit_codes::ExitCode;
use plancoach_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;

pub fn run() -> Result<(), ExitCode> {
    // A missing .env is normal
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Providers) {
        return commands::print_providers().map_err(report);
    }

    let config = Config::discover(&cli.to_cli_args()).map_err(|e| report(e.into()))?;

    if let Err(err) = init_tracing(config.logging.verbose, config.logging.json) {
        eprintln!("⚠ Logging could not be initialized: {err}");
    }
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let result = match cli.command {
        Commands::Serve { .. } => commands::serve(&config),
        Commands::Check => commands::check(&config),
        Commands::Config { json } => commands::print_config(&config, json),
        Commands::Providers => commands::print_providers(),
    };

    result.map_err(report)
}

/// Print a redacted, contextual error report and pick the exit code.
fn report(err: PlanCoachError) -> ExitCode {
    eprintln!("{}", err.display_for_user());
    err.to_exit_code()
}
