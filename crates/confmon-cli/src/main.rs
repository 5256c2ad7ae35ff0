//! confmon CLI
//!
//! Resolves effective checks and alert rules from a catalog snapshot and
//! publishes Prometheus rule files.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = context::resolve_settings(cli.config.as_deref())?;

    if let Err(e) = logging::init(&settings.logging.level, cli.verbose) {
        eprintln!("{} logging unavailable: {}", "warning:".yellow().bold(), e);
    }
    tracing::debug!(?settings, "Settings resolved");

    let ctx = Context::new(settings, cli.catalog, cli.json);
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Checks { target } => commands::run_checks(ctx, &target),
        Commands::Alerts { target } => commands::run_alerts(ctx, &target),
        Commands::Generate { group } => commands::run_generate(ctx, group),
        Commands::Settings => commands::run_settings(ctx),
    }
}
