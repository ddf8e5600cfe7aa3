mod cli;
mod commands;
mod error;
mod events;
mod judgments;
mod model;
mod stats;
mod util;
mod validation;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let stats_enabled = !cli.disable_stats;

    match cli.command {
        Commands::Import(args) => commands::import::run(args, stats_enabled),
        Commands::Coec(args) => commands::coec::run(args, stats_enabled),
        Commands::Run(args) => commands::run::run(args, stats_enabled),
        Commands::LoadEvents(args) => commands::load_events::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
