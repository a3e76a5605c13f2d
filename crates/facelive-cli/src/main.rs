use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod replay;

#[derive(Parser)]
#[command(name = "facelive", version, about = "Blink-based face liveness tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON-lines detection log through the liveness engine
    Replay {
        /// Log file, one detection event per line
        log: PathBuf,
        /// TOML configuration file (defaults to FACELIVE_* environment settings)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print each state as JSON instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Print the default configuration as TOML
    Defaults,
    /// Load and validate a configuration file
    CheckConfig {
        /// TOML configuration file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay { log, config, json } => replay::run(&log, config.as_deref(), json),
        Command::Defaults => replay::print_defaults(),
        Command::CheckConfig { path } => replay::check_config(&path),
    }
}
