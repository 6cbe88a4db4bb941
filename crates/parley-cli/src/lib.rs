//! Parley command-line interface.

pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parley - conversational context manager and chat gateway
#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "PARLEY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP chat gateway
    Serve(commands::serve::ServeArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Estimate the token count of some text
    Estimate(commands::estimate::EstimateArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config_path).await,
        Commands::Config(args) => commands::config::run(args, config_path),
        Commands::Estimate(args) => commands::estimate::run(args),
        Commands::Version => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
