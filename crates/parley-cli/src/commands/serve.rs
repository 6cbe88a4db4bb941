//! Serve command.

use clap::Args;
use parley_core::Config;
use parley_gateway::Gateway;
use std::path::Path;
use tracing::info;

/// Serve command arguments.
#[derive(Args)]
pub struct ServeArgs {
    /// Bind address (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Port number (overrides the config file and PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Resolve the effective configuration: file, then environment, then flags.
pub fn resolve_config(args: &ServeArgs, config_path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(config_path)?;
    config.apply_env();

    if let Some(host) = &args.host {
        config.gateway.host = host.clone();
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Run the serve command.
pub async fn run(args: ServeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = resolve_config(&args, config_path)?;

    info!(
        max_tokens = config.context.max_tokens,
        keep_recent = config.context.keep_recent,
        summary_timeout_secs = config.summarizer.timeout_secs,
        "Starting Parley gateway"
    );

    let gateway = Gateway::from_config(config)?;
    gateway.run().await?;
    Ok(())
}
