//! Configuration management commands.

use clap::Args;
use parley_core::config::{Config, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// Run the config command.
pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let mut config = Config::load_or_default(config_path)?;
            config.apply_env();
            println!("{}", render(&config)?);
        }

        ConfigCommand::Validate => {
            let config = Config::load_or_default(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            match config.validate() {
                Ok(()) => println!("Configuration is valid"),
                Err(e) => anyhow::bail!("Configuration error: {}", e),
            }
        }

        ConfigCommand::Path => {
            println!("{}", target_path(config_path).display());
        }

        ConfigCommand::Init { force } => {
            let path = target_path(config_path);
            init(&path, force)?;
            println!("Created config file: {:?}", path);
        }
    }

    Ok(())
}

/// File the config commands read from or write to.
fn target_path(explicit: Option<&Path>) -> PathBuf {
    Config::resolve_path(explicit).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Pretty JSON with the API key masked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    let mut json = serde_json::to_value(config)?;
    if let Some(key) = &config.provider.api_key {
        json["provider"]["api_key"] = serde_json::Value::String(key.masked());
    }
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Write the default configuration to `path`.
pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {:?}. Use --force to overwrite.",
            path
        );
    }
    Config::default().save(path)?;
    Ok(())
}
