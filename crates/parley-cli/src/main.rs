//! Parley CLI entry point.

use clap::Parser;
use parley_cli::{logging, run, Cli};
use parley_core::{env, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables take precedence
    let _ = env::load_dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads cleanly
    let logging_config = Config::load_or_default(cli.config.as_deref())
        .map(|config| config.logging)
        .unwrap_or_default();
    logging::init_logging(&logging_config, cli.verbose);

    run(cli).await
}
