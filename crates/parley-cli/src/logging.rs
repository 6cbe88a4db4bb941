//! Logging setup.

use parley_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Library targets held at `warn` unless `RUST_LOG` says otherwise.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "tower_http",
];

/// Log level after applying `-v` flags on top of the configured level.
pub fn effective_level(config: &LoggingConfig, verbose: u8) -> &'static str {
    match verbose {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    }
}

/// Filter directives for the Parley crates at `level`.
///
/// Targets match by prefix, so `parley` covers every `parley_*` crate.
pub fn directives(level: &str) -> String {
    let mut directives = format!("parley={}", level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }
    directives
}

/// Initialize the global subscriber on stderr. `RUST_LOG` overrides the config.
pub fn init_logging(config: &LoggingConfig, verbose: u8) {
    let level = effective_level(config, verbose);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(std::io::stderr);
            let _ = subscriber.with(layer).try_init();
        }
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);
            let _ = subscriber.with(layer).try_init();
        }
    }

    tracing::debug!(level, format = ?config.format, "Logging initialized");
}
