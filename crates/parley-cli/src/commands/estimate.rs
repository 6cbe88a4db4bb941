//! Estimate command.

use clap::Args;
use parley_core::context::estimate;
use std::io::Read;

/// Estimate command arguments.
#[derive(Args)]
pub struct EstimateArgs {
    /// Text to estimate; read from stdin when omitted
    pub text: Vec<String>,
}

/// Run the estimate command.
pub fn run(args: EstimateArgs) -> anyhow::Result<()> {
    let text = if args.text.is_empty() {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        args.text.join(" ")
    };

    println!("{}", estimate(&text));
    Ok(())
}
