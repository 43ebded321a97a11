// deep_beer - main.rs
// Loads config, installs logging, then hands off to the CLI dispatcher.

use clap::Parser;
use deep_beer::cli::{dispatch, resolve_config, Cli};
use std::process::exit;

fn main() {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ {e:#}");
            exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    if let Err(e) = dispatch(cli, config) {
        tracing::error!("{e:#}");
        exit(1);
    }
}
