use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config_loader::{load_config, BeerConfig};
use crate::predictor::BeerStylePredictor;
use crate::review::ReviewRecord;

/// Top-level CLI interface for the deep beer service
#[derive(Parser)]
#[command(
    name = "deep_beer",
    version,
    about = "Beer style prediction service"
)]
pub struct Cli {
    /// Path to a TOML config file (defaults to deep_beer.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (health, model metadata, predictions)
    Serve {
        /// Host/IP to bind, overrides the config file
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Predict styles for a JSON review object or array and print the result
    Predict {
        #[arg(long)]
        json: String,
    },

    /// Print the loaded model architecture
    Architecture,

    /// Print the effective configuration as TOML
    Config,
}

/// Input of the `predict` command: one record or a list, like the HTTP API.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PredictInput {
    Many(Vec<ReviewRecord>),
    One(ReviewRecord),
}

pub fn resolve_config(cli: &Cli) -> anyhow::Result<BeerConfig> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Commands::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }
    Ok(config)
}

pub fn dispatch(cli: Cli, config: BeerConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { .. } => {
            let predictor =
                BeerStylePredictor::load(&config).context("Failed to load artefacts")?;
            info!("Serving {} beer styles", predictor.labels().len());

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to build Tokio runtime")?;
            rt.block_on(crate::beerweb::serve(Arc::new(predictor), &config.server))
        }
        Commands::Predict { json } => {
            let predictor =
                BeerStylePredictor::load(&config).context("Failed to load artefacts")?;
            let input: PredictInput =
                serde_json::from_str(&json).context("Input is not a review object or array")?;
            let output = match input {
                PredictInput::One(record) => serde_json::to_string_pretty(&predictor.predict(record)?)?,
                PredictInput::Many(records) => {
                    serde_json::to_string_pretty(&predictor.predict_batch(records)?)?
                }
            };
            println!("{output}");
            Ok(())
        }
        Commands::Architecture => {
            let predictor =
                BeerStylePredictor::load(&config).context("Failed to load artefacts")?;
            let architecture = predictor.architecture();
            println!("{architecture}");
            println!("Parameters: {}", architecture.parameters);
            Ok(())
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
