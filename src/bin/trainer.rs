use anyhow::Context;
use candle_core::Device;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use deep_beer::artifacts::{load_transformers, write_manifest};
use deep_beer::classifier::BeerClassifier;
use deep_beer::config_loader::ArtefactConfig;
use deep_beer::dataset::ReviewDataset;
use deep_beer::performance::{check_predictions, evaluate};
use deep_beer::prepare::FittedTransformers;
use deep_beer::target_encoder::DEFAULT_SMOOTHING;
use deep_beer::training::{labelled_batch, train, TrainingConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline preparation and training for deep_beer")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the target encoder, ordinal encoder and min-max scaler
    Prepare {
        #[arg(short, long)]
        csv: PathBuf,

        #[arg(short, long, default_value = "artefacts")]
        out: PathBuf,

        #[arg(long, default_value_t = DEFAULT_SMOOTHING)]
        smoothing: f64,
    },

    /// Train the classifier on prepared transformers and write weights + manifest
    Train {
        #[arg(short, long)]
        csv: PathBuf,

        #[arg(short, long, default_value = "artefacts")]
        artefacts: PathBuf,

        #[arg(long, default_value_t = 10)]
        epochs: usize,

        #[arg(long, default_value_t = 512)]
        batch_size: usize,

        #[arg(long, default_value_t = 1e-3)]
        learning_rate: f64,

        #[arg(long, default_value_t = 256)]
        hidden: usize,

        #[arg(long, default_value_t = 0.5)]
        dropout: f32,

        #[arg(long, default_value_t = 0.2)]
        val_fraction: f64,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Score a trained model on a labelled CSV
    Evaluate {
        #[arg(short, long)]
        csv: PathBuf,

        #[arg(short, long, default_value = "artefacts")]
        artefacts: PathBuf,

        #[arg(long, default_value_t = 256)]
        hidden: usize,

        /// Number of predicted-vs-actual rows to print
        #[arg(long, default_value_t = 100)]
        checks: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let device = Device::Cpu;

    match args.command {
        Command::Prepare { csv, out, smoothing } => {
            let dataset = ReviewDataset::from_path(&csv)?;
            let fitted = FittedTransformers::fit(&dataset.rows, smoothing)?;
            let cfg = ArtefactConfig::in_dir(out);
            fitted.save(&cfg)?;
            let pipeline = fitted.pipeline()?;
            println!(
                "✅ Transformers written to {} ({} features, {} styles)",
                cfg.dir.display(),
                pipeline.width(),
                fitted.ordinal_encoder.len()
            );
        }
        Command::Train {
            csv,
            artefacts,
            epochs,
            batch_size,
            learning_rate,
            hidden,
            dropout,
            val_fraction,
            seed,
        } => {
            let cfg = ArtefactConfig::in_dir(artefacts);
            let (pipeline, ordinal_encoder) =
                load_transformers(&cfg).context("Run `trainer prepare` first")?;
            let dataset = ReviewDataset::from_path(&csv)?;
            let (train_rows, val_rows) = dataset.split(val_fraction, seed)?;

            let training = TrainingConfig {
                epochs,
                batch_size,
                learning_rate,
                hidden,
                dropout,
                seed,
            };
            let trained = train(
                &pipeline,
                &ordinal_encoder,
                &train_rows,
                &val_rows,
                &training,
                &device,
            )?;
            trained.save(&cfg.model_weights_path())?;
            let manifest = write_manifest(&cfg, trained.classifier.shape())?;

            if let Some(report) = &trained.validation {
                println!("{report}");
            }
            println!("✅ Model exported to: {}", cfg.model_weights_path().display());
            println!("✅ Manifest created: {}", cfg.manifest_path().display());
            for (file, sha) in &manifest.files {
                println!("   {file}: {sha}");
            }
        }
        Command::Evaluate {
            csv,
            artefacts,
            hidden,
            checks,
        } => {
            let cfg = ArtefactConfig::in_dir(artefacts);
            let (pipeline, ordinal_encoder) = load_transformers(&cfg)?;
            let shape = deep_beer::classifier::ModelShape::new(
                pipeline.width(),
                hidden,
                ordinal_encoder.len(),
            );
            let classifier = BeerClassifier::load(
                &cfg.model_weights_path(),
                shape,
                deep_beer::classifier::DEFAULT_DROPOUT,
                &device,
            )?;

            let dataset = ReviewDataset::from_path(&csv)?;
            let batch = labelled_batch(&pipeline, &ordinal_encoder, &dataset.rows, &device)?;

            let spot_checks = check_predictions(&classifier, &ordinal_encoder, &batch, checks)?;
            for check in &spot_checks {
                println!("{check}");
            }
            let matches = spot_checks.iter().filter(|c| c.correct()).count();
            println!("{matches} out of {} correct", spot_checks.len());

            let report = evaluate("dataset", &classifier, &batch)?;
            println!("{report}");
        }
    }

    Ok(())
}
