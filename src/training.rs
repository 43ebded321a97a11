//! Mini-batch training of the beer style classifier.
//!
//! Cross-entropy on the pre-softmax scores, AdamW, seeded shuffling. Weights
//! are saved as safetensors under the tensor names the serving path loads.

use candle_core::{Device, Tensor};
use candle_nn::{AdamW, Optimizer, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::classifier::{BeerClassifier, ModelShape, DEFAULT_DROPOUT, HIDDEN_UNITS, MODEL_DTYPE};
use crate::dataset::LabelledReview;
use crate::errors::{BeerError, BeerResult};
use crate::ordinal_encoder::OrdinalEncoder;
use crate::performance::{evaluate, ClassificationReport};
use crate::preprocess::{FeatureBatch, FeaturePipeline};
use crate::prepare::encode_rows;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub hidden: usize,
    pub dropout: f32,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 512,
            learning_rate: 1e-3,
            hidden: HIDDEN_UNITS,
            dropout: DEFAULT_DROPOUT,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub mean_loss: f64,
}

pub struct TrainedModel {
    pub classifier: BeerClassifier,
    pub epochs: Vec<EpochReport>,
    pub validation: Option<ClassificationReport>,
}

impl TrainedModel {
    pub fn save(&self, path: &Path) -> BeerResult<()> {
        self.classifier.save(path)?;
        info!("Model weights written to {}", path.display());
        Ok(())
    }
}

pub fn labelled_batch(
    pipeline: &FeaturePipeline,
    ordinal_encoder: &OrdinalEncoder,
    rows: &[LabelledReview],
    device: &Device,
) -> BeerResult<FeatureBatch> {
    let (features, targets) = encode_rows(pipeline, ordinal_encoder, rows)?;
    FeatureBatch::labelled(&features, &targets, pipeline.width(), device)
}

pub fn train(
    pipeline: &FeaturePipeline,
    ordinal_encoder: &OrdinalEncoder,
    train_rows: &[LabelledReview],
    val_rows: &[LabelledReview],
    cfg: &TrainingConfig,
    device: &Device,
) -> BeerResult<TrainedModel> {
    if cfg.epochs == 0 || cfg.batch_size == 0 {
        return Err(BeerError::config("epochs and batch size must be positive"));
    }
    if train_rows.is_empty() {
        return Err(BeerError::dataset("no training rows"));
    }

    let shape = ModelShape::new(pipeline.width(), cfg.hidden, ordinal_encoder.len());
    let data = labelled_batch(pipeline, ordinal_encoder, train_rows, device)?;

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, MODEL_DTYPE, device);
    let model = BeerClassifier::new(shape, cfg.dropout, vb)?;
    let mut opt = AdamW::new_lr(varmap.all_vars(), cfg.learning_rate)?;

    info!(
        "Training {:?} on {} rows: {} epochs, batch size {}",
        shape,
        data.rows(),
        cfg.epochs,
        cfg.batch_size
    );

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut order: Vec<u32> = (0..data.rows() as u32).collect();
    let mut epochs = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        order.shuffle(&mut rng);
        let mut total_loss = 0.0;
        let mut batches = 0usize;

        for chunk in order.chunks(cfg.batch_size) {
            let idx = Tensor::from_slice(chunk, chunk.len(), device)?;
            let xb = data.x.index_select(&idx, 0)?;
            let yb = data.y.index_select(&idx, 0)?;

            let logits = model.logits(&xb, true)?;
            let loss = candle_nn::loss::cross_entropy(&logits, &yb)?;
            opt.backward_step(&loss)?;

            total_loss += loss.to_scalar::<f64>()?;
            batches += 1;
        }

        let mean_loss = total_loss / batches as f64;
        info!("Epoch {epoch}/{}, Loss: {mean_loss:.6}", cfg.epochs);
        epochs.push(EpochReport { epoch, mean_loss });
    }

    let classifier = model.eval();
    let validation = if val_rows.is_empty() {
        None
    } else {
        let val = labelled_batch(pipeline, ordinal_encoder, val_rows, device)?;
        let report = evaluate("validation", &classifier, &val)?;
        info!("{report}");
        Some(report)
    };

    Ok(TrainedModel {
        classifier,
        epochs,
        validation,
    })
}
