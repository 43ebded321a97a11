//! Preprocessing pipeline: review record -> fixed-width feature vector.
//!
//! Feature order is the scaled rating columns followed by the target-encoded
//! brewery columns. This is the order the model was trained on; changing it
//! silently corrupts predictions.

use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};

use crate::errors::{BeerError, BeerResult};
use crate::min_max_scaler::MinMaxScaler;
use crate::review::ReviewRecord;
use crate::target_encoder::TargetEncoder;

/// Placeholder target attached to rows that are only used for inference.
pub const UNLABELLED_TARGET: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Rows packaged for the classifier, like the dataset the model was trained with.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    pub x: Tensor,
    pub y: Tensor,
}

impl FeatureBatch {
    pub fn rows(&self) -> usize {
        self.x.dims().first().copied().unwrap_or(0)
    }

    pub fn from_vectors(vectors: &[FeatureVector], width: usize, device: &Device) -> BeerResult<Self> {
        let flat = flatten(vectors, width)?;
        let x = Tensor::from_vec(flat, (vectors.len(), width), device)?;
        let y = Tensor::full(UNLABELLED_TARGET, vectors.len(), device)?;
        Ok(Self { x, y })
    }

    pub fn labelled(
        vectors: &[FeatureVector],
        targets: &[u32],
        width: usize,
        device: &Device,
    ) -> BeerResult<Self> {
        if vectors.len() != targets.len() {
            return Err(BeerError::dataset(format!(
                "{} feature rows but {} targets",
                vectors.len(),
                targets.len()
            )));
        }
        let flat = flatten(vectors, width)?;
        let x = Tensor::from_vec(flat, (vectors.len(), width), device)?;
        let y = Tensor::from_vec(targets.to_vec(), targets.len(), device)?;
        Ok(Self { x, y })
    }
}

fn flatten(vectors: &[FeatureVector], width: usize) -> BeerResult<Vec<f64>> {
    let mut flat = Vec::with_capacity(vectors.len() * width);
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != width {
            return Err(BeerError::internal(format!(
                "feature row {i} has width {}, expected {width}",
                v.len()
            )));
        }
        flat.extend_from_slice(v.as_slice());
    }
    Ok(flat)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    pub target_encoder: TargetEncoder,
    pub scaler: MinMaxScaler,
}

impl FeaturePipeline {
    pub fn new(target_encoder: TargetEncoder, scaler: MinMaxScaler) -> BeerResult<Self> {
        target_encoder.check()?;
        scaler.check()?;
        if scaler.columns.iter().any(|c| *c == target_encoder.column) {
            return Err(BeerError::artifact(
                "min_max_scaler",
                format!("column '{}' is also target encoded", target_encoder.column),
            ));
        }
        Ok(Self {
            target_encoder,
            scaler,
        })
    }

    pub fn width(&self) -> usize {
        self.scaler.columns.len() + self.target_encoder.width()
    }

    pub fn feature_columns(&self) -> Vec<String> {
        let mut columns = self.scaler.columns.clone();
        columns.extend(self.target_encoder.feature_columns());
        columns
    }

    pub fn transform(&self, record: &ReviewRecord) -> BeerResult<FeatureVector> {
        let encoded = self.target_encoder.transform(record)?;
        let mut features = self.scaler.transform(record)?;
        features.extend(encoded);
        Ok(FeatureVector(features))
    }

    /// Transform records into an inference batch with placeholder targets.
    pub fn batch(&self, records: &[ReviewRecord], device: &Device) -> BeerResult<FeatureBatch> {
        let vectors = records
            .iter()
            .map(|r| self.transform(r))
            .collect::<BeerResult<Vec<_>>>()?;
        FeatureBatch::from_vectors(&vectors, self.width(), device)
    }
}
