//! Service context for the prediction endpoints.
//!
//! Built once at startup from the artifact store and shared read-only with
//! every request handler.

use candle_core::Device;
use tracing::debug;

use crate::artifacts::ArtifactStore;
use crate::classifier::ModelArchitecture;
use crate::config_loader::BeerConfig;
use crate::decoder::PredictionDecoder;
use crate::errors::{BeerError, BeerResult};
use crate::preprocess::FeatureBatch;
use crate::review::{PredictedReview, ReviewRecord};

#[derive(Debug, Clone)]
pub struct BeerStylePredictor {
    store: ArtifactStore,
    device: Device,
}

impl BeerStylePredictor {
    pub fn new(store: ArtifactStore, device: Device) -> Self {
        Self { store, device }
    }

    /// Load every artifact named by the config onto the CPU.
    pub fn load(config: &BeerConfig) -> BeerResult<Self> {
        let device = Device::Cpu;
        let store = ArtifactStore::load(&config.artefacts, &config.model, &device)?;
        Ok(Self::new(store, device))
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn labels(&self) -> &[String] {
        self.store.ordinal_encoder.categories()
    }

    pub fn architecture(&self) -> ModelArchitecture {
        self.store.classifier.architecture()
    }

    /// Class distribution for one record.
    pub fn probabilities(&self, record: &ReviewRecord) -> BeerResult<Vec<f64>> {
        record.validate()?;
        let features = self.store.pipeline.transform(record)?;
        let batch =
            FeatureBatch::from_vectors(&[features], self.store.pipeline.width(), &self.device)?;
        self.store
            .classifier
            .probabilities(&batch.x)?
            .into_iter()
            .next()
            .ok_or_else(|| BeerError::internal("classifier returned no rows"))
    }

    pub fn predict_style(&self, record: &ReviewRecord) -> BeerResult<String> {
        let probabilities = self.probabilities(record)?;
        let style = PredictionDecoder::new(&self.store.ordinal_encoder).decode(&probabilities)?;
        debug!("{} -> {}", record.brewery_name, style);
        Ok(style.to_string())
    }

    pub fn predict(&self, record: ReviewRecord) -> BeerResult<PredictedReview> {
        let style = self.predict_style(&record)?;
        Ok(record.with_style(style))
    }

    /// Sequential and all-or-nothing: the first failing record aborts the
    /// batch and the error carries its index.
    pub fn predict_batch(&self, records: Vec<ReviewRecord>) -> BeerResult<Vec<PredictedReview>> {
        let mut predictions = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let predicted = self
                .predict(record)
                .map_err(|e| e.in_batch_item(index))?;
            predictions.push(predicted);
        }
        Ok(predictions)
    }
}
