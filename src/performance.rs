use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::classifier::BeerClassifier;
use crate::decoder::{argmax, PredictionDecoder};
use crate::errors::{BeerError, BeerResult};
use crate::ordinal_encoder::OrdinalEncoder;
use crate::preprocess::FeatureBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Average {
    /// Unweighted mean over labels present in either actuals or predictions.
    Macro,
    /// Mean weighted by each label's support in the actuals.
    Weighted,
}

pub fn accuracy(predicted: &[u32], actual: &[u32]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    hits as f64 / actual.len() as f64
}

/// F1 score averaged over classes; undefined per-class scores count as 0.
pub fn f1_score(predicted: &[u32], actual: &[u32], average: Average) -> f64 {
    let labels: BTreeSet<u32> = predicted.iter().chain(actual).copied().collect();
    if labels.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for &label in &labels {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p == label, a == label) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
        }
        let denom = 2 * tp + fp + fn_;
        let f1 = if denom == 0 { 0.0 } else { 2.0 * tp as f64 / denom as f64 };
        let weight = match average {
            Average::Macro => 1.0,
            Average::Weighted => (tp + fn_) as f64,
        };
        total += f1 * weight;
        weight_sum += weight;
    }

    if weight_sum == 0.0 { 0.0 } else { total / weight_sum }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub set_name: String,
    pub samples: usize,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
}

impl ClassificationReport {
    pub fn new(set_name: impl Into<String>, predicted: &[u32], actual: &[u32]) -> Self {
        Self {
            set_name: set_name.into(),
            samples: actual.len(),
            accuracy: accuracy(predicted, actual),
            macro_f1: f1_score(predicted, actual, Average::Macro),
            weighted_f1: f1_score(predicted, actual, Average::Weighted),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Accuracy {name}: {:.4}\nF1 {name} (macro): {:.4}\nF1 {name} (weighted): {:.4}",
            self.accuracy,
            self.macro_f1,
            self.weighted_f1,
            name = self.set_name
        )
    }
}

/// Argmax class code for every row of a batch.
pub fn predict_codes(classifier: &BeerClassifier, batch: &FeatureBatch) -> BeerResult<Vec<u32>> {
    classifier
        .probabilities(&batch.x)?
        .iter()
        .map(|row| {
            argmax(row)
                .map(|i| i as u32)
                .ok_or_else(|| BeerError::internal("class distribution has no finite maximum"))
        })
        .collect()
}

pub fn evaluate(
    set_name: &str,
    classifier: &BeerClassifier,
    batch: &FeatureBatch,
) -> BeerResult<ClassificationReport> {
    let predicted = predict_codes(classifier, batch)?;
    let actual = batch.y.to_vec1::<u32>()?;
    Ok(ClassificationReport::new(set_name, &predicted, &actual))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotCheck {
    pub index: usize,
    pub predicted: String,
    pub actual: String,
}

impl SpotCheck {
    pub fn correct(&self) -> bool {
        self.predicted == self.actual
    }
}

impl fmt::Display for SpotCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.correct() {
            write!(f, "{}: {} ✅", self.index, self.predicted)
        } else {
            write!(f, "{}: {} | {}", self.index, self.predicted, self.actual)
        }
    }
}

/// Decoded predicted-vs-actual styles for the first `num_checks` rows.
pub fn check_predictions(
    classifier: &BeerClassifier,
    ordinal_encoder: &OrdinalEncoder,
    batch: &FeatureBatch,
    num_checks: usize,
) -> BeerResult<Vec<SpotCheck>> {
    let rows = num_checks.min(batch.rows());
    if rows == 0 {
        return Ok(Vec::new());
    }
    let head = FeatureBatch {
        x: batch.x.narrow(0, 0, rows)?,
        y: batch.y.narrow(0, 0, rows)?,
    };
    let predicted = predict_codes(classifier, &head)?;
    let actual = head.y.to_vec1::<u32>()?;
    let decoder = PredictionDecoder::new(ordinal_encoder);

    predicted
        .iter()
        .zip(&actual)
        .enumerate()
        .map(|(index, (&p, &a))| {
            Ok(SpotCheck {
                index,
                predicted: decoder.decode_index(p as usize)?.to_string(),
                actual: decoder.decode_index(a as usize)?.to_string(),
            })
        })
        .collect()
}
