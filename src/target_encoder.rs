use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{BeerError, BeerResult};
use crate::review::ReviewRecord;

pub const DEFAULT_SMOOTHING: f64 = 0.5;
pub const DEFAULT_MIN_SAMPLES_LEAF: f64 = 1.0;

/// Multiclass target encoder for one categorical column.
///
/// The target is expanded one-vs-rest and the first class is dropped, so a
/// label space of K classes yields K - 1 encoded columns. Each column holds
/// the smoothed frequency of its class among rows sharing the category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoder {
    pub column: String,
    pub smoothing: f64,
    pub min_samples_leaf: f64,
    /// Target codes with an encoded column, in column order.
    classes: Vec<u32>,
    priors: Vec<f64>,
    mapping: BTreeMap<String, Vec<f64>>,
}

impl TargetEncoder {
    pub fn fit(
        column: impl Into<String>,
        categories: &[&str],
        targets: &[u32],
        num_classes: usize,
        smoothing: f64,
    ) -> BeerResult<Self> {
        if categories.len() != targets.len() {
            return Err(BeerError::dataset(format!(
                "{} categories but {} targets",
                categories.len(),
                targets.len()
            )));
        }
        if categories.is_empty() {
            return Err(BeerError::dataset("cannot fit target encoder on zero rows"));
        }
        if num_classes < 2 {
            return Err(BeerError::dataset("target encoding needs at least two classes"));
        }
        if smoothing <= 0.0 {
            return Err(BeerError::config("target encoder smoothing must be positive"));
        }

        let min_samples_leaf = DEFAULT_MIN_SAMPLES_LEAF;
        let rows = categories.len() as f64;

        let mut class_totals = vec![0usize; num_classes];
        let mut per_category: BTreeMap<&str, (usize, Vec<usize>)> = BTreeMap::new();
        for (&category, &target) in categories.iter().zip(targets) {
            let code = target as usize;
            if code >= num_classes {
                return Err(BeerError::dataset(format!(
                    "target code {code} outside {num_classes} classes"
                )));
            }
            class_totals[code] += 1;
            let entry = per_category
                .entry(category)
                .or_insert_with(|| (0, vec![0; num_classes]));
            entry.0 += 1;
            entry.1[code] += 1;
        }

        let classes: Vec<u32> = (1..num_classes as u32).collect();
        let priors: Vec<f64> = classes
            .iter()
            .map(|&c| class_totals[c as usize] as f64 / rows)
            .collect();

        let mapping = per_category
            .into_iter()
            .map(|(category, (count, hits))| {
                let values = classes
                    .iter()
                    .zip(&priors)
                    .map(|(&c, &prior)| {
                        if count == 1 {
                            return prior;
                        }
                        let mean = hits[c as usize] as f64 / count as f64;
                        let weight =
                            1.0 / (1.0 + (-(count as f64 - min_samples_leaf) / smoothing).exp());
                        prior * (1.0 - weight) + mean * weight
                    })
                    .collect();
                (category.to_string(), values)
            })
            .collect();

        Ok(Self {
            column: column.into(),
            smoothing,
            min_samples_leaf,
            classes,
            priors,
            mapping,
        })
    }

    /// Number of encoded output columns.
    pub fn width(&self) -> usize {
        self.classes.len()
    }

    pub fn feature_columns(&self) -> Vec<String> {
        self.classes
            .iter()
            .map(|c| format!("{}_{c}", self.column))
            .collect()
    }

    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    pub fn knows(&self, category: &str) -> bool {
        self.mapping.contains_key(category)
    }

    /// Encode a category value; unseen categories take the class priors.
    pub fn encode(&self, category: &str) -> &[f64] {
        self.mapping
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&self.priors)
    }

    pub fn transform(&self, record: &ReviewRecord) -> BeerResult<Vec<f64>> {
        let category = record
            .categorical(&self.column)
            .map_err(|_| BeerError::schema(&self.column, "target encoder"))?;
        Ok(self.encode(category).to_vec())
    }

    pub fn check(&self) -> BeerResult<()> {
        let width = self.classes.len();
        if width == 0 || self.priors.len() != width {
            return Err(BeerError::artifact(
                "target_encoder",
                "class and prior lists must be non-empty and equally long",
            ));
        }
        if let Some((category, _)) = self.mapping.iter().find(|(_, v)| v.len() != width) {
            return Err(BeerError::artifact(
                "target_encoder",
                format!("category '{category}' has the wrong number of encoded values"),
            ));
        }
        Ok(())
    }
}
