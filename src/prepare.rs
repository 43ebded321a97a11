//! Fitting the preprocessing transformers on a labelled review set.
//!
//! Fit order: ordinal-encode the beer styles, target-encode the brewery
//! against those codes, then fit the min-max scaler on the four ratings.

use tracing::info;

use crate::config_loader::ArtefactConfig;
use crate::dataset::{LabelledReview, BEER_STYLE};
use crate::errors::{BeerError, BeerResult};
use crate::min_max_scaler::MinMaxScaler;
use crate::ordinal_encoder::OrdinalEncoder;
use crate::preprocess::{FeaturePipeline, FeatureVector};
use crate::review::{BREWERY_NAME, RATING_COLUMNS};
use crate::target_encoder::TargetEncoder;

#[derive(Debug, Clone, PartialEq)]
pub struct FittedTransformers {
    pub target_encoder: TargetEncoder,
    pub ordinal_encoder: OrdinalEncoder,
    pub scaler: MinMaxScaler,
}

impl FittedTransformers {
    pub fn fit(rows: &[LabelledReview], smoothing: f64) -> BeerResult<Self> {
        if rows.is_empty() {
            return Err(BeerError::dataset("cannot fit transformers on zero rows"));
        }

        let ordinal_encoder =
            OrdinalEncoder::fit(BEER_STYLE, rows.iter().map(|r| r.beer_style.as_str()))?;
        let targets = rows
            .iter()
            .map(|r| ordinal_encoder.encode(&r.beer_style))
            .collect::<BeerResult<Vec<_>>>()?;

        let breweries: Vec<&str> = rows.iter().map(|r| r.record.brewery_name.as_str()).collect();
        let target_encoder = TargetEncoder::fit(
            BREWERY_NAME,
            &breweries,
            &targets,
            ordinal_encoder.len(),
            smoothing,
        )?;

        let ratings: Vec<Vec<f64>> = rows.iter().map(|r| r.record.ratings().to_vec()).collect();
        let scaler = MinMaxScaler::fit(&RATING_COLUMNS, &ratings)?;

        info!(
            "Fitted transformers: {} styles, {} breweries, {} rows",
            ordinal_encoder.len(),
            breweries
                .iter()
                .collect::<std::collections::BTreeSet<_>>()
                .len(),
            rows.len()
        );

        Ok(Self {
            target_encoder,
            ordinal_encoder,
            scaler,
        })
    }

    pub fn pipeline(&self) -> BeerResult<FeaturePipeline> {
        FeaturePipeline::new(self.target_encoder.clone(), self.scaler.clone())
    }

    pub fn save(&self, cfg: &ArtefactConfig) -> BeerResult<()> {
        crate::artifacts::save_transformers(
            cfg,
            &self.target_encoder,
            &self.ordinal_encoder,
            &self.scaler,
        )
    }
}

/// Feature rows and target codes for a labelled set.
pub fn encode_rows(
    pipeline: &FeaturePipeline,
    ordinal_encoder: &OrdinalEncoder,
    rows: &[LabelledReview],
) -> BeerResult<(Vec<FeatureVector>, Vec<u32>)> {
    let mut features = Vec::with_capacity(rows.len());
    let mut targets = Vec::with_capacity(rows.len());
    for row in rows {
        features.push(pipeline.transform(&row.record)?);
        targets.push(ordinal_encoder.encode(&row.beer_style)?);
    }
    Ok((features, targets))
}
