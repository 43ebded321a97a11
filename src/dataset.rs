//! Labelled review datasets for the offline tools.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use crate::errors::{BeerError, BeerResult};
use crate::review::ReviewRecord;

/// Name of the target column in the review CSV.
pub const BEER_STYLE: &str = "beer_style";

/// One CSV row; columns the pipeline does not use are ignored.
#[derive(Debug, Deserialize)]
struct RawReviewRow {
    brewery_name: Option<String>,
    review_appearance: Option<f64>,
    review_aroma: Option<f64>,
    review_palate: Option<f64>,
    review_taste: Option<f64>,
    beer_style: Option<String>,
}

impl RawReviewRow {
    fn into_labelled(self) -> Option<LabelledReview> {
        let brewery_name = self.brewery_name.filter(|s| !s.trim().is_empty())?;
        let beer_style = self.beer_style.filter(|s| !s.trim().is_empty())?;
        let record = ReviewRecord::new(
            brewery_name,
            [
                self.review_appearance?,
                self.review_aroma?,
                self.review_palate?,
                self.review_taste?,
            ],
        );
        record.validate().ok()?;
        Some(LabelledReview { record, beer_style })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelledReview {
    pub record: ReviewRecord,
    pub beer_style: String,
}

#[derive(Debug, Clone)]
pub struct ReviewDataset {
    pub rows: Vec<LabelledReview>,
    /// Rows dropped for missing or non-finite values.
    pub skipped: usize,
}

impl ReviewDataset {
    pub fn from_reader<R: io::Read>(reader: R) -> BeerResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        let mut skipped = 0;
        for result in rdr.deserialize::<RawReviewRow>() {
            match result?.into_labelled() {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }
        if rows.is_empty() {
            return Err(BeerError::dataset("no complete review rows found"));
        }
        Ok(Self { rows, skipped })
    }

    pub fn from_path(path: &Path) -> BeerResult<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| BeerError::io(format!("opening {}", path.display()), e))?;
        let dataset = Self::from_reader(file)?;
        info!(
            "Read {} reviews from {} ({} incomplete rows skipped)",
            dataset.rows.len(),
            path.display(),
            dataset.skipped
        );
        if dataset.skipped > 0 {
            warn!("{} rows had missing values and were dropped", dataset.skipped);
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.beer_style.as_str())
    }

    /// Seeded shuffle, then split off `val_fraction` of the rows for validation.
    pub fn split(&self, val_fraction: f64, seed: u64) -> BeerResult<(Vec<LabelledReview>, Vec<LabelledReview>)> {
        if !(0.0..1.0).contains(&val_fraction) {
            return Err(BeerError::config(format!(
                "validation fraction must be in [0, 1), got {val_fraction}"
            )));
        }
        let mut rows = self.rows.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        rows.shuffle(&mut rng);
        let val_len = (rows.len() as f64 * val_fraction).round() as usize;
        let train = rows.split_off(val_len);
        Ok((train, rows))
    }
}
