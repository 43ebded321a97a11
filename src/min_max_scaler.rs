use serde::{Deserialize, Serialize};

use crate::errors::{BeerError, BeerResult};
use crate::review::ReviewRecord;

/// Per-column linear rescaling to [0, 1] using the min/max observed at fit time.
///
/// Transform does not clamp: inputs outside the fitted range extrapolate
/// linearly past 0 or 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub columns: Vec<String>,
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit on row-major values; each row carries one value per column.
    pub fn fit(columns: &[&str], rows: &[Vec<f64>]) -> BeerResult<Self> {
        if rows.is_empty() {
            return Err(BeerError::dataset("cannot fit min-max scaler on zero rows"));
        }
        let width = columns.len();
        let mut data_min = vec![f64::INFINITY; width];
        let mut data_max = vec![f64::NEG_INFINITY; width];

        for row in rows {
            if row.len() != width {
                return Err(BeerError::dataset(format!(
                    "row has {} values, scaler expects {width}",
                    row.len()
                )));
            }
            for (i, &value) in row.iter().enumerate() {
                data_min[i] = data_min[i].min(value);
                data_max[i] = data_max[i].max(value);
            }
        }

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            data_min,
            data_max,
        })
    }

    pub fn data_min(&self) -> &[f64] {
        &self.data_min
    }

    pub fn data_max(&self) -> &[f64] {
        &self.data_max
    }

    fn scale(&self, i: usize) -> f64 {
        let range = self.data_max[i] - self.data_min[i];
        if range == 0.0 { 1.0 } else { 1.0 / range }
    }

    pub fn transform_value(&self, i: usize, value: f64) -> f64 {
        (value - self.data_min[i]) * self.scale(i)
    }

    /// Scale the fitted columns of one record, in fitted column order.
    pub fn transform(&self, record: &ReviewRecord) -> BeerResult<Vec<f64>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                record
                    .numeric(column)
                    .map(|value| self.transform_value(i, value))
                    .map_err(|_| BeerError::schema(column, "min-max scaler"))
            })
            .collect()
    }

    pub fn check(&self) -> BeerResult<()> {
        let width = self.columns.len();
        if width == 0 || self.data_min.len() != width || self.data_max.len() != width {
            return Err(BeerError::artifact(
                "min_max_scaler",
                "column, min and max lists must be non-empty and equally long",
            ));
        }
        if self
            .data_min
            .iter()
            .zip(&self.data_max)
            .any(|(lo, hi)| !lo.is_finite() || !hi.is_finite() || lo > hi)
        {
            return Err(BeerError::artifact("min_max_scaler", "invalid fitted range"));
        }
        Ok(())
    }
}
