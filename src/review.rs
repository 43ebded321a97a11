//! Review records accepted by the prediction endpoints.
//!
//! Every field is optional on the wire and falls back to the documented
//! example review. Records are addressed by column name when they enter the
//! preprocessing pipeline, mirroring the table the transformers were fitted on.

use serde::{Deserialize, Serialize};

use crate::errors::{BeerError, BeerResult};

pub const BREWERY_NAME: &str = "brewery_name";
pub const REVIEW_APPEARANCE: &str = "review_appearance";
pub const REVIEW_AROMA: &str = "review_aroma";
pub const REVIEW_PALATE: &str = "review_palate";
pub const REVIEW_TASTE: &str = "review_taste";

/// Rating columns in record order; this is also their feature order.
pub const RATING_COLUMNS: [&str; 4] = [
    REVIEW_APPEARANCE,
    REVIEW_AROMA,
    REVIEW_PALATE,
    REVIEW_TASTE,
];

fn default_brewery_name() -> String {
    "Boston Beer Company (Samuel Adams)".to_string()
}

fn default_appearance() -> f64 {
    3.8416471332705995
}

fn default_aroma() -> f64 {
    3.7356383055832003
}

fn default_palate() -> f64 {
    3.7437049311136588
}

fn default_taste() -> f64 {
    3.7928644856072644
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(default = "default_brewery_name")]
    pub brewery_name: String,
    #[serde(default = "default_appearance")]
    pub review_appearance: f64,
    #[serde(default = "default_aroma")]
    pub review_aroma: f64,
    #[serde(default = "default_palate")]
    pub review_palate: f64,
    #[serde(default = "default_taste")]
    pub review_taste: f64,
}

impl Default for ReviewRecord {
    fn default() -> Self {
        Self {
            brewery_name: default_brewery_name(),
            review_appearance: default_appearance(),
            review_aroma: default_aroma(),
            review_palate: default_palate(),
            review_taste: default_taste(),
        }
    }
}

/// A single cell of the one-row table view of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Column<'a> {
    Text(&'a str),
    Number(f64),
}

impl ReviewRecord {
    pub fn new(brewery_name: impl Into<String>, ratings: [f64; 4]) -> Self {
        let [review_appearance, review_aroma, review_palate, review_taste] = ratings;
        Self {
            brewery_name: brewery_name.into(),
            review_appearance,
            review_aroma,
            review_palate,
            review_taste,
        }
    }

    /// Look up a column by the name a transformer was fitted with.
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        match name {
            BREWERY_NAME => Some(Column::Text(&self.brewery_name)),
            REVIEW_APPEARANCE => Some(Column::Number(self.review_appearance)),
            REVIEW_AROMA => Some(Column::Number(self.review_aroma)),
            REVIEW_PALATE => Some(Column::Number(self.review_palate)),
            REVIEW_TASTE => Some(Column::Number(self.review_taste)),
            _ => None,
        }
    }

    /// Numeric column lookup; a missing or non-numeric column is a schema error.
    pub fn numeric(&self, name: &str) -> BeerResult<f64> {
        match self.column(name) {
            Some(Column::Number(value)) => Ok(value),
            Some(Column::Text(_)) => Err(BeerError::schema(name, "expected a numeric column")),
            None => Err(BeerError::schema(name, "record has no such column")),
        }
    }

    /// Categorical column lookup; a missing or numeric column is a schema error.
    pub fn categorical(&self, name: &str) -> BeerResult<&str> {
        match self.column(name) {
            Some(Column::Text(value)) => Ok(value),
            Some(Column::Number(_)) => {
                Err(BeerError::schema(name, "expected a categorical column"))
            }
            None => Err(BeerError::schema(name, "record has no such column")),
        }
    }

    pub fn ratings(&self) -> [f64; 4] {
        [
            self.review_appearance,
            self.review_aroma,
            self.review_palate,
            self.review_taste,
        ]
    }

    /// Boundary validation applied before a record enters the pipeline.
    pub fn validate(&self) -> BeerResult<()> {
        for (name, value) in RATING_COLUMNS.iter().zip(self.ratings()) {
            if !value.is_finite() {
                return Err(BeerError::validation(*name, "rating must be a finite number"));
            }
        }
        Ok(())
    }

    /// Attach the predicted label, consuming the record.
    pub fn with_style(self, beer_style: impl Into<String>) -> PredictedReview {
        PredictedReview {
            review: self,
            beer_style: beer_style.into(),
        }
    }
}

/// The input record with the predicted `beer_style` appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedReview {
    #[serde(flatten)]
    pub review: ReviewRecord,
    pub beer_style: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_takes_documented_defaults() {
        let record: ReviewRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, ReviewRecord::default());
        assert_eq!(record.brewery_name, "Boston Beer Company (Samuel Adams)");
        assert_eq!(record.review_taste, 3.7928644856072644);
    }

    #[test]
    fn partial_object_keeps_given_fields() {
        let record: ReviewRecord =
            serde_json::from_str(r#"{"brewery_name": "Vecchio Birraio", "review_aroma": 1}"#)
                .unwrap();
        assert_eq!(record.brewery_name, "Vecchio Birraio");
        assert_eq!(record.review_aroma, 1.0);
        assert_eq!(record.review_palate, 3.7437049311136588);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let record: ReviewRecord =
            serde_json::from_str(r#"{"review_overall": 4.5, "review_taste": 2}"#).unwrap();
        assert_eq!(record.review_taste, 2.0);
    }

    #[test]
    fn column_lookup_reports_schema_errors() {
        let record = ReviewRecord::default();
        assert_eq!(record.numeric(REVIEW_AROMA).unwrap(), 3.7356383055832003);
        assert!(matches!(
            record.numeric("beer_abv"),
            Err(BeerError::Schema { .. })
        ));
        assert!(matches!(
            record.categorical(REVIEW_TASTE),
            Err(BeerError::Schema { .. })
        ));
    }

    #[test]
    fn non_finite_rating_fails_validation() {
        let mut record = ReviewRecord::default();
        assert!(record.validate().is_ok());
        record.review_palate = f64::NAN;
        let err = record.validate().unwrap_err();
        assert!(err.to_string().contains(REVIEW_PALATE));
    }

    #[test]
    fn predicted_review_serializes_flat() {
        let predicted = ReviewRecord::new("Zum Löwenbräu", [5.0; 4]).with_style("Russian Imperial Stout");
        let value = serde_json::to_value(&predicted).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(obj["brewery_name"], "Zum Löwenbräu");
        assert_eq!(obj["review_taste"], 5.0);
        assert_eq!(obj["beer_style"], "Russian Imperial Stout");
    }
}
