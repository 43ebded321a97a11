use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::{BeerError, BeerResult};

/// Maps the beer style label space to consecutive integer codes.
///
/// Codes follow the lexicographic order of the labels seen at fit time. The
/// mapping is the only source of truth for turning model output indices back
/// into style names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    pub column: String,
    categories: Vec<String>,
}

impl OrdinalEncoder {
    pub fn fit<'a, I>(column: impl Into<String>, labels: I) -> BeerResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let categories: BTreeSet<&str> = labels.into_iter().collect();
        if categories.is_empty() {
            return Err(BeerError::dataset("cannot fit ordinal encoder on an empty label set"));
        }
        Ok(Self {
            column: column.into(),
            categories: categories.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn encode(&self, label: &str) -> BeerResult<u32> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(label))
            .map(|idx| idx as u32)
            .map_err(|_| BeerError::validation(&self.column, format!("unknown label '{label}'")))
    }

    /// Inverse transform of a single code; pure lookup, no fallback.
    pub fn decode(&self, code: usize) -> BeerResult<&str> {
        self.categories
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| BeerError::decode(code, self.categories.len()))
    }

    /// Deserialized artifacts bypass `fit`, so the ordering invariant is rechecked here.
    pub fn check(&self) -> BeerResult<()> {
        if self.categories.is_empty() {
            return Err(BeerError::artifact("ordinal_encoder", "no categories"));
        }
        if self.categories.windows(2).any(|w| w[0] >= w[1]) {
            return Err(BeerError::artifact(
                "ordinal_encoder",
                "categories must be unique and sorted",
            ));
        }
        Ok(())
    }
}
