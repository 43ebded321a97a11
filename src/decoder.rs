use crate::errors::{BeerError, BeerResult};
use crate::ordinal_encoder::OrdinalEncoder;

/// Index of the highest probability; ties go to the lowest index.
///
/// NaN entries never win. An all-NaN (or empty) row has no argmax.
pub fn argmax(probabilities: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in probabilities.iter().enumerate() {
        match best {
            Some((_, top)) if p <= top || p.is_nan() => {}
            None if p.is_nan() => {}
            _ => best = Some((i, p)),
        }
    }
    best.map(|(i, _)| i)
}

/// Turns class distributions back into beer style labels.
#[derive(Debug, Clone, Copy)]
pub struct PredictionDecoder<'a> {
    encoder: &'a OrdinalEncoder,
}

impl<'a> PredictionDecoder<'a> {
    pub fn new(encoder: &'a OrdinalEncoder) -> Self {
        Self { encoder }
    }

    pub fn decode_index(&self, index: usize) -> BeerResult<&'a str> {
        self.encoder.decode(index)
    }

    pub fn decode(&self, probabilities: &[f64]) -> BeerResult<&'a str> {
        let index = argmax(probabilities).ok_or_else(|| {
            BeerError::internal("class distribution has no finite maximum")
        })?;
        self.decode_index(index)
    }
}
