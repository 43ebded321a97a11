//! Fixture shared by the integration tests: three styles, hand-set weights.
//!
//! Integration tests cannot reach the crate's `#[cfg(test)]` modules, so this
//! mirrors `src/tests/test_utils.rs`. Keep the rows and weights of both in sync.
#![allow(dead_code)]

use candle_core::Device;
use deep_beer::artifacts::ArtifactStore;
use deep_beer::classifier::{BeerClassifier, LayerWeights, ModelShape};
use deep_beer::dataset::LabelledReview;
use deep_beer::prepare::FittedTransformers;
use deep_beer::target_encoder::DEFAULT_SMOOTHING;
use deep_beer::{BeerStylePredictor, ReviewRecord};

pub const BOCK: &str = "Bock";
pub const FRUIT: &str = "Fruit / Vegetable Beer";
pub const STOUT: &str = "Russian Imperial Stout";
pub const HIDDEN: usize = 8;

pub const REVIEWS_CSV: &str = "\
brewery_id,brewery_name,review_time,review_overall,review_aroma,review_appearance,review_profilename,beer_style,review_palate,review_taste,beer_name,beer_abv,beer_beerid
1,Zum Löwenbräu,1234817823,5.0,5.0,5.0,stcules,Russian Imperial Stout,5.0,5.0,Kaiser Dunkel,9.5,1
2,Vecchio Birraio,1234817824,1.5,1.0,1.0,stcules,Fruit / Vegetable Beer,1.0,1.0,Cauldron DIPA,4.7,2
3,Boston Beer Company (Samuel Adams),1234817825,4.0,4.0,3.5,johnmichaelsen,Bock,3.5,4.0,Chocolate Bock,5.5,3
3,Boston Beer Company (Samuel Adams),1234817826,3.5,3.5,4.0,oline73,Bock,4.0,3.0,Winter Lager,5.6,4
2,Vecchio Birraio,1234817827,2.0,1.5,2.0,Reidrover,Fruit / Vegetable Beer,2.0,2.0,Fruit Ale,4.0,5
4,Brouwerij Incompleet,1234817828,3.0,,3.0,beerguy,Witbier,3.0,3.0,Half Review,5.0,6
";

fn labelled(brewery: &str, ratings: [f64; 4], style: &str) -> LabelledReview {
    LabelledReview {
        record: ReviewRecord::new(brewery, ratings),
        beer_style: style.to_string(),
    }
}

pub fn training_rows() -> Vec<LabelledReview> {
    vec![
        labelled("Zum Löwenbräu", [5.0, 5.0, 5.0, 5.0], STOUT),
        labelled("Vecchio Birraio", [1.0, 1.0, 1.0, 1.0], FRUIT),
        labelled("Boston Beer Company (Samuel Adams)", [3.5, 4.0, 3.5, 4.0], BOCK),
        labelled("Boston Beer Company (Samuel Adams)", [4.0, 3.5, 4.0, 3.0], BOCK),
        labelled("Vecchio Birraio", [2.0, 1.5, 2.0, 2.0], FRUIT),
    ]
}

pub fn fitted() -> FittedTransformers {
    FittedTransformers::fit(&training_rows(), DEFAULT_SMOOTHING).unwrap()
}

/// Stout unit fires when the scaled ratings sum above 3.2, fruit below 2.0.
pub fn fixture_classifier() -> BeerClassifier {
    let mut layer_1_weight = vec![0.0; HIDDEN * 6];
    layer_1_weight[..4].copy_from_slice(&[1.0; 4]);
    layer_1_weight[6..10].copy_from_slice(&[-1.0; 4]);
    let mut layer_1_bias = vec![0.0; HIDDEN];
    layer_1_bias[0] = -3.2;
    layer_1_bias[1] = 2.0;
    let mut layer_2_weight = vec![0.0; 3 * HIDDEN];
    layer_2_weight[HIDDEN + 1] = 3.0;
    layer_2_weight[2 * HIDDEN] = 3.0;

    let weights = LayerWeights {
        layer_1_weight,
        layer_1_bias,
        layer_2_weight,
        layer_2_bias: vec![1.0, 0.0, 0.0],
    };
    BeerClassifier::from_weights(ModelShape::new(6, HIDDEN, 3), 0.5, weights, &Device::Cpu)
        .unwrap()
        .eval()
}

pub fn fixture_predictor() -> BeerStylePredictor {
    let fitted = fitted();
    let store = ArtifactStore::from_parts(
        fitted.pipeline().unwrap(),
        fitted.ordinal_encoder,
        fixture_classifier(),
    )
    .unwrap();
    BeerStylePredictor::new(store, Device::Cpu)
}
