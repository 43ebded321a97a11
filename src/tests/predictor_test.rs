use candle_core::Device;

use crate::artifacts::ArtifactStore;
use crate::classifier::{BeerClassifier, ModelShape};
use crate::errors::BeerError;
use crate::review::ReviewRecord;
use crate::tests::test_utils::*;

#[test]
fn documented_examples_predict_documented_styles() {
    let predictor = fixture_predictor();
    assert_eq!(
        predictor.predict_style(&ReviewRecord::default()).unwrap(),
        BOCK
    );
    assert_eq!(
        predictor
            .predict_style(&ReviewRecord::new("Zum Löwenbräu", [5.0; 4]))
            .unwrap(),
        STOUT
    );
    assert_eq!(
        predictor
            .predict_style(&ReviewRecord::new("Vecchio Birraio", [1.0; 4]))
            .unwrap(),
        FRUIT
    );
}

#[test]
fn prediction_echoes_input_fields() {
    let predictor = fixture_predictor();
    let record = ReviewRecord::new("Vecchio Birraio", [1.0; 4]);
    let predicted = predictor.predict(record.clone()).unwrap();
    assert_eq!(predicted.review, record);
    assert_eq!(predicted.beer_style, FRUIT);

    let json = serde_json::to_value(&predicted).unwrap();
    assert_eq!(json["brewery_name"], "Vecchio Birraio");
    assert_eq!(json["review_taste"], 1.0);
    assert_eq!(json["beer_style"], FRUIT);
}

#[test]
fn unseen_brewery_still_predicts() {
    let predictor = fixture_predictor();
    let style = predictor
        .predict_style(&ReviewRecord::new("Brouwerij Nergens", [5.0; 4]))
        .unwrap();
    assert_eq!(style, STOUT);
}

#[test]
fn probabilities_sum_to_one() {
    let predictor = fixture_predictor();
    let probs = predictor.probabilities(&ReviewRecord::default()).unwrap();
    assert_eq!(probs.len(), predictor.labels().len());
    assert_close(probs.iter().sum(), 1.0);
}

#[test]
fn repeated_predictions_are_identical() {
    let predictor = fixture_predictor();
    let record = ReviewRecord::new("Boston Beer Company (Samuel Adams)", [2.5, 3.5, 4.5, 3.0]);
    let first = predictor.probabilities(&record).unwrap();
    for _ in 0..3 {
        assert_eq!(predictor.probabilities(&record).unwrap(), first);
    }
}

#[test]
fn non_finite_rating_is_a_validation_error() {
    let predictor = fixture_predictor();
    let mut record = ReviewRecord::default();
    record.review_palate = f64::NAN;
    match predictor.predict(record) {
        Err(BeerError::Validation { field, .. }) => assert_eq!(field, "review_palate"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let mut record = ReviewRecord::default();
    record.review_aroma = f64::INFINITY;
    assert!(predictor.predict(record).is_err());
}

#[test]
fn batch_preserves_order_and_length() {
    let predictor = fixture_predictor();
    let records = vec![
        ReviewRecord::new("Vecchio Birraio", [1.0; 4]),
        ReviewRecord::default(),
        ReviewRecord::new("Zum Löwenbräu", [5.0; 4]),
        ReviewRecord::new("Vecchio Birraio", [1.0; 4]),
    ];
    let predicted = predictor.predict_batch(records.clone()).unwrap();
    assert_eq!(predicted.len(), 4);
    let styles: Vec<&str> = predicted.iter().map(|p| p.beer_style.as_str()).collect();
    assert_eq!(styles, vec![FRUIT, BOCK, STOUT, FRUIT]);
    for (p, r) in predicted.iter().zip(&records) {
        assert_eq!(&p.review, r);
    }
}

#[test]
fn batch_matches_single_predictions() {
    let predictor = fixture_predictor();
    let records: Vec<ReviewRecord> = training_rows().into_iter().map(|r| r.record).collect();
    let batch = predictor.predict_batch(records.clone()).unwrap();
    for (record, predicted) in records.into_iter().zip(batch) {
        assert_eq!(predictor.predict(record).unwrap(), predicted);
    }
}

#[test]
fn empty_batch_returns_empty_list() {
    assert!(fixture_predictor().predict_batch(Vec::new()).unwrap().is_empty());
}

#[test]
fn failing_batch_item_aborts_with_its_index() {
    let predictor = fixture_predictor();
    let mut bad = ReviewRecord::default();
    bad.review_taste = f64::NAN;
    let records = vec![ReviewRecord::default(), ReviewRecord::default(), bad];
    match predictor.predict_batch(records) {
        Err(BeerError::Validation { field, .. }) => assert_eq!(field, "[2].review_taste"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn labels_follow_ordinal_encoder() {
    let predictor = fixture_predictor();
    assert_eq!(predictor.labels(), &[BOCK, FRUIT, STOUT]);
    assert_eq!(predictor.architecture().shape, ModelShape::new(6, HIDDEN, 3));
}

#[test]
fn store_rejects_mismatched_classifier() {
    let fitted = fitted();
    let too_many_classes = BeerClassifier::from_weights(
        ModelShape::new(6, 2, 4),
        0.0,
        crate::classifier::LayerWeights {
            layer_1_weight: vec![0.0; 12],
            layer_1_bias: vec![0.0; 2],
            layer_2_weight: vec![0.0; 8],
            layer_2_bias: vec![0.0; 4],
        },
        &Device::Cpu,
    )
    .unwrap();
    let result = ArtifactStore::from_parts(
        fitted.pipeline().unwrap(),
        fitted.ordinal_encoder,
        too_many_classes,
    );
    assert!(matches!(result, Err(BeerError::Artifact { .. })));
}
