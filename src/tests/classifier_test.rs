use candle_core::{Device, Tensor};
use tempfile::TempDir;

use crate::classifier::{BeerClassifier, LayerSpec, Mode, ModelArchitecture, ModelShape};
use crate::decoder::{argmax, PredictionDecoder};
use crate::errors::BeerError;
use crate::tests::test_utils::*;

fn scaled_batch(rows: &[[f64; 6]]) -> Tensor {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Tensor::from_vec(flat, (rows.len(), 6), &Device::Cpu).unwrap()
}

#[test]
fn production_shape_parameter_count() {
    let shape = ModelShape::DEEP_BEER;
    assert_eq!(shape.num_features, 107);
    assert_eq!(shape.hidden, 256);
    assert_eq!(shape.num_classes, 104);
    assert_eq!(shape.parameter_count(), 256 * 108 + 104 * 257);
}

#[test]
fn probabilities_are_a_distribution_per_row() {
    let model = fixture_classifier();
    let x = scaled_batch(&[[0.0; 6], [1.0, 1.0, 1.0, 1.0, 0.2, 0.1], [0.5; 6]]);
    let probs = model.probabilities(&x).unwrap();
    assert_eq!(probs.len(), 3);
    for row in &probs {
        assert_eq!(row.len(), 3);
        assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_close(row.iter().sum(), 1.0);
    }
}

#[test]
fn fixture_units_pick_expected_styles() {
    let model = fixture_classifier();
    let x = scaled_batch(&[[1.0; 6], [0.0; 6], [0.7, 0.68, 0.69, 0.7, 0.0, 0.0]]);
    let probs = model.probabilities(&x).unwrap();
    assert_eq!(argmax(&probs[0]), Some(2));
    assert_eq!(argmax(&probs[1]), Some(1));
    assert_eq!(argmax(&probs[2]), Some(0));
}

#[test]
fn eval_mode_is_deterministic() {
    let model = fixture_classifier();
    assert_eq!(model.mode(), Mode::Eval);
    let x = scaled_batch(&[[0.3, 0.9, 0.1, 0.6, 0.4, 0.2]]);
    let first = model.probabilities(&x).unwrap();
    for _ in 0..5 {
        assert_eq!(model.probabilities(&x).unwrap(), first);
    }
}

#[test]
fn train_mode_with_zero_dropout_matches_eval() {
    let weights = fixture_weights();
    let model = BeerClassifier::from_weights(ModelShape::new(6, HIDDEN, 3), 0.0, weights, &Device::Cpu)
        .unwrap()
        .train();
    assert_eq!(model.mode(), Mode::Train);
    let x = scaled_batch(&[[0.4, 0.2, 0.9, 0.1, 0.3, 0.3]]);
    let training = model.probabilities(&x).unwrap();
    let model = model.eval();
    assert_eq!(model.mode(), Mode::Eval);
    assert_eq!(model.probabilities(&x).unwrap(), training);
}

#[test]
fn wrong_feature_width_is_rejected() {
    let model = fixture_classifier();
    let x = Tensor::zeros((1, 5), candle_core::DType::F64, &Device::Cpu).unwrap();
    assert!(matches!(
        model.probabilities(&x),
        Err(BeerError::Internal { .. })
    ));
}

#[test]
fn narrower_input_dtype_is_widened() {
    let model = fixture_classifier();
    let x = Tensor::ones((2, 6), candle_core::DType::F32, &Device::Cpu).unwrap();
    let probs = model.probabilities(&x).unwrap();
    assert_eq!(argmax(&probs[0]), Some(2));
}

#[test]
fn safetensors_round_trip_preserves_outputs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weights.safetensors");
    let model = fixture_classifier();
    model.save(&path).unwrap();

    let loaded =
        BeerClassifier::load(&path, model.shape(), 0.5, &Device::Cpu).unwrap();
    assert_eq!(loaded.mode(), Mode::Eval);

    let x = scaled_batch(&[[0.2, 0.4, 0.6, 0.8, 0.3, 0.1], [1.0; 6]]);
    assert_eq!(
        loaded.probabilities(&x).unwrap(),
        model.probabilities(&x).unwrap()
    );
}

#[test]
fn loading_with_wrong_shape_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("weights.safetensors");
    fixture_classifier().save(&path).unwrap();
    let result = BeerClassifier::load(&path, ModelShape::new(6, HIDDEN, 4), 0.5, &Device::Cpu);
    assert!(result.is_err());
}

#[test]
fn invalid_dropout_is_rejected() {
    let varmap = candle_nn::VarMap::new();
    let vb = candle_nn::VarBuilder::from_varmap(&varmap, candle_core::DType::F64, &Device::Cpu);
    assert!(matches!(
        BeerClassifier::new(ModelShape::new(6, 4, 3), 1.0, vb),
        Err(BeerError::Config { .. })
    ));
}

#[test]
fn hand_set_weights_reject_invalid_dropout() {
    for dropout in [1.0, -0.1] {
        assert!(matches!(
            BeerClassifier::from_weights(
                ModelShape::new(6, HIDDEN, 3),
                dropout,
                fixture_weights(),
                &Device::Cpu
            ),
            Err(BeerError::Config { .. })
        ));
    }
}

#[test]
fn architecture_lists_layers_in_order() {
    let architecture = fixture_classifier().architecture();
    assert_eq!(architecture.parameters, 8 * 7 + 3 * 9);
    assert_eq!(architecture.mode, Mode::Eval);
    assert_eq!(architecture.layers.len(), 5);
    assert!(matches!(
        architecture.layers[0],
        LayerSpec::Linear { in_features: 6, out_features: 8, .. }
    ));
    assert_eq!(architecture.layers[2], LayerSpec::Dropout { p: 0.5 });

    let printed = architecture.to_string();
    assert!(printed.starts_with("BeerClassifier(\n"));
    assert!(printed.contains("(layer_2): Linear(in_features=8, out_features=3, bias=true)"));
    assert!(printed.ends_with(")"));
}

#[test]
fn architecture_serializes_with_layer_kinds() {
    let architecture = ModelArchitecture::describe(ModelShape::DEEP_BEER, 0.5, Mode::Eval);
    let json = serde_json::to_value(&architecture).unwrap();
    assert_eq!(json["mode"], "eval");
    assert_eq!(json["layers"][1]["kind"], "ReLU");
    assert_eq!(json["layers"][4]["dim"], 1);
    assert_eq!(json["shape"]["num_classes"], 104);
}

#[test]
fn argmax_prefers_first_maximum_and_skips_nan() {
    assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
    assert_eq!(argmax(&[f64::NAN, 0.1, 0.05]), Some(1));
    assert_eq!(argmax(&[f64::NAN, f64::NAN]), None);
    assert_eq!(argmax(&[]), None);
}

#[test]
fn decoder_maps_argmax_to_label() {
    let encoder = fitted().ordinal_encoder;
    let decoder = PredictionDecoder::new(&encoder);
    assert_eq!(decoder.decode(&[0.1, 0.2, 0.7]).unwrap(), STOUT);
    assert_eq!(decoder.decode(&[0.5, 0.2, 0.3]).unwrap(), BOCK);
    assert!(matches!(
        decoder.decode_index(7),
        Err(BeerError::Decode { index: 7, size: 3 })
    ));
    assert!(decoder.decode(&[]).is_err());
}
