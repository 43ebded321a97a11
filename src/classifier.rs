//! Two-layer feed-forward beer style classifier.
//!
//! linear(F -> H) -> ReLU -> dropout -> linear(H -> K) -> softmax, computed in
//! f64. Dropout only applies in `Mode::Train`; a serving model is always put
//! in `Mode::Eval` so its output is a pure function of input and weights.

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::errors::{BeerError, BeerResult};

pub const NUM_FEATURE_COLUMNS: usize = 107;
pub const HIDDEN_UNITS: usize = 256;
pub const NUM_BEER_STYLES: usize = 104;
pub const DEFAULT_DROPOUT: f32 = 0.5;
pub const MODEL_DTYPE: DType = DType::F64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelShape {
    pub num_features: usize,
    pub hidden: usize,
    pub num_classes: usize,
}

impl ModelShape {
    /// Shape of the production deep beer network.
    pub const DEEP_BEER: ModelShape = ModelShape {
        num_features: NUM_FEATURE_COLUMNS,
        hidden: HIDDEN_UNITS,
        num_classes: NUM_BEER_STYLES,
    };

    pub fn new(num_features: usize, hidden: usize, num_classes: usize) -> Self {
        Self {
            num_features,
            hidden,
            num_classes,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.hidden * (self.num_features + 1) + self.num_classes * (self.hidden + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Eval,
}

/// Weights of both linear layers, row-major, torch layout (`out x in`).
#[derive(Debug, Clone)]
pub struct LayerWeights {
    pub layer_1_weight: Vec<f64>,
    pub layer_1_bias: Vec<f64>,
    pub layer_2_weight: Vec<f64>,
    pub layer_2_bias: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct BeerClassifier {
    shape: ModelShape,
    layer_1: Linear,
    layer_2: Linear,
    dropout: f32,
    mode: Mode,
}

impl BeerClassifier {
    /// Build from a var builder; tensors live under `layer_1.*` and `layer_2.*`.
    pub fn new(shape: ModelShape, dropout: f32, vb: VarBuilder) -> BeerResult<Self> {
        check_dropout(dropout)?;
        let layer_1 = candle_nn::linear(shape.num_features, shape.hidden, vb.pp("layer_1"))?;
        let layer_2 = candle_nn::linear(shape.hidden, shape.num_classes, vb.pp("layer_2"))?;
        Ok(Self {
            shape,
            layer_1,
            layer_2,
            dropout,
            mode: Mode::Train,
        })
    }

    /// Load a safetensors weight file, converting to f64 if stored narrower.
    pub fn load(path: &Path, shape: ModelShape, dropout: f32, device: &Device) -> BeerResult<Self> {
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], MODEL_DTYPE, device)? };
        Ok(Self::new(shape, dropout, vb)?.eval())
    }

    pub fn from_weights(
        shape: ModelShape,
        dropout: f32,
        weights: LayerWeights,
        device: &Device,
    ) -> BeerResult<Self> {
        check_dropout(dropout)?;
        let ModelShape {
            num_features,
            hidden,
            num_classes,
        } = shape;
        let w1 = Tensor::from_vec(weights.layer_1_weight, (hidden, num_features), device)?;
        let b1 = Tensor::from_vec(weights.layer_1_bias, hidden, device)?;
        let w2 = Tensor::from_vec(weights.layer_2_weight, (num_classes, hidden), device)?;
        let b2 = Tensor::from_vec(weights.layer_2_bias, num_classes, device)?;
        Ok(Self {
            shape,
            layer_1: Linear::new(w1, Some(b1)),
            layer_2: Linear::new(w2, Some(b2)),
            dropout,
            mode: Mode::Train,
        })
    }

    /// Write the weights as safetensors under the names `load` expects.
    pub fn save(&self, path: &Path) -> BeerResult<()> {
        let mut tensors = HashMap::new();
        for (name, layer) in [("layer_1", &self.layer_1), ("layer_2", &self.layer_2)] {
            tensors.insert(format!("{name}.weight"), layer.weight().clone());
            if let Some(bias) = layer.bias() {
                tensors.insert(format!("{name}.bias"), bias.clone());
            }
        }
        candle_core::safetensors::save(&tensors, path)?;
        Ok(())
    }

    pub fn eval(mut self) -> Self {
        self.mode = Mode::Eval;
        self
    }

    pub fn train(mut self) -> Self {
        self.mode = Mode::Train;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn shape(&self) -> ModelShape {
        self.shape
    }

    fn check_input(&self, x: &Tensor) -> BeerResult<Tensor> {
        let (_, width) = x.dims2()?;
        if width != self.shape.num_features {
            return Err(BeerError::internal(format!(
                "feature width {width} does not match model input {}",
                self.shape.num_features
            )));
        }
        Ok(x.to_dtype(MODEL_DTYPE)?)
    }

    /// Pre-softmax scores; `train` enables dropout.
    pub fn logits(&self, x: &Tensor, train: bool) -> BeerResult<Tensor> {
        let x = self.check_input(x)?;
        let mut h = self.layer_1.forward(&x)?.relu()?;
        if train && self.dropout > 0.0 {
            h = candle_nn::ops::dropout(&h, self.dropout)?;
        }
        Ok(self.layer_2.forward(&h)?)
    }

    /// Row-wise class probabilities for a `rows x features` batch.
    pub fn forward(&self, x: &Tensor) -> BeerResult<Tensor> {
        let logits = self.logits(x, self.mode == Mode::Train)?;
        Ok(candle_nn::ops::softmax(&logits, D::Minus1)?)
    }

    pub fn probabilities(&self, x: &Tensor) -> BeerResult<Vec<Vec<f64>>> {
        Ok(self.forward(x)?.to_vec2::<f64>()?)
    }

    pub fn architecture(&self) -> ModelArchitecture {
        ModelArchitecture::describe(self.shape, self.dropout, self.mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LayerSpec {
    Linear {
        name: String,
        in_features: usize,
        out_features: usize,
        bias: bool,
    },
    ReLU,
    Dropout {
        p: f32,
    },
    Softmax {
        dim: usize,
    },
}

impl fmt::Display for LayerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSpec::Linear {
                name,
                in_features,
                out_features,
                bias,
            } => write!(
                f,
                "({name}): Linear(in_features={in_features}, out_features={out_features}, bias={bias})"
            ),
            LayerSpec::ReLU => write!(f, "(relu): ReLU()"),
            LayerSpec::Dropout { p } => write!(f, "(dropout): Dropout(p={p})"),
            LayerSpec::Softmax { dim } => write!(f, "(softmax): Softmax(dim={dim})"),
        }
    }
}

/// Structural description served by `/model/architecture/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArchitecture {
    pub name: String,
    pub dtype: String,
    pub mode: Mode,
    pub shape: ModelShape,
    pub parameters: usize,
    pub layers: Vec<LayerSpec>,
}

impl ModelArchitecture {
    pub fn describe(shape: ModelShape, dropout: f32, mode: Mode) -> Self {
        Self {
            name: "BeerClassifier".to_string(),
            dtype: "f64".to_string(),
            mode,
            shape,
            parameters: shape.parameter_count(),
            layers: vec![
                LayerSpec::Linear {
                    name: "layer_1".to_string(),
                    in_features: shape.num_features,
                    out_features: shape.hidden,
                    bias: true,
                },
                LayerSpec::ReLU,
                LayerSpec::Dropout { p: dropout },
                LayerSpec::Linear {
                    name: "layer_2".to_string(),
                    in_features: shape.hidden,
                    out_features: shape.num_classes,
                    bias: true,
                },
                LayerSpec::Softmax { dim: 1 },
            ],
        }
    }
}

impl fmt::Display for ModelArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}(", self.name)?;
        for layer in &self.layers {
            writeln!(f, "  {layer}")?;
        }
        write!(f, ")")
    }
}

fn check_dropout(dropout: f32) -> BeerResult<()> {
    if !(0.0..1.0).contains(&dropout) {
        return Err(BeerError::config(format!(
            "dropout must be in [0, 1), got {dropout}"
        )));
    }
    Ok(())
}
