//! Library root for the `deep_beer` crate
//! Beer style prediction: fitted preprocessing, a small feed-forward
//! classifier and the HTTP service around them.

// Core error handling
pub mod api_errors;
pub mod errors;

// Records and preprocessing
pub mod min_max_scaler;
pub mod ordinal_encoder;
pub mod preprocess;
pub mod review;
pub mod target_encoder;

// Model and decoding
pub mod classifier;
pub mod decoder;

// Artefacts & service context
pub mod artifacts;
pub mod predictor;

// Offline preparation, training & evaluation
pub mod dataset;
pub mod performance;
pub mod prepare;
pub mod training;

// Configuration & CLI
pub mod cli;
pub mod config_loader;

// Web server interface
pub mod beerweb;


pub use artifacts::ArtifactStore;
pub use errors::{BeerError, BeerResult};
pub use predictor::BeerStylePredictor;
pub use review::{PredictedReview, ReviewRecord};
