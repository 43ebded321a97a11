//! Artifact store: fitted transformers, model weights and their manifest.
//!
//! Everything is loaded once at startup. Any missing, corrupt or mutually
//! inconsistent artifact is an `Artifact` error and the service must not start.

use candle_core::Device;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::classifier::{BeerClassifier, ModelShape};
use crate::config_loader::{ArtefactConfig, ModelConfig};
use crate::errors::{BeerError, BeerResult};
use crate::min_max_scaler::MinMaxScaler;
use crate::ordinal_encoder::OrdinalEncoder;
use crate::preprocess::FeaturePipeline;
use crate::target_encoder::TargetEncoder;

pub const MANIFEST_VERSION: &str = "deep-beer-v1";

/// Digests and shape recorded when the artifacts were produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArtifactManifest {
    pub version: String,
    pub shape: ModelShape,
    pub created_at: DateTime<Utc>,
    /// File name -> lowercase hex sha256.
    pub files: BTreeMap<String, String>,
}

pub fn hash_file(path: &Path) -> BeerResult<String> {
    let data = fs::read(path).map_err(|e| BeerError::io(format!("reading {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(format!("{:x}", hasher.finalize()))
}

fn read_artifact<T: DeserializeOwned>(path: &Path, artifact: &str) -> BeerResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| BeerError::artifact(artifact, format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| BeerError::artifact(artifact, format!("{}: {e}", path.display())))
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> BeerResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BeerError::serialization(format!("writing {}", path.display()), e))?;
    fs::write(path, json).map_err(|e| BeerError::io(format!("writing {}", path.display()), e))
}

/// Persist the three fitted transformers into the artefacts directory.
pub fn save_transformers(
    cfg: &ArtefactConfig,
    target_encoder: &TargetEncoder,
    ordinal_encoder: &OrdinalEncoder,
    scaler: &MinMaxScaler,
) -> BeerResult<()> {
    fs::create_dir_all(&cfg.dir)
        .map_err(|e| BeerError::io(format!("creating {}", cfg.dir.display()), e))?;
    write_artifact(&cfg.target_encoder_path(), target_encoder)?;
    write_artifact(&cfg.ordinal_encoder_path(), ordinal_encoder)?;
    write_artifact(&cfg.min_max_scaler_path(), scaler)?;
    info!("Transformers written to {}", cfg.dir.display());
    Ok(())
}

/// Load only the transformers, for the offline tools that run before weights exist.
pub fn load_transformers(cfg: &ArtefactConfig) -> BeerResult<(FeaturePipeline, OrdinalEncoder)> {
    let target_encoder: TargetEncoder = read_artifact(&cfg.target_encoder_path(), "target_encoder")?;
    let ordinal_encoder: OrdinalEncoder =
        read_artifact(&cfg.ordinal_encoder_path(), "ordinal_encoder")?;
    let scaler: MinMaxScaler = read_artifact(&cfg.min_max_scaler_path(), "min_max_scaler")?;

    let pipeline = FeaturePipeline::new(target_encoder, scaler)?;
    ordinal_encoder.check()?;
    check_label_space(&pipeline, &ordinal_encoder)?;
    Ok((pipeline, ordinal_encoder))
}

/// Hash every artifact and write the manifest next to them.
pub fn write_manifest(cfg: &ArtefactConfig, shape: ModelShape) -> BeerResult<ArtifactManifest> {
    let mut files = BTreeMap::new();
    for name in [
        &cfg.target_encoder,
        &cfg.ordinal_encoder,
        &cfg.min_max_scaler,
        &cfg.model_weights,
    ] {
        files.insert(name.clone(), hash_file(&cfg.dir.join(name))?);
    }
    let manifest = ArtifactManifest {
        version: MANIFEST_VERSION.to_string(),
        shape,
        created_at: Utc::now(),
        files,
    };
    write_artifact(&cfg.manifest_path(), &manifest)?;
    Ok(manifest)
}

fn verify_manifest(cfg: &ArtefactConfig, manifest: &ArtifactManifest) -> BeerResult<()> {
    for (name, expected) in &manifest.files {
        let actual = hash_file(&cfg.dir.join(name))
            .map_err(|e| BeerError::artifact(name.as_str(), e.to_string()))?;
        if &actual != expected {
            return Err(BeerError::artifact(
                name.as_str(),
                format!("sha256 {actual} does not match manifest {expected}"),
            ));
        }
        debug!("Verified {name}: {actual}");
    }
    Ok(())
}

/// Immutable bundle of everything the serving path reads.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    pub pipeline: FeaturePipeline,
    pub ordinal_encoder: OrdinalEncoder,
    pub classifier: BeerClassifier,
    pub manifest: Option<ArtifactManifest>,
}

impl ArtifactStore {
    /// Assemble from in-memory parts, enforcing the same consistency rules as `load`.
    pub fn from_parts(
        pipeline: FeaturePipeline,
        ordinal_encoder: OrdinalEncoder,
        classifier: BeerClassifier,
    ) -> BeerResult<Self> {
        ordinal_encoder.check()?;
        check_label_space(&pipeline, &ordinal_encoder)?;
        let expected = ModelShape::new(
            pipeline.width(),
            classifier.shape().hidden,
            ordinal_encoder.len(),
        );
        if classifier.shape() != expected {
            return Err(BeerError::artifact(
                "model_weights",
                format!(
                    "model shape {:?} does not match transformers {:?}",
                    classifier.shape(),
                    expected
                ),
            ));
        }
        Ok(Self {
            pipeline,
            ordinal_encoder,
            classifier: classifier.eval(),
            manifest: None,
        })
    }

    pub fn load(cfg: &ArtefactConfig, model: &ModelConfig, device: &Device) -> BeerResult<Self> {
        info!("Loading artefacts from {}", cfg.dir.display());

        let manifest_path = cfg.manifest_path();
        let manifest = if manifest_path.exists() {
            let manifest: ArtifactManifest = read_artifact(&manifest_path, "model_manifest")?;
            verify_manifest(cfg, &manifest)?;
            Some(manifest)
        } else {
            warn!(
                "No manifest at {}; artefact digests are not verified",
                manifest_path.display()
            );
            None
        };

        let (pipeline, ordinal_encoder) = load_transformers(cfg)?;

        let shape = ModelShape::new(pipeline.width(), model.hidden, ordinal_encoder.len());
        if let Some(m) = &manifest {
            if m.shape != shape {
                return Err(BeerError::artifact(
                    "model_manifest",
                    format!("manifest shape {:?} does not match {:?}", m.shape, shape),
                ));
            }
        }

        let weights_path = cfg.model_weights_path();
        if !weights_path.exists() {
            return Err(BeerError::artifact(
                "model_weights",
                format!("{} does not exist", weights_path.display()),
            ));
        }
        let classifier = BeerClassifier::load(&weights_path, shape, model.dropout, device)
            .map_err(|e| BeerError::artifact("model_weights", e.to_string()))?;

        info!(
            "Artefacts loaded: {} features -> {} hidden -> {} styles",
            shape.num_features, shape.hidden, shape.num_classes
        );

        Ok(Self {
            pipeline,
            ordinal_encoder,
            classifier,
            manifest,
        })
    }
}

fn check_label_space(pipeline: &FeaturePipeline, ordinal: &OrdinalEncoder) -> BeerResult<()> {
    let encoded = pipeline.target_encoder.width();
    if encoded + 1 != ordinal.len() {
        return Err(BeerError::artifact(
            "target_encoder",
            format!(
                "{encoded} encoded classes do not fit a label space of {} styles",
                ordinal.len()
            ),
        ));
    }
    Ok(())
}
