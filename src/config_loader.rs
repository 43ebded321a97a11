use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::{DEFAULT_DROPOUT, HIDDEN_UNITS};

pub const DEFAULT_CONFIG_FILE: &str = "deep_beer.toml";
pub const ENV_PREFIX: &str = "DEEP_BEER_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtefactConfig {
    pub dir: PathBuf,
    pub target_encoder: String,
    pub ordinal_encoder: String,
    pub min_max_scaler: String,
    pub model_weights: String,
    pub manifest: String,
}

impl Default for ArtefactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artefacts"),
            target_encoder: "target_encoder.json".to_string(),
            ordinal_encoder: "ordinal_encoder.json".to_string(),
            min_max_scaler: "min_max_scaler.json".to_string(),
            model_weights: "deep_beer_state.safetensors".to_string(),
            manifest: "model_manifest.json".to_string(),
        }
    }
}

impl ArtefactConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn target_encoder_path(&self) -> PathBuf {
        self.dir.join(&self.target_encoder)
    }

    pub fn ordinal_encoder_path(&self) -> PathBuf {
        self.dir.join(&self.ordinal_encoder)
    }

    pub fn min_max_scaler_path(&self) -> PathBuf {
        self.dir.join(&self.min_max_scaler)
    }

    pub fn model_weights_path(&self) -> PathBuf {
        self.dir.join(&self.model_weights)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(&self.manifest)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub hidden: usize,
    pub dropout: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden: HIDDEN_UNITS,
            dropout: DEFAULT_DROPOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub artefacts: ArtefactConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BeerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            artefacts: ArtefactConfig::default(),
            model: ModelConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl BeerConfig {
    /// Max level for the tracing subscriber; unknown names fall back to INFO.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// Defaults, then the TOML file, then `DEEP_BEER_*` env vars (`__` nests).
pub fn figment(config_path: Option<&Path>) -> Figment {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    Figment::from(Serialized::defaults(BeerConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load_config(config_path: Option<&Path>) -> Result<BeerConfig, figment::Error> {
    let config: BeerConfig = figment(config_path).extract()?;

    if config.server.allowed_origins.is_empty() {
        return Err(figment::Error::from(
            "server.allowed_origins must list at least one origin".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&config.model.dropout) {
        return Err(figment::Error::from(format!(
            "model.dropout must be in [0, 1), got {}",
            config.model.dropout
        )));
    }

    Ok(config)
}
