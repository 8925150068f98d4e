//! On-disk power model artifact.
//!
//! A single JSON document tagged with the model kind. Random forests embed
//! their fitted trees as bincode bytes.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::models::{LinearRegressionModel, MLModel};
use super::ModelMetadata;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum PowerModelArtifact {
    Linear(LinearRegressionModel),
    #[cfg(feature = "ml")]
    RandomForest(super::smartcore::SmartcoreRandomForest),
}

impl PowerModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("reading model artifact {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing model artifact {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_vec(self)?;
        fs::write(path, json).with_context(|| format!("writing model artifact {}", path.display()))
    }

    pub fn metadata(&self) -> &ModelMetadata {
        match self {
            Self::Linear(model) => &model.metadata,
            #[cfg(feature = "ml")]
            Self::RandomForest(model) => &model.metadata,
        }
    }

    /// Turn the artifact into a shareable, ready-to-query model.
    pub fn into_model(self) -> Result<Arc<dyn MLModel>> {
        match self {
            Self::Linear(model) => Ok(Arc::new(model)),
            #[cfg(feature = "ml")]
            Self::RandomForest(mut model) => {
                model.restore_from_serialization()?;
                Ok(Arc::new(model))
            }
        }
    }
}
