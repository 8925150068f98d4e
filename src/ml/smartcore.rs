//! SmartCore ML Model Wrapper
//!
//! Wraps SmartCore's RandomForestRegressor for power estimation. The fitted
//! forest travels inside the JSON artifact as bincode bytes.

use super::{FeatureVector, ModelMetadata, ModelType, Prediction};
use anyhow::Result;
use serde::{Deserialize, Serialize};

use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// SmartCore RandomForest Model Wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct SmartcoreRandomForest {
    pub metadata: ModelMetadata,
    #[serde(skip)]
    model: Option<Forest>,
    /// Serialized model bytes (for persistence)
    model_bytes: Option<Vec<u8>>,
    /// Training parameters for reproducibility
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl SmartcoreRandomForest {
    /// Create a new RandomForest model with trained instance
    pub fn new(model: Forest, metadata: ModelMetadata, params: &RandomForestRegressorParameters) -> Self {
        Self {
            metadata,
            model: Some(model),
            model_bytes: None,
            n_trees: params.n_trees,
            max_depth: params.max_depth.map(|d| d as usize),
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        }
    }

    /// Default training parameters
    ///
    /// - 50 trees
    /// - Max depth 10
    /// - Min samples split 5
    pub fn default_parameters() -> RandomForestRegressorParameters {
        Self::custom_parameters(50, Some(10), 5)
    }

    /// Parameters with custom settings
    pub fn custom_parameters(
        n_trees: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
    ) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters {
            max_depth: max_depth.map(|d| d.min(u16::MAX as usize) as u16),
            min_samples_leaf: 2,
            min_samples_split,
            n_trees,
            m: None, // sqrt(n_features)
            keep_samples: false,
            seed: 42,
        }
    }

    /// Train a new RandomForest model
    pub fn train(
        x: &[Vec<f64>],
        y: &[f64],
        params: RandomForestRegressorParameters,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            anyhow::bail!("Cannot train on empty dataset");
        }

        if x.len() != y.len() {
            anyhow::bail!(
                "Feature and target count mismatch: {} features, {} targets",
                x.len(),
                y.len()
            );
        }

        let x_matrix = to_matrix(x)?;
        let y_vec = y.to_vec();

        let model = RandomForestRegressor::fit(&x_matrix, &y_vec, params.clone())
            .map_err(|e| anyhow::anyhow!("RandomForest training failed: {:?}", e))?;

        let predictions = model
            .predict(&x_matrix)
            .map_err(|e| anyhow::anyhow!("Prediction failed during validation: {:?}", e))?;
        let metrics = super::training::calculate_metrics(&predictions, y)?;

        let metadata = ModelMetadata {
            model_id: format!("smartcore_rf_{}", uuid::Uuid::new_v4()),
            model_type: ModelType::RandomForest,
            version: "1.0.0".to_string(),
            trained_at: chrono::Utc::now(),
            training_samples: x.len(),
            validation_metrics: metrics,
            feature_names,
        };

        Ok(Self::new(model, metadata, &params))
    }

    /// Predict a batch of rows.
    pub fn predict_rows(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Model not loaded"))?;
        model
            .predict(&to_matrix(x)?)
            .map_err(|e| anyhow::anyhow!("Prediction failed: {:?}", e))
    }

    /// Prepare model for serialization
    pub fn prepare_for_serialization(&mut self) -> Result<()> {
        if let Some(model) = &self.model {
            let bytes = bincode::serialize(model)
                .map_err(|e| anyhow::anyhow!("Failed to serialize model: {}", e))?;
            self.model_bytes = Some(bytes);
        }
        Ok(())
    }

    /// Restore model from serialized bytes
    pub fn restore_from_serialization(&mut self) -> Result<()> {
        let bytes = self
            .model_bytes
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Artifact carries no model bytes"))?;
        let model: Forest = bincode::deserialize(bytes)
            .map_err(|e| anyhow::anyhow!("Failed to deserialize model: {}", e))?;
        self.model = Some(model);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}

fn to_matrix(x: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let n_samples = x.len();
    let n_features = x.first().map(Vec::len).unwrap_or(0);

    let mut flat_data = Vec::with_capacity(n_samples * n_features);
    for row in x {
        if row.len() != n_features {
            anyhow::bail!("All feature vectors must have the same length");
        }
        flat_data.extend_from_slice(row);
    }

    Ok(DenseMatrix::new(n_samples, n_features, flat_data, false))
}

impl super::models::MLModel for SmartcoreRandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let predictions = self.predict_rows(std::slice::from_ref(&features.features))?;

        let value = *predictions
            .first()
            .ok_or_else(|| anyhow::anyhow!("Model returned empty predictions"))?;

        if !value.is_finite() {
            anyhow::bail!("Invalid prediction: {} kW", value);
        }

        Ok(Prediction::new(value))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
