//! ML Model Definitions
//!
//! The regression capability used for power estimation.

use super::{FeatureScaling, FeatureVector, ModelMetadata, ModelType, Prediction};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Trait for ML models
pub trait MLModel: Send + Sync {
    /// Predict a value from features
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType {
        self.metadata().model_type
    }
}

/// Linear Regression Model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub metadata: ModelMetadata,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Scaling applied to raw features before the dot product
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<FeatureScaling>,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64, metadata: ModelMetadata) -> Self {
        Self {
            metadata,
            coefficients,
            intercept,
            scaling: None,
        }
    }

    pub fn with_scaling(mut self, scaling: FeatureScaling) -> Self {
        self.scaling = Some(scaling);
        self
    }
}

impl MLModel for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        if features.len() != self.coefficients.len() {
            anyhow::bail!(
                "Feature count mismatch: expected {}, got {}",
                self.coefficients.len(),
                features.len()
            );
        }

        let scaled;
        let features = match &self.scaling {
            Some(scaling) => {
                scaled = scaling.apply(features)?;
                &scaled
            }
            None => features,
        };

        let prediction: f64 = features
            .features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept;

        Ok(Prediction::new(prediction))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::ml::ValidationMetrics;

    pub fn metadata(n_features: usize) -> ModelMetadata {
        ModelMetadata {
            model_id: "test_linear".to_string(),
            model_type: ModelType::LinearRegression,
            version: "0.1.0".to_string(),
            trained_at: chrono::Utc::now(),
            training_samples: 100,
            validation_metrics: ValidationMetrics::new(0.5, 0.7, 5.0, 0.85),
            feature_names: (0..n_features).map(|i| format!("f{}", i)).collect(),
        }
    }
}
