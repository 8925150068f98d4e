//! Machine Learning Module
//!
//! Regression and time-series models behind the two prediction services:
//! - Instantaneous power regression from a metering reading
//! - Monthly consumption forecasting (ARIMA)
//!
//! # Architecture
//! - Offline training pipeline producing a JSON model artifact
//! - Artifact loading at startup into a shared, read-only model handle
//! - Feature scaling carried inside the artifact

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod arima;
pub mod artifact;
pub mod models;
pub mod training;

#[cfg(feature = "ml")]
pub mod smartcore;

/// ML Model Type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelType {
    LinearRegression,
    RandomForest,
}

/// ML Model Metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    pub version: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    pub validation_metrics: ValidationMetrics,
    pub feature_names: Vec<String>,
}

/// Validation Metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub mape: f64, // Mean Absolute Percentage Error
    pub r2: f64,   // R-squared
}

impl ValidationMetrics {
    pub fn new(mae: f64, rmse: f64, mape: f64, r2: f64) -> Self {
        Self {
            mae,
            rmse,
            mape,
            r2,
        }
    }
}

/// Feature Vector for ML models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Standardize features using z-score normalization
    pub fn standardize(&self, means: &[f64], stds: &[f64]) -> Result<Self> {
        if means.len() != self.features.len() || stds.len() != self.features.len() {
            anyhow::bail!("Standardization parameter count mismatch");
        }

        let standardized = self
            .features
            .iter()
            .zip(means.iter().zip(stds.iter()))
            .map(|(f, (mean, std))| {
                if std.abs() < 1e-10 {
                    0.0 // Constant column
                } else {
                    (f - mean) / std
                }
            })
            .collect();

        Ok(Self {
            features: standardized,
            feature_names: self.feature_names.clone(),
        })
    }
}

/// Per-feature mean and standard deviation learned at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaling {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FeatureScaling {
    /// Fit population mean/std per column.
    pub fn fit(rows: &[FeatureVector]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| anyhow::anyhow!("Cannot fit scaling on empty dataset"))?;
        let n_features = first.len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; n_features];
        for row in rows {
            if row.len() != n_features {
                anyhow::bail!("All feature vectors must have the same length");
            }
            for (mean, value) in means.iter_mut().zip(row.features.iter()) {
                *mean += value / n;
            }
        }

        let mut stds = vec![0.0; n_features];
        for row in rows {
            for ((std, mean), value) in stds.iter_mut().zip(means.iter()).zip(row.features.iter())
            {
                *std += (value - mean).powi(2) / n;
            }
        }
        stds.iter_mut().for_each(|v| *v = v.sqrt());

        Ok(Self { means, stds })
    }

    pub fn apply(&self, features: &FeatureVector) -> Result<FeatureVector> {
        features.standardize(&self.means, &self.stds)
    }
}

/// ML Prediction Result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
}

impl Prediction {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}
