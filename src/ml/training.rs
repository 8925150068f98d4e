//! ML Model Training Pipeline
//!
//! Offline training of the power regression model from metering rows.

use super::{
    artifact::PowerModelArtifact, models::LinearRegressionModel, FeatureScaling, FeatureVector,
    ModelMetadata, ModelType, ValidationMetrics,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Training Dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
}

impl TrainingDataset {
    pub fn new(features: Vec<FeatureVector>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            anyhow::bail!(
                "Feature and target count mismatch: {} features, {} targets",
                features.len(),
                targets.len()
            );
        }
        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features
            .first()
            .map(|f| f.feature_names.clone())
            .unwrap_or_default()
    }

    /// Split dataset into training and validation sets, keeping row order
    pub fn split(&self, train_ratio: f64) -> Result<(TrainingDataset, TrainingDataset)> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            anyhow::bail!("Train ratio must be between 0 and 1");
        }

        let split_idx = (self.len() as f64 * train_ratio).floor() as usize;

        let train = TrainingDataset {
            features: self.features[..split_idx].to_vec(),
            targets: self.targets[..split_idx].to_vec(),
        };

        let val = TrainingDataset {
            features: self.features[split_idx..].to_vec(),
            targets: self.targets[split_idx..].to_vec(),
        };

        Ok((train, val))
    }
}

/// Which regressor the trainer produces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    RandomForest,
}

/// Training Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model: ModelKind,
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub validation_split: f64,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Upper bound on rows taken from the dataset
    pub max_samples: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::RandomForest,
            learning_rate: 0.1,
            max_iterations: 1000,
            validation_split: 0.2,
            n_trees: 50,
            max_depth: Some(10),
            min_samples_split: 5,
            max_samples: 50_000,
        }
    }
}

/// Calculate validation metrics
pub fn calculate_metrics(predictions: &[f64], targets: &[f64]) -> Result<ValidationMetrics> {
    if predictions.len() != targets.len() {
        anyhow::bail!("Prediction and target count mismatch");
    }

    if predictions.is_empty() {
        anyhow::bail!("No predictions to evaluate");
    }

    let n = predictions.len() as f64;

    // Mean Absolute Error
    let mae: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / n;

    // Root Mean Square Error
    let mse: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n;
    let rmse = mse.sqrt();

    // Mean Absolute Percentage Error
    let mape: f64 = predictions
        .iter()
        .zip(targets.iter())
        .filter(|(_, t)| t.abs() > 1e-10)
        .map(|(p, t)| ((p - t) / t).abs() * 100.0)
        .sum::<f64>()
        / n;

    // R-squared
    let mean_target: f64 = targets.iter().sum::<f64>() / n;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean_target).powi(2)).sum();
    let ss_res: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (t - p).powi(2))
        .sum();

    let r2 = if ss_tot.abs() < 1e-10 {
        0.0
    } else {
        1.0 - (ss_res / ss_tot)
    };

    Ok(ValidationMetrics::new(mae, rmse, mape, r2))
}

/// Model Trainer
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Train the configured model kind, scoring it on a held-out tail of the data.
    pub fn train(&self, dataset: &TrainingDataset) -> Result<PowerModelArtifact> {
        let (train, validation) = dataset.split(1.0 - self.config.validation_split)?;
        if train.is_empty() || validation.is_empty() {
            anyhow::bail!(
                "Dataset of {} rows is too small for a {:.0}% validation split",
                dataset.len(),
                self.config.validation_split * 100.0
            );
        }

        info!(
            model = ?self.config.model,
            train_rows = train.len(),
            validation_rows = validation.len(),
            "training power model"
        );

        match self.config.model {
            ModelKind::Linear => {
                let mut model = self.train_linear_regression(&train)?;
                let predictions = validation
                    .features
                    .iter()
                    .map(|f| super::models::MLModel::predict(&model, f).map(|p| p.value))
                    .collect::<Result<Vec<_>>>()?;
                model.metadata.validation_metrics =
                    calculate_metrics(&predictions, &validation.targets)?;
                Ok(PowerModelArtifact::Linear(model))
            }
            #[cfg(feature = "ml")]
            ModelKind::RandomForest => {
                let mut model = self.train_random_forest(&train)?;
                let rows: Vec<Vec<f64>> =
                    validation.features.iter().map(|f| f.features.clone()).collect();
                let predictions = model.predict_rows(&rows)?;
                model.metadata.validation_metrics =
                    calculate_metrics(&predictions, &validation.targets)?;
                model.prepare_for_serialization()?;
                Ok(PowerModelArtifact::RandomForest(model))
            }
            #[cfg(not(feature = "ml"))]
            ModelKind::RandomForest => {
                anyhow::bail!("Random forest training requires the `ml` feature")
            }
        }
    }

    /// Train a linear regression model by gradient descent on standardized features
    pub fn train_linear_regression(&self, dataset: &TrainingDataset) -> Result<LinearRegressionModel> {
        if dataset.is_empty() {
            anyhow::bail!("Cannot train on empty dataset");
        }

        let scaling = FeatureScaling::fit(&dataset.features)?;
        let scaled = dataset
            .features
            .iter()
            .map(|f| scaling.apply(f))
            .collect::<Result<Vec<_>>>()?;

        let n_features = scaled[0].len();
        let n = dataset.len() as f64;

        let mut coefficients = vec![0.0; n_features];
        let mut intercept = 0.0;

        for _iter in 0..self.config.max_iterations {
            let mut coef_gradients = vec![0.0; n_features];
            let mut intercept_gradient = 0.0;

            for (features, target) in scaled.iter().zip(dataset.targets.iter()) {
                let prediction: f64 = features
                    .features
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(f, c)| f * c)
                    .sum::<f64>()
                    + intercept;

                let error = prediction - target;

                for (gradient, feature_val) in coef_gradients.iter_mut().zip(features.features.iter())
                {
                    *gradient += error * feature_val / n;
                }
                intercept_gradient += error / n;
            }

            for (coef, gradient) in coefficients.iter_mut().zip(coef_gradients.iter()) {
                *coef -= self.config.learning_rate * gradient;
            }
            intercept -= self.config.learning_rate * intercept_gradient;
        }

        let predictions: Vec<f64> = scaled
            .iter()
            .map(|f| {
                f.features
                    .iter()
                    .zip(coefficients.iter())
                    .map(|(feat, coef)| feat * coef)
                    .sum::<f64>()
                    + intercept
            })
            .collect();

        let metrics = calculate_metrics(&predictions, &dataset.targets)?;

        let metadata = ModelMetadata {
            model_id: format!("linear_regression_{}", uuid::Uuid::new_v4()),
            model_type: ModelType::LinearRegression,
            version: "0.1.0".to_string(),
            trained_at: chrono::Utc::now(),
            training_samples: dataset.len(),
            validation_metrics: metrics,
            feature_names: dataset.feature_names(),
        };

        Ok(LinearRegressionModel::new(coefficients, intercept, metadata).with_scaling(scaling))
    }

    #[cfg(feature = "ml")]
    pub fn train_random_forest(
        &self,
        dataset: &TrainingDataset,
    ) -> Result<super::smartcore::SmartcoreRandomForest> {
        use super::smartcore::SmartcoreRandomForest;

        let params = SmartcoreRandomForest::custom_parameters(
            self.config.n_trees,
            self.config.max_depth,
            self.config.min_samples_split,
        );
        let x: Vec<Vec<f64>> = dataset.features.iter().map(|f| f.features.clone()).collect();
        SmartcoreRandomForest::train(&x, &dataset.targets, params, dataset.feature_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::MLModel;

    fn line_dataset(n: usize) -> TrainingDataset {
        // y = 2x + 1 with a second, constant feature
        let features = (0..n)
            .map(|i| {
                FeatureVector::new(
                    vec![i as f64, 230.0],
                    vec!["x".to_string(), "voltage".to_string()],
                )
                .unwrap()
            })
            .collect();
        let targets = (0..n).map(|i| 2.0 * i as f64 + 1.0).collect();
        TrainingDataset::new(features, targets).unwrap()
    }

    #[test]
    fn test_dataset_split() {
        let dataset = line_dataset(4);
        let (train, val) = dataset.split(0.75).unwrap();

        assert_eq!(train.len(), 3);
        assert_eq!(val.len(), 1);
        assert_eq!(val.targets, vec![7.0]);
        assert!(dataset.split(1.0).is_err());
    }

    #[test]
    fn test_dataset_rejects_mismatch() {
        let dataset = line_dataset(2);
        assert!(TrainingDataset::new(dataset.features, vec![1.0]).is_err());
    }

    #[test]
    fn test_calculate_metrics() {
        let predictions = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let targets = vec![1.1, 2.1, 2.9, 4.2, 4.8];

        let metrics = calculate_metrics(&predictions, &targets).unwrap();

        assert!(metrics.mae < 0.3);
        assert!(metrics.rmse < 0.4);
        assert!(metrics.r2 > 0.9);
        assert!(calculate_metrics(&[], &[]).is_err());
    }

    #[test]
    fn test_train_linear_regression() {
        let dataset = line_dataset(20);
        let trainer = ModelTrainer::new(TrainingConfig {
            model: ModelKind::Linear,
            ..TrainingConfig::default()
        });
        let model = trainer.train_linear_regression(&dataset).unwrap();

        assert!(model.scaling.is_some());
        assert!(model.metadata.validation_metrics.r2 > 0.99);

        let features =
            FeatureVector::new(vec![10.0, 230.0], vec!["x".to_string(), "voltage".to_string()])
                .unwrap();
        let pred = model.predict(&features).unwrap();
        assert!((pred.value - 21.0).abs() < 0.1);
    }

    #[test]
    fn test_train_produces_linear_artifact() {
        let trainer = ModelTrainer::new(TrainingConfig {
            model: ModelKind::Linear,
            ..TrainingConfig::default()
        });
        let artifact = trainer.train(&line_dataset(50)).unwrap();
        match artifact {
            PowerModelArtifact::Linear(model) => {
                assert_eq!(model.metadata.training_samples, 40);
                assert!(model.metadata.validation_metrics.mae < 0.5);
            }
            #[allow(unreachable_patterns)]
            _ => panic!("expected a linear model"),
        }
    }

    #[test]
    fn test_train_rejects_tiny_dataset() {
        let trainer = ModelTrainer::new(TrainingConfig::default());
        assert!(trainer.train(&line_dataset(1)).is_err());
    }
}
