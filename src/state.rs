use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::dataset::{DatasetError, MonthlySeries};
use crate::forecast::{ConsumptionForecaster, PowerEstimator, TimeSeriesModel};
use crate::ml::{
    arima::{Arima, ArimaError},
    artifact::PowerModelArtifact,
    models::MLModel,
};

/// A model could not be made ready. The service must not start.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("power model unavailable: {0}")]
    Regression(String),

    #[error("historical dataset unavailable: {0}")]
    Dataset(#[from] DatasetError),

    #[error("consumption forecaster could not be fitted: {0}")]
    Forecaster(#[from] ArimaError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Read-only handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub power: Arc<PowerEstimator>,
    pub consumption: Arc<ConsumptionForecaster>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Load the regression artifact and fit the forecaster on the historical CSV.
    pub fn load(cfg: Config) -> Result<Self, ModelError> {
        let artifact = PowerModelArtifact::load(&cfg.models.regression_path)
            .map_err(|e| ModelError::Regression(format!("{:#}", e)))?;
        let metadata = artifact.metadata().clone();
        let regression = artifact
            .into_model()
            .map_err(|e| ModelError::Regression(format!("{:#}", e)))?;
        info!(
            model_id = %metadata.model_id,
            model_type = ?metadata.model_type,
            training_samples = metadata.training_samples,
            r2 = metadata.validation_metrics.r2,
            "power model loaded"
        );

        let delimiter = cfg
            .models
            .delimiter()
            .map_err(|e| ModelError::Config(e.to_string()))?;
        let series = MonthlySeries::from_csv(&cfg.models.dataset_path, delimiter)?;
        let arima = Arima::fit(cfg.models.arima_order, series.values())?;
        info!(model = %arima.describe(), "consumption forecaster fitted");

        Ok(Self::from_parts(cfg, regression, Arc::new(arima)))
    }

    /// Assemble state from already-built models.
    pub fn from_parts(
        cfg: Config,
        regression: Arc<dyn MLModel>,
        time_series: Arc<dyn TimeSeriesModel>,
    ) -> Self {
        let tariff = cfg.billing.tariff();
        Self {
            power: Arc::new(PowerEstimator::new(regression, tariff)),
            consumption: Arc::new(ConsumptionForecaster::new(time_series, tariff)),
            cfg: Arc::new(cfg),
            started_at: Utc::now(),
        }
    }
}
