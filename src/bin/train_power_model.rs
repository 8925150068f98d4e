//! Offline trainer for the power regression artifact.
//!
//! Reads the same configuration as the server (`config/default.toml`,
//! `HPP__*` environment), samples training rows from the historical CSV and
//! writes the fitted model to `models.regression_path`.

use anyhow::{Context, Result};
use household_power_predictor::{
    config::Config,
    dataset::TrainingRows,
    ml::training::ModelTrainer,
    telemetry,
};
use tracing::info;

fn main() -> Result<()> {
    telemetry::init_tracing(telemetry::TOOL_FILTER);

    let cfg = Config::load()?;
    let delimiter = cfg.models.delimiter()?;

    let dataset = TrainingRows::from_csv(
        &cfg.models.dataset_path,
        delimiter,
        cfg.training.max_samples,
    )
    .with_context(|| format!("reading {}", cfg.models.dataset_path.display()))?;

    let artifact = ModelTrainer::new(cfg.training.clone()).train(&dataset)?;
    let metadata = artifact.metadata();
    info!(
        model_id = %metadata.model_id,
        model_type = ?metadata.model_type,
        training_samples = metadata.training_samples,
        mae = metadata.validation_metrics.mae,
        rmse = metadata.validation_metrics.rmse,
        r2 = metadata.validation_metrics.r2,
        "power model trained"
    );

    artifact
        .save(&cfg.models.regression_path)
        .with_context(|| format!("writing {}", cfg.models.regression_path.display()))?;
    info!(path = %cfg.models.regression_path.display(), "artifact written");
    Ok(())
}
