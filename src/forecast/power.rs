use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::ForecastError;
use crate::domain::{DerivedUsage, MeterReading, Recommendation, Tariff, FEATURE_NAMES};
use crate::ml::{models::MLModel, FeatureVector, ModelMetadata};

/// Result of a power estimate for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerEstimation {
    /// Estimated instantaneous draw (kW), never negative
    pub power_kw: f64,
    pub usage: DerivedUsage,
    pub recommendation: Recommendation,
}

/// Turns a metering reading into a power estimate, usage and billing figures.
pub struct PowerEstimator {
    model: Arc<dyn MLModel>,
    tariff: Tariff,
}

impl PowerEstimator {
    pub fn new(model: Arc<dyn MLModel>, tariff: Tariff) -> Self {
        Self { model, tariff }
    }

    pub fn estimate(&self, reading: &MeterReading) -> Result<PowerEstimation, ForecastError> {
        let features = FeatureVector::new(
            reading.features().to_vec(),
            FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
        )
        .map_err(ForecastError::model)?;

        let raw = self
            .model
            .predict(&features)
            .map_err(ForecastError::model)?
            .value;
        if !raw.is_finite() {
            return Err(ForecastError::Model(format!("non-finite prediction {}", raw)));
        }

        let power_kw = raw.max(0.0);
        if raw < 0.0 {
            debug!(raw_kw = raw, "clamping negative power estimate");
        }

        Ok(PowerEstimation {
            power_kw,
            usage: DerivedUsage::from_power(power_kw, &self.tariff),
            recommendation: Recommendation::from_sub_metering(
                reading.sub_metering_1,
                reading.sub_metering_2,
                reading.sub_metering_3,
            ),
        })
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    pub fn model_metadata(&self) -> &ModelMetadata {
        self.model.metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::models::{test_support::metadata, LinearRegressionModel};
    use crate::ml::Prediction;

    /// Returns a fixed value regardless of input.
    struct FixedModel {
        value: f64,
        metadata: ModelMetadata,
    }

    impl MLModel for FixedModel {
        fn predict(&self, _features: &FeatureVector) -> anyhow::Result<Prediction> {
            Ok(Prediction::new(self.value))
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.metadata
        }
    }

    struct FailingModel(ModelMetadata);

    impl MLModel for FailingModel {
        fn predict(&self, _features: &FeatureVector) -> anyhow::Result<Prediction> {
            anyhow::bail!("weights corrupted")
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.0
        }
    }

    fn estimator(value: f64) -> PowerEstimator {
        PowerEstimator::new(
            Arc::new(FixedModel {
                value,
                metadata: metadata(10),
            }),
            Tariff::default(),
        )
    }

    fn reading(sm1: f64, sm2: f64, sm3: f64) -> MeterReading {
        MeterReading {
            global_reactive_power: 0.1,
            voltage: 240.0,
            global_intensity: 6.2,
            sub_metering_1: sm1,
            sub_metering_2: sm2,
            sub_metering_3: sm3,
            hour: 18,
            day: 3,
            month: 1,
            weekday: 2,
        }
    }

    #[test]
    fn test_reference_estimate() {
        let estimation = estimator(1.5).estimate(&reading(5.0, 2.0, 1.0)).unwrap();
        assert_eq!(estimation.power_kw, 1.5);
        assert_eq!(estimation.usage.daily_kwh, 14.4);
        assert_eq!(estimation.usage.monthly_kwh, 432.0);
        assert_eq!(estimation.usage.monthly_bill_eur, 95.04);
        assert_eq!(estimation.recommendation, Recommendation::Kitchen);
    }

    #[test]
    fn test_tied_sub_metering_is_balanced() {
        let estimation = estimator(1.0).estimate(&reading(3.0, 3.0, 1.0)).unwrap();
        assert_eq!(estimation.recommendation, Recommendation::Balanced);
    }

    #[test]
    fn test_negative_prediction_is_clamped() {
        let estimation = estimator(-0.3).estimate(&reading(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(estimation.power_kw, 0.0);
        assert_eq!(estimation.usage.monthly_bill_eur, 0.0);
    }

    #[test]
    fn test_non_finite_prediction_fails() {
        let err = estimator(f64::NAN).estimate(&reading(0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, ForecastError::Model(_)));
    }

    #[test]
    fn test_model_failure_is_reported() {
        let estimator = PowerEstimator::new(Arc::new(FailingModel(metadata(10))), Tariff::default());
        let err = estimator.estimate(&reading(1.0, 2.0, 3.0)).unwrap_err();
        assert_eq!(err.to_string(), "model failure: weights corrupted");
    }

    #[test]
    fn test_features_reach_model_in_order() {
        // Weight only Sub_metering_3 (index 5) and Weekday (index 9)
        let mut coefficients = vec![0.0; 10];
        coefficients[5] = 0.1;
        coefficients[9] = 1.0;
        let model = LinearRegressionModel::new(coefficients, 0.0, metadata(10));
        let estimator = PowerEstimator::new(Arc::new(model), Tariff::default());

        let estimation = estimator.estimate(&reading(0.0, 0.0, 10.0)).unwrap();
        assert_eq!(estimation.power_kw, 3.0);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let estimator = estimator(2.345);
        let input = reading(1.0, 7.0, 2.0);
        assert_eq!(
            estimator.estimate(&input).unwrap(),
            estimator.estimate(&input).unwrap()
        );
    }
}
