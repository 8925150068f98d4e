use std::sync::Arc;

use anyhow::Result;

use super::ForecastError;
use crate::domain::{round2, ForecastResult, Horizon, Tariff};
use crate::ml::arima::Arima;

/// A fitted time-series model that can project the series forward.
pub trait TimeSeriesModel: Send + Sync {
    /// Point forecasts for the next `steps` periods.
    fn forecast(&self, steps: usize) -> Result<Vec<f64>>;

    /// Short human-readable model description for logs and health output.
    fn describe(&self) -> String;
}

impl TimeSeriesModel for Arima {
    fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
        Ok(Arima::forecast(self, steps))
    }

    fn describe(&self) -> String {
        format!("{} on {} months", self.order(), self.observations())
    }
}

/// Forecasts the consumption of a single future month and its bill.
pub struct ConsumptionForecaster {
    model: Arc<dyn TimeSeriesModel>,
    tariff: Tariff,
}

impl ConsumptionForecaster {
    pub fn new(model: Arc<dyn TimeSeriesModel>, tariff: Tariff) -> Self {
        Self { model, tariff }
    }

    /// Forecast month `horizon`.
    ///
    /// Only the last step of the projection is reported: the value is the
    /// model's estimate for that one month, not a total over the horizon.
    pub fn forecast(&self, horizon: Horizon) -> Result<ForecastResult, ForecastError> {
        let projection = self
            .model
            .forecast(horizon.steps())
            .map_err(ForecastError::model)?;

        let last = *projection.last().ok_or_else(|| {
            ForecastError::Model(format!("empty projection for {} months", horizon.months()))
        })?;
        if !last.is_finite() {
            return Err(ForecastError::Model(format!("non-finite forecast {}", last)));
        }

        let predicted_consumption_kwh = round2(last);
        Ok(ForecastResult {
            horizon_months: horizon.months(),
            predicted_consumption_kwh,
            predicted_bill_eur: self.tariff.bill_for(predicted_consumption_kwh),
        })
    }

    pub fn describe_model(&self) -> String {
        self.model.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::arima::ArimaOrder;

    /// Month `k` is forecast as `100 * k + 0.123`.
    struct RampModel;

    impl TimeSeriesModel for RampModel {
        fn forecast(&self, steps: usize) -> Result<Vec<f64>> {
            Ok((1..=steps).map(|k| 100.0 * k as f64 + 0.123).collect())
        }

        fn describe(&self) -> String {
            "ramp".to_string()
        }
    }

    struct EmptyModel;

    impl TimeSeriesModel for EmptyModel {
        fn forecast(&self, _steps: usize) -> Result<Vec<f64>> {
            Ok(Vec::new())
        }

        fn describe(&self) -> String {
            "empty".to_string()
        }
    }

    fn horizon(months: i64) -> Horizon {
        Horizon::new(months, 600).unwrap()
    }

    #[test]
    fn test_reports_last_step_not_sum() {
        let forecaster = ConsumptionForecaster::new(Arc::new(RampModel), Tariff::default());
        let result = forecaster.forecast(horizon(3)).unwrap();

        assert_eq!(result.horizon_months, 3);
        assert_eq!(result.predicted_consumption_kwh, 300.12);
        assert_eq!(result.predicted_bill_eur, round2(300.12 * 0.22));
    }

    #[test]
    fn test_single_step_horizon() {
        let forecaster = ConsumptionForecaster::new(Arc::new(RampModel), Tariff::default());
        let result = forecaster.forecast(horizon(1)).unwrap();
        assert_eq!(result.predicted_consumption_kwh, 100.12);
        assert_eq!(result.predicted_bill_eur, 22.03);
    }

    #[test]
    fn test_empty_projection_is_model_error() {
        let forecaster = ConsumptionForecaster::new(Arc::new(EmptyModel), Tariff::default());
        assert!(matches!(
            forecaster.forecast(horizon(2)),
            Err(ForecastError::Model(_))
        ));
    }

    #[test]
    fn test_arima_backed_forecast_is_idempotent() {
        let series: Vec<f64> = (0..36)
            .map(|i| 800.0 + 40.0 * ((i % 12) as f64 - 6.0).abs())
            .collect();
        let arima = Arima::fit(ArimaOrder::default(), &series).unwrap();
        let forecaster = ConsumptionForecaster::new(Arc::new(arima), Tariff::default());

        let first = forecaster.forecast(horizon(12)).unwrap();
        let second = forecaster.forecast(horizon(12)).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.predicted_bill_eur,
            round2(first.predicted_consumption_kwh * 0.22)
        );
        assert_eq!(forecaster.describe_model(), "ARIMA(2,1,2) on 36 months");
    }
}
