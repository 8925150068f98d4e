//! ARIMA (AutoRegressive Integrated Moving Average) model
//!
//! - **AR**: past values of the differenced series (Yule-Walker via Levinson-Durbin)
//! - **I**: `d` rounds of differencing, integrated back after forecasting
//! - **MA**: past one-step errors, estimated from residual autocorrelation
//!
//! A fitted model is immutable; forecasting never refits or records state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArimaError {
    #[error("invalid ARIMA order {name}: {reason}")]
    InvalidOrder { name: &'static str, reason: String },

    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Model orders `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    fn validate(&self) -> Result<(), ArimaError> {
        if self.p > 10 {
            return Err(ArimaError::InvalidOrder {
                name: "p",
                reason: "AR order must be <= 10".to_string(),
            });
        }
        if self.d > 2 {
            return Err(ArimaError::InvalidOrder {
                name: "d",
                reason: "Differencing order must be <= 2".to_string(),
            });
        }
        if self.q > 10 {
            return Err(ArimaError::InvalidOrder {
                name: "q",
                reason: "MA order must be <= 10".to_string(),
            });
        }
        Ok(())
    }

    /// Minimum series length accepted by `Arima::fit`.
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 10
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(2, 1, 2)
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Fitted ARIMA model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arima {
    order: ArimaOrder,
    ar_coeffs: Vec<f64>,
    ma_coeffs: Vec<f64>,
    /// Series mean when `d == 0`, zero otherwise
    constant: f64,
    /// Last value of the series at each differencing level `0..d`
    last_levels: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    observations: usize,
}

impl Arima {
    pub fn fit(order: ArimaOrder, data: &[f64]) -> Result<Self, ArimaError> {
        order.validate()?;

        let required = order.min_observations();
        if data.len() < required {
            return Err(ArimaError::InsufficientData {
                required,
                actual: data.len(),
            });
        }

        if data.iter().any(|x| !x.is_finite()) {
            return Err(ArimaError::InvalidData(
                "Data contains NaN or infinite values".to_string(),
            ));
        }

        let mut last_levels = Vec::with_capacity(order.d);
        let mut differenced = data.to_vec();
        for _ in 0..order.d {
            last_levels.push(differenced[differenced.len() - 1]);
            differenced = difference(&differenced);
        }

        // No intercept once differenced: it would integrate into a drift
        let n = differenced.len();
        let constant = if order.d == 0 {
            differenced.iter().sum::<f64>() / n as f64
        } else {
            0.0
        };
        let ar_coeffs = yule_walker(&differenced, constant, order.p);

        let mut residuals = vec![0.0; n];
        for i in order.p..n {
            let mut prediction = constant;
            for (j, coeff) in ar_coeffs.iter().enumerate() {
                prediction += coeff * (differenced[i - j - 1] - constant);
            }
            residuals[i] = differenced[i] - prediction;
        }

        let ma_coeffs = residual_autocorrelation(&residuals, order.q);

        Ok(Self {
            order,
            ar_coeffs,
            ma_coeffs,
            constant,
            last_levels,
            differenced,
            residuals,
            observations: data.len(),
        })
    }

    /// Point forecasts for the next `steps` periods on the original scale.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        if steps == 0 {
            return Vec::new();
        }

        let n = self.differenced.len();
        let mut extended = self.differenced.clone();
        let mut extended_residuals = self.residuals.clone();

        for _ in 0..steps {
            let mut forecast = self.constant;

            for (j, coeff) in self.ar_coeffs.iter().enumerate() {
                let idx = extended.len() - j - 1;
                forecast += coeff * (extended[idx] - self.constant);
            }

            for (j, coeff) in self.ma_coeffs.iter().enumerate() {
                if extended_residuals.len() > j {
                    let idx = extended_residuals.len() - j - 1;
                    forecast += coeff * extended_residuals[idx];
                }
            }

            extended.push(forecast);
            extended_residuals.push(0.0); // expected future shock
        }

        self.integrate(extended[n..].to_vec())
    }

    /// Undo differencing, innermost level first.
    fn integrate(&self, mut forecasts: Vec<f64>) -> Vec<f64> {
        for last in self.last_levels.iter().rev() {
            let mut level = *last;
            for value in forecasts.iter_mut() {
                level += *value;
                *value = level;
            }
        }
        forecasts
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coeffs
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coeffs
    }

    /// Length of the series the model was fitted on
    pub fn observations(&self) -> usize {
        self.observations
    }
}

fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// AR coefficients from the Yule-Walker equations, solved by Levinson-Durbin.
///
/// Autocovariances are taken around `mean`, the model intercept.
fn yule_walker(data: &[f64], mean: f64, p: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; p];
    if p == 0 {
        return coeffs;
    }

    let n = data.len();
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();

    let autocov: Vec<f64> = (0..=p)
        .map(|k| {
            (k..n).map(|i| centered[i] * centered[i - k]).sum::<f64>() / n as f64
        })
        .collect();

    let mut error = autocov[0];
    if error.abs() < 1e-10 {
        return coeffs;
    }

    for k in 0..p {
        let mut acc = autocov[k + 1];
        for j in 0..k {
            acc -= coeffs[j] * autocov[k - j];
        }
        let reflection = acc / error;

        let previous = coeffs.clone();
        coeffs[k] = reflection;
        for j in 0..k {
            coeffs[j] = previous[j] - reflection * previous[k - 1 - j];
        }

        error *= 1.0 - reflection * reflection;
        if error.abs() < 1e-10 {
            break;
        }
    }

    coeffs
}

/// MA coefficients as bounded residual autocorrelations.
fn residual_autocorrelation(residuals: &[f64], q: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; q];
    if q == 0 || residuals.is_empty() {
        return coeffs;
    }

    let n = residuals.len();
    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|x| x - mean).collect();
    let var = centered.iter().map(|x| x * x).sum::<f64>() / n as f64;

    if var.abs() > 1e-10 {
        for (k, coeff) in coeffs.iter_mut().enumerate() {
            let lagged: f64 = ((k + 1)..n)
                .map(|i| centered[i] * centered[i - k - 1])
                .sum();
            *coeff = ((lagged / n as f64) / var).clamp(-0.99, 0.99);
        }
    }

    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                900.0 + 2.0 * t + 150.0 * (t * std::f64::consts::PI / 6.0).cos()
            })
            .collect()
    }

    #[test]
    fn test_order_validation() {
        assert!(Arima::fit(ArimaOrder::new(11, 0, 0), &seasonal_series(40)).is_err());
        assert!(matches!(
            Arima::fit(ArimaOrder::new(1, 3, 0), &seasonal_series(40)),
            Err(ArimaError::InvalidOrder { name: "d", .. })
        ));
    }

    #[test]
    fn test_insufficient_data() {
        let err = Arima::fit(ArimaOrder::default(), &seasonal_series(14)).unwrap_err();
        assert_eq!(
            err,
            ArimaError::InsufficientData {
                required: 15,
                actual: 14
            }
        );
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut data = seasonal_series(30);
        data[4] = f64::NAN;
        assert!(matches!(
            Arima::fit(ArimaOrder::default(), &data),
            Err(ArimaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_trend_is_not_extrapolated_as_drift() {
        let data: Vec<f64> = (0..20).map(|t| 10.0 + 3.0 * t as f64).collect();
        let model = Arima::fit(ArimaOrder::default(), &data).unwrap();

        let forecast = model.forecast(600);
        assert_eq!(forecast.len(), 600);
        // The next step follows the recent slope, later steps level off
        assert!(forecast[0] > 67.0 && forecast[0] < 71.0, "{}", forecast[0]);
        assert!(forecast[599] < 67.0 + 150.0, "{}", forecast[599]);
        assert!((forecast[599] - forecast[598]).abs() < 1e-3);
    }

    #[test]
    fn test_level_series_with_partial_first_month_stays_bounded() {
        let mut data: Vec<f64> = (0..48)
            .map(|t| 1000.0 + 25.0 * (t as f64 * 1.3).sin())
            .collect();
        data[0] = 300.0;
        let model = Arima::fit(ArimaOrder::default(), &data).unwrap();

        let forecast = model.forecast(600);
        assert!(
            forecast.iter().all(|v| (700.0..1300.0).contains(v)),
            "forecast left the observed level: first {} last {}",
            forecast[0],
            forecast[599]
        );
    }

    #[test]
    fn test_stationary_model_keeps_its_mean() {
        let data: Vec<f64> = (0..40)
            .map(|t| 500.0 + 10.0 * (t as f64 * 0.9).cos())
            .collect();
        let model = Arima::fit(ArimaOrder::new(1, 0, 0), &data).unwrap();

        let forecast = model.forecast(300);
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        assert!((forecast[299] - mean).abs() < 1.0, "{} vs {}", forecast[299], mean);
    }

    #[test]
    fn test_second_order_differencing() {
        let data: Vec<f64> = (0..20).map(|t| (t * t) as f64).collect();
        let model = Arima::fit(ArimaOrder::new(1, 2, 0), &data).unwrap();

        // Second differences are all 2; the AR(1) term damps them by 17/18 per step
        let forecast = model.forecast(2);
        assert!((forecast[0] - (361.0 + 37.0 + 2.0 * 17.0 / 18.0)).abs() < 1e-9);
        assert!((forecast[1] - 440.562).abs() < 1e-3, "{}", forecast[1]);
    }

    #[test]
    fn test_constant_series() {
        let data = vec![42.0; 24];
        let model = Arima::fit(ArimaOrder::default(), &data).unwrap();
        assert!(model.forecast(6).iter().all(|v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn test_forecast_is_repeatable() {
        let model = Arima::fit(ArimaOrder::default(), &seasonal_series(48)).unwrap();
        let first = model.forecast(12);
        let second = model.forecast(12);
        assert_eq!(first, second);
        assert!(first.iter().all(|v| v.is_finite()));
        assert_eq!(model.observations(), 48);
        assert_eq!(model.ar_coefficients().len(), 2);
        assert_eq!(model.ma_coefficients().len(), 2);
    }

    #[test]
    fn test_longer_forecast_extends_shorter() {
        let model = Arima::fit(ArimaOrder::default(), &seasonal_series(48)).unwrap();
        let short = model.forecast(3);
        let long = model.forecast(6);
        assert_eq!(&long[..3], &short[..]);
        assert!(model.forecast(0).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(ArimaOrder::default().to_string(), "ARIMA(2,1,2)");
    }
}
