use serde::{Deserialize, Serialize};

use super::{parse_integer, InputError};

/// Number of future months a forecast is requested for. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Horizon(u32);

impl Horizon {
    pub fn new(months: i64, max_months: u32) -> Result<Self, InputError> {
        if months < 1 {
            return Err(InputError::NonPositiveHorizon { value: months });
        }
        if months > i64::from(max_months) {
            return Err(InputError::HorizonTooLarge {
                value: months,
                max: max_months,
            });
        }
        Ok(Self(months as u32))
    }

    /// Parse the `future_month` form field.
    pub fn parse(raw: Option<&str>, max_months: u32) -> Result<Self, InputError> {
        let months = parse_integer("future_month", raw)?;
        Self::new(months, max_months)
    }

    pub fn months(&self) -> u32 {
        self.0
    }

    pub fn steps(&self) -> usize {
        self.0 as usize
    }
}

/// Point forecast for a single future month and what it would cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub horizon_months: u32,
    /// Model point estimate for month `horizon_months` (kWh)
    pub predicted_consumption_kwh: f64,
    pub predicted_bill_eur: f64,
}
