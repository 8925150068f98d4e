use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Hours in a day.
pub const HOURS_PER_DAY: f64 = 24.0;
/// Billing month approximated as 30 days.
pub const HOURS_PER_MONTH: f64 = 720.0;

/// Electricity pricing and the derating applied to continuous power draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Price per kWh (EUR)
    pub unit_price_eur_per_kwh: f64,
    /// Share of the day appliances actually draw the estimated power (0.0 - 1.0)
    pub usage_factor: f64,
}

impl Default for Tariff {
    /// French regulated tariff with 40% realistic usage.
    fn default() -> Self {
        Self {
            unit_price_eur_per_kwh: 0.22,
            usage_factor: 0.40,
        }
    }
}

impl Tariff {
    pub fn bill_for(&self, energy_kwh: f64) -> f64 {
        round2(energy_kwh * self.unit_price_eur_per_kwh)
    }
}

/// Round to two decimals.
///
/// Works on the exact binary value, so `5.005` (stored just below) gives
/// `5.0`; exact ties such as `812.125` go to the even digit.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Energy and billing figures derived from a point power estimate.
#[cfg_attr(test, derive(Default))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedUsage {
    pub daily_kwh: f64,
    pub monthly_kwh: f64,
    pub monthly_bill_eur: f64,
}

impl DerivedUsage {
    pub fn from_power(power_kw: f64, tariff: &Tariff) -> Self {
        let daily_kwh = round2(power_kw * HOURS_PER_DAY * tariff.usage_factor);
        let monthly_kwh = round2(power_kw * HOURS_PER_MONTH * tariff.usage_factor);
        Self {
            daily_kwh,
            monthly_kwh,
            monthly_bill_eur: tariff.bill_for(monthly_kwh),
        }
    }
}
