use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Appliance advice picked from whichever sub-metered circuit dominates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Recommendation {
    /// Sub-metering 1 dominates
    Kitchen,
    /// Sub-metering 2 dominates
    Laundry,
    /// Sub-metering 3 dominates
    HeatingCooling,
    /// No single circuit strictly dominates
    Balanced,
}

impl Recommendation {
    /// Pick the circuit that is strictly greater than both others.
    ///
    /// Any tie for the maximum, including all three equal, is `Balanced`.
    pub fn from_sub_metering(kitchen: f64, laundry: f64, heating_cooling: f64) -> Self {
        if kitchen > laundry && kitchen > heating_cooling {
            Self::Kitchen
        } else if laundry > kitchen && laundry > heating_cooling {
            Self::Laundry
        } else if heating_cooling > kitchen && heating_cooling > laundry {
            Self::HeatingCooling
        } else {
            Self::Balanced
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Kitchen => "High kitchen appliance usage — reduce microwave/oven time.",
            Self::Laundry => {
                "Washing machine / dishwasher consuming more — try full loads only."
            }
            Self::HeatingCooling => "Heating/AC usage is high — optimize thermostat settings.",
            Self::Balanced => "Energy usage is balanced — maintain efficient habits.",
        }
    }
}
