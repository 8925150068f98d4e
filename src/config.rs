use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::Tariff;
use crate::ml::{arima::ArimaOrder, training::TrainingConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub billing: BillingConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Trained power regression artifact (JSON)
    pub regression_path: PathBuf,
    /// Historical household power CSV used to fit the forecaster
    pub dataset_path: PathBuf,
    pub csv_delimiter: char,
    pub arima_order: ArimaOrder,
    pub max_horizon_months: u32,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            regression_path: PathBuf::from("models/power_model.json"),
            dataset_path: PathBuf::from("data/household_power_consumption.csv"),
            csv_delimiter: ',',
            arima_order: ArimaOrder::default(),
            max_horizon_months: 600,
        }
    }
}

impl ModelsConfig {
    pub fn delimiter(&self) -> Result<u8> {
        u8::try_from(self.csv_delimiter)
            .map_err(|_| anyhow::anyhow!("CSV delimiter {:?} is not ASCII", self.csv_delimiter))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub unit_price_eur_per_kwh: f64,
    pub usage_factor: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let tariff = Tariff::default();
        Self {
            unit_price_eur_per_kwh: tariff.unit_price_eur_per_kwh,
            usage_factor: tariff.usage_factor,
        }
    }
}

impl BillingConfig {
    pub fn tariff(&self) -> Tariff {
        Tariff {
            unit_price_eur_per_kwh: self.unit_price_eur_per_kwh,
            usage_factor: self.usage_factor,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("HPP__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        let price = cfg.billing.unit_price_eur_per_kwh;
        if !price.is_finite() || price < 0.0 {
            anyhow::bail!("billing.unit_price_eur_per_kwh must be a non-negative number");
        }
        let factor = cfg.billing.usage_factor;
        if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
            anyhow::bail!("billing.usage_factor must be between 0 and 1");
        }
        if cfg.models.max_horizon_months == 0 {
            anyhow::bail!("models.max_horizon_months must be at least 1");
        }
        cfg.models.delimiter()?;
        Ok(cfg)
    }
}
