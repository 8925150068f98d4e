use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{error::ApiError, response::ApiResponse};
use crate::{
    domain::{DerivedUsage, ForecastResult, Horizon, InputError, MeterReading},
    forecast::PowerEstimation,
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/power", post(estimate_power))
        .route("/forecast", get(get_forecast))
        .with_state(state)
}

/// JSON body for `POST /api/v1/power`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PowerRequest {
    #[validate(range(min = 0.0))]
    pub global_reactive_power: f64,
    #[validate(range(min = 0.0))]
    pub voltage: f64,
    #[validate(range(min = 0.0))]
    pub global_intensity: f64,
    #[validate(range(min = 0.0))]
    pub sub_metering_1: f64,
    #[validate(range(min = 0.0))]
    pub sub_metering_2: f64,
    #[validate(range(min = 0.0))]
    pub sub_metering_3: f64,
    #[validate(range(min = 0, max = 23))]
    pub hour: i64,
    #[validate(range(min = 1, max = 31))]
    pub day: i64,
    #[validate(range(min = 1, max = 12))]
    pub month: i64,
    /// Monday = 0
    #[validate(range(min = 0, max = 6))]
    pub weekday: i64,
}

impl From<PowerRequest> for MeterReading {
    fn from(req: PowerRequest) -> Self {
        Self {
            global_reactive_power: req.global_reactive_power,
            voltage: req.voltage,
            global_intensity: req.global_intensity,
            sub_metering_1: req.sub_metering_1,
            sub_metering_2: req.sub_metering_2,
            sub_metering_3: req.sub_metering_3,
            hour: req.hour,
            day: req.day,
            month: req.month,
            weekday: req.weekday,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PowerResponse {
    pub power_kw: f64,
    #[serde(flatten)]
    pub usage: DerivedUsage,
    pub recommendation: String,
    pub recommendation_message: &'static str,
}

impl From<PowerEstimation> for PowerResponse {
    fn from(estimation: PowerEstimation) -> Self {
        Self {
            power_kw: estimation.power_kw,
            usage: estimation.usage,
            recommendation: estimation.recommendation.to_string(),
            recommendation_message: estimation.recommendation.message(),
        }
    }
}

/// POST /api/v1/power
pub async fn estimate_power(
    State(state): State<AppState>,
    payload: Result<Json<PowerRequest>, JsonRejection>,
) -> Result<ApiResponse<PowerResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    request.validate()?;

    let estimation = state.power.estimate(&request.into())?;
    Ok(ApiResponse::success(PowerResponse::from(estimation)).with_duration(started.elapsed()))
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub months: Option<i64>,
}

/// GET /api/v1/forecast?months=N
pub async fn get_forecast(
    State(state): State<AppState>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<ApiResponse<ForecastResult>, ApiError> {
    let started = Instant::now();
    let Query(query) = query?;
    let months = query.months.ok_or(InputError::Missing { field: "months" })?;
    let horizon = Horizon::new(months, state.cfg.models.max_horizon_months)?;

    let forecast = state.consumption.forecast(horizon)?;
    Ok(ApiResponse::success(forecast).with_duration(started.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PowerRequest {
        PowerRequest {
            global_reactive_power: 0.1,
            voltage: 240.0,
            global_intensity: 6.2,
            sub_metering_1: 5.0,
            sub_metering_2: 2.0,
            sub_metering_3: 1.0,
            hour: 18,
            day: 16,
            month: 12,
            weekday: 5,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_calendar_ranges_are_enforced() {
        let mut req = request();
        req.hour = 24;
        assert!(req.validate().is_err());

        let mut req = request();
        req.weekday = 7;
        assert!(req.validate().is_err());

        let mut req = request();
        req.month = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_negative_voltage_is_rejected() {
        let mut req = request();
        req.voltage = -1.0;
        let err = ApiError::from(req.validate().unwrap_err());
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_request_converts_in_feature_order() {
        let reading: MeterReading = request().into();
        assert_eq!(
            reading.features(),
            [0.1, 240.0, 6.2, 5.0, 2.0, 1.0, 18.0, 16.0, 12.0, 5.0]
        );
    }
}
