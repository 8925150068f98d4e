use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Horizon;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
    started_at: DateTime<Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    power_model: ComponentHealth,
    consumption_forecaster: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_us: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(detail: String, latency_us: Option<u64>) -> Self {
        Self {
            status: "healthy".to_string(),
            detail: Some(detail),
            latency_us,
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            detail: None,
            latency_us: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// GET /health - Health check endpoint
///
/// Reports which models are loaded and probes the forecaster with a one-month forecast
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let power_model = check_power_model(&state);
    let consumption_forecaster = check_forecaster(&state);

    let all_healthy = power_model.is_healthy() && consumption_forecaster.is_healthy();

    let response = HealthResponse {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: Utc::now(),
        started_at: state.started_at,
        checks: HealthChecks {
            power_model,
            consumption_forecaster,
        },
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(healthy = all_healthy, "Health check completed");
    (status_code, Json(response))
}

fn check_power_model(state: &AppState) -> ComponentHealth {
    let metadata = state.power.model_metadata();
    ComponentHealth::healthy(
        format!(
            "{} ({:?}, {} samples, r2 {:.3})",
            metadata.model_id,
            metadata.model_type,
            metadata.training_samples,
            metadata.validation_metrics.r2
        ),
        None,
    )
}

fn check_forecaster(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    let probe = Horizon::new(1, state.cfg.models.max_horizon_months)
        .map_err(|e| e.to_string())
        .and_then(|horizon| state.consumption.forecast(horizon).map_err(|e| e.to_string()));

    match probe {
        Ok(_) => ComponentHealth::healthy(
            state.consumption.describe_model(),
            Some(start.elapsed().as_micros() as u64),
        ),
        Err(e) => ComponentHealth::unhealthy(e),
    }
}

/// GET /health/ready - Readiness probe for Kubernetes
///
/// Models are loaded before the listener binds, so a running process is ready
pub async fn readiness_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /health/live - Liveness probe for Kubernetes
///
/// Returns 200 if the application is running
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
