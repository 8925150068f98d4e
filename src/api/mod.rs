pub mod error;
pub mod health;
pub mod pages;
pub mod response;
pub mod v1;

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.cfg.server.request_timeout_secs);

    Router::new()
        .route("/", get(pages::index))
        .route("/predict_power", post(pages::predict_power))
        .route("/future", post(pages::future))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .with_state(state.clone())
        .nest("/api/v1", v1::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(TraceLayer::new_for_http())
}
