use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data
    pub data: T,
    /// Response timestamp
    pub timestamp: DateTime<Utc>,
    /// Processing duration in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_us: Option<u64>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            duration_us: None,
        }
    }

    /// Add processing duration
    pub fn with_duration(mut self, elapsed: std::time::Duration) -> Self {
        self.duration_us = Some(elapsed.as_micros().min(u64::MAX as u128) as u64);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_success_response() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, "test data");
        assert!(response.duration_us.is_none());
    }

    #[test]
    fn test_with_duration() {
        let response = ApiResponse::success(1).with_duration(Duration::from_millis(3));
        assert_eq!(response.duration_us, Some(3000));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["duration_us"], 3000);
        assert_eq!(json["data"], 1);
    }
}
