use crate::utils::error::WarmPoolError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// API health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub uptime_seconds: u64,
}

/// Prompt execution request
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub prompt: String,
    #[serde(default)]
    pub agent: Option<String>,
}

/// Prompt execution result
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub result: String,
    pub session_id: String,
    pub duration_ms: u64,
}

/// Query parameters for the pool event feed
#[derive(Debug, Default, Deserialize)]
pub struct EventQueryParams {
    #[serde(default)]
    pub minutes: Option<u32>,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BadRequest", message, 400)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("InternalError", message, 500)
    }

    pub fn service_unavailable(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(error, message, 503)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<&WarmPoolError> for ErrorResponse {
    fn from(err: &WarmPoolError) -> Self {
        match err {
            WarmPoolError::PoolExhausted { .. } => {
                Self::service_unavailable("PoolExhausted", err.to_string())
            }
            WarmPoolError::PoolNotRunning => {
                Self::service_unavailable("PoolNotRunning", err.to_string())
            }
            WarmPoolError::Factory(_) => Self::new("SessionFactory", err.to_string(), 502),
            _ => Self::internal_error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pool_errors_map_to_service_unavailable() {
        let exhausted = WarmPoolError::PoolExhausted {
            timeout: Duration::from_millis(10),
        };
        let response = ErrorResponse::from(&exhausted);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.error, "PoolExhausted");

        let stopped = ErrorResponse::from(&WarmPoolError::PoolNotRunning);
        assert_eq!(stopped.status_code, 503);
    }

    #[test]
    fn config_errors_are_internal() {
        let response = ErrorResponse::from(&WarmPoolError::Config("bad".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
