//! API error type and response mapping.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notifier::NotifierError;
use serde::Serialize;
use storage::StorageError;
use telemetry::TelemetryError;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("telemetry store unavailable: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("notifier is not configured")]
    NotifierUnavailable,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Telemetry(TelemetryError::NoData) => StatusCode::NOT_FOUND,
            ApiError::Telemetry(_) => StatusCode::BAD_GATEWAY,
            ApiError::Notifier(NotifierError::InvalidPhone(_)) => StatusCode::BAD_REQUEST,
            ApiError::Notifier(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotifierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::NotFound("gone".to_string()), StatusCode::NOT_FOUND),
            (ApiError::Auth(AuthError::BadPassword), StatusCode::UNAUTHORIZED),
            (
                ApiError::Telemetry(TelemetryError::NoData),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Telemetry(TelemetryError::Api {
                    status: 401,
                    body: String::new(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Notifier(NotifierError::InvalidPhone("x".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::NotifierUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
