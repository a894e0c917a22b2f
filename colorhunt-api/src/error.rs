//! Error types for colorhunt-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use colorhunt_common::Error as CommonError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Actor does not own the resource (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource state does not allow the change (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Image could not be fetched or decoded (422)
    #[error("Unprocessable image: {0}")]
    UnprocessableImage(String),

    /// Image fetch exceeded its wait (504)
    #[error("Image fetch timed out: {0}")]
    GatewayTimeout(String),

    /// Store contention outlasted the retry budget (503)
    #[error("Service busy: {0}")]
    Busy(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::InvalidInput(msg) => ApiError::BadRequest(msg),
            CommonError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            CommonError::Forbidden(msg) => ApiError::Forbidden(msg),
            CommonError::NotFound(msg) => ApiError::NotFound(msg),
            CommonError::Conflict(msg) => ApiError::Conflict(msg),
            CommonError::ImageDecode(msg) => ApiError::UnprocessableImage(msg),
            timeout @ CommonError::FetchTimeout(_) => ApiError::GatewayTimeout(timeout.to_string()),
            CommonError::TransactionConflict(msg) => ApiError::Busy(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::UnprocessableImage(_) => (StatusCode::UNPROCESSABLE_ENTITY, "IMAGE_DECODE_ERROR"),
            ApiError::GatewayTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "FETCH_TIMEOUT"),
            ApiError::Busy(_) => (StatusCode::SERVICE_UNAVAILABLE, "TRANSACTION_CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "Request rejected");
        }

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnprocessableImage(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::Busy(msg)
            | ApiError::Internal(msg) => msg,
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CommonError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_common_errors_map_to_status_codes() {
        assert_eq!(status_of(CommonError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CommonError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(CommonError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(CommonError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(CommonError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(CommonError::ImageDecode("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(CommonError::FetchTimeout(10)), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_of(CommonError::TransactionConflict("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(CommonError::Config("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
