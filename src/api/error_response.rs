//! HTTP error response handling for the API
//!
//! This module provides conversions from domain errors to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // The client only gets a generic message for these, so keep the real one here
        if status_code.is_server_error() {
            tracing::error!(
                status = status_code.as_u16(),
                code = self.error_code(),
                error = %self,
                "Request failed"
            );
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}
