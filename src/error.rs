//! Error types for url-collector
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] type and the resolver-specific [`ResolveError`]
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Errors fall into two categories that must stay distinguishable all the way to
//! the HTTP layer: caller-input errors ([`Error::InvalidRequest`], 4xx) and
//! runtime or collaborator failures (everything else, 5xx).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for url-collector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to clients in place of the real text of any 5xx error
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Main error type for url-collector
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "PORT")
        key: Option<String>,
    },

    /// The caller supplied invalid input (missing/malformed dates, bad range, ...)
    #[error("{0}")]
    InvalidRequest(String),

    /// Requested resource does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// A date-range resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The remote provider answered with a non-success status
    #[error("upstream responded with {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the provider
        status: u16,
        /// Truncated response body
        message: String,
    },

    /// The remote provider answered with a payload we could not use
    #[error("invalid payload from upstream: {0}")]
    InvalidPayload(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Work was abandoned because its cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Failure of a single date-range resolution
///
/// When several days fail, only the first failure *observed* by the resolver is
/// reported; which one that is depends on completion order.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The unit of work for one day failed
    #[error("cannot get result for day {date}: {source}")]
    Unit {
        /// The day whose unit of work failed
        date: NaiveDate,
        /// The underlying cause, as returned by the unit function
        #[source]
        source: Box<Error>,
    },

    /// The resolution was cancelled by its caller before completing
    #[error("resolution cancelled")]
    Cancelled,

    /// A worker task died without reporting a result (panic)
    #[error("worker for day {date} failed: {reason}")]
    TaskFailed {
        /// The day the worker was responsible for
        date: NaiveDate,
        /// Panic or join error description
        reason: String,
    },
}

impl ResolveError {
    /// The day the failure is attributed to, if any
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ResolveError::Unit { date, .. } | ResolveError::TaskFailed { date, .. } => {
                Some(*date)
            }
            ResolveError::Cancelled => None,
        }
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "bad_request",
///     "message": "missing query parameter 'from'"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "bad_request", "upstream_error")
    pub code: String,

    /// Human-readable error message
    ///
    /// For server-side failures this is always a generic message.
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::InvalidRequest(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            Error::Resolve(e) => e.status_code(),

            // 502 Bad Gateway - The provider misbehaved
            Error::Upstream { .. } => 502,
            Error::InvalidPayload(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable - Shutdown or caller went away
            Error::Cancelled => 503,

            // 500 Internal Server Error - Server-side issues
            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidRequest(_) => "bad_request",
            Error::NotFound(_) => "not_found",
            Error::Resolve(e) => e.error_code(),
            Error::Upstream { .. } => "upstream_error",
            Error::InvalidPayload(_) => "invalid_payload",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Cancelled => "cancelled",
            Error::Other(_) => "internal_error",
        }
    }
}

// A unit failure is always server-side, whatever its cause says; caller input
// is validated before any unit runs.
impl ToHttpStatus for ResolveError {
    fn status_code(&self) -> u16 {
        match self {
            ResolveError::Unit { source, .. } => match source.as_ref() {
                Error::Upstream { .. } | Error::InvalidPayload(_) | Error::Network(_) => 502,
                Error::Cancelled => 503,
                _ => 500,
            },
            ResolveError::Cancelled => 503,
            ResolveError::TaskFailed { .. } => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            ResolveError::Unit { source, .. } => match source.as_ref() {
                Error::Upstream { .. }
                | Error::InvalidPayload(_)
                | Error::Network(_)
                | Error::Cancelled => source.error_code(),
                _ => "internal_error",
            },
            ResolveError::Cancelled => "cancelled",
            ResolveError::TaskFailed { .. } => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = error.status_code();
        let code = error.error_code().to_string();

        // Server-side failures never expose their text to clients
        let message = if status >= 500 {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            error.to_string()
        };

        let details = match &error {
            Error::Resolve(e) => e.date().map(|date| {
                serde_json::json!({
                    "date": date.format(crate::types::DATE_FORMAT).to_string(),
                })
            }),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
