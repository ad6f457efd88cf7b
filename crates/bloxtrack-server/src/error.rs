use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use bloxtrack_core::error::LookupError;

/// Single translation boundary between internal errors and HTTP responses.
/// Every body is `{"error": <short category message>}`; upstream status codes
/// and internal detail stay in the logs.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    TooManyRequests,
    UpstreamUnavailable(String),
    Timeout,
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m)
            | Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Conflict(m)
            | Self::UpstreamUnavailable(m)
            | Self::Internal(m) => write!(f, "{m}"),
            Self::TooManyRequests => write!(f, "Too many requests"),
            Self::Timeout => write!(f, "Lookup timed out"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::InvalidInput(m) => Self::BadRequest(m),
            LookupError::NotFound(m) => Self::NotFound(m),
            LookupError::UpstreamUnavailable(m) => Self::UpstreamUnavailable(m),
            LookupError::Timeout => Self::Timeout,
        }
    }
}
