//! HTTP error response handling for the API
//!
//! Converts domain errors into HTTP responses with an appropriate status code
//! and a JSON error body.

use crate::error::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON error body returned by every failing API route
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Stable machine-readable error code
    pub code: &'static str,
    /// Human-readable error description
    pub message: String,
}

impl From<&Error> for ApiError {
    fn from(error: &Error) -> Self {
        Self {
            code: error.error_code(),
            message: error.to_string(),
        }
    }
}

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiError::from(&self);

        (status_code, Json(body)).into_response()
    }
}
