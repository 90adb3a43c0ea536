//! Structured error responses.
//!
//! Every error that reaches an HTTP client carries a grepable code, a human
//! message, and whether retrying the same request may succeed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Grepable error code and retryable flag for structured error bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ErrorBody {
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

/// Build a JSON error response with `status`.
pub fn error_response(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Response {
    (status, Json(ErrorBody::from_error(err))).into_response()
}
