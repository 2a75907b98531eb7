//! # Error Handling Middleware
//!
//! Maps [`SchedError`] to HTTP status codes and `{"error": message}` JSON
//! bodies. Store and process failures are logged in full and reported to the
//! caller with a generic message only.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use schedlite_core::errors::SchedError;
use serde_json::json;
use tracing::error;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on anything returning
/// `SchedResult`.
#[derive(Debug)]
pub struct AppError(pub SchedError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SchedError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedError::Authentication(_) => StatusCode::UNAUTHORIZED,
            SchedError::Authorization(_) => StatusCode::FORBIDDEN,
            SchedError::Conflict(_) => StatusCode::CONFLICT,
            SchedError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SchedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.0.is_internal() {
            error!("Request failed: {:?}", self.0);
            INTERNAL_MESSAGE.to_string()
        } else {
            self.0.to_string()
        };
        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

impl From<SchedError> for AppError {
    fn from(err: SchedError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SchedError::Database(err))
    }
}

/// Malformed or missing JSON bodies are the caller's fault.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(SchedError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(SchedError::Validation(rejection.body_text()))
    }
}
