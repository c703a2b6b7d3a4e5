//! Error mapping for REST handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::FolioError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

const INTERNAL_MESSAGE: &str = "An internal error occurred.";

/// REST API specific error type
#[derive(Error, Debug)]
pub enum RestError {
    #[error(transparent)]
    Folio(#[from] FolioError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::Folio(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RestError::Folio(e) => e.error_code(),
            RestError::NotFound(_) => "NOT_FOUND",
            RestError::BadRequest(_) => "BAD_REQUEST",
            RestError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side details stay in the log
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": message,
                "status": status.as_u16()
            }
        });
        (status, Json(body)).into_response()
    }
}
