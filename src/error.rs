//! Error Types
//!
//! One error enum for the whole service. Every failure that reaches a
//! handler is converted into an `ApiError`, which maps onto an HTTP status
//! and a JSON body with a human-readable message.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing row, missing CSV mirror file, missing artifact, or a
    /// reference-lookup miss.
    #[error("{0}")]
    NotFound(String),

    /// Identity/uniqueness violation on insert.
    #[error("{0}")]
    Conflict(String),

    /// Invalid upload type or missing required fields.
    #[error("{0}")]
    Validation(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("reference lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        ApiError::Validation(format!("invalid multipart payload: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) | ApiError::Store(_) | ApiError::Csv(_) | ApiError::Lookup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Same envelope as ApiResponse in api.rs, error side populated.
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "data": null,
            "error": self.to_string(),
        }))
    }
}
