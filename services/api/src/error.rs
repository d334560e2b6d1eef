//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is reported to HTTP clients.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ear_trainer_core::{PortError, ValidationError};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

/// The body sent for every rejected write, whatever the underlying reason.
pub const INVALID_FORMAT: &str = "Invalid request format";

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the storage port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A payload that parsed as JSON but failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A request body that could not be read as JSON at all.
    #[error("Unreadable request body: {0}")]
    InvalidBody(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(e) => {
                warn!(problems = %e, "Rejected payload");
                (StatusCode::BAD_REQUEST, INVALID_FORMAT)
            }
            ApiError::InvalidBody(detail) => {
                warn!(%detail, "Rejected unreadable body");
                (StatusCode::BAD_REQUEST, INVALID_FORMAT)
            }
            ApiError::Port(PortError::InvalidReference(detail)) => {
                warn!(%detail, "Rejected payload with dangling reference");
                (StatusCode::BAD_REQUEST, INVALID_FORMAT)
            }
            ApiError::Port(PortError::NotFound(_)) => (StatusCode::NOT_FOUND, "Round not found"),
            _ => {
                error!("Request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = ErrorResponse {
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
