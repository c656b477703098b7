//! HTTP response types and utilities
//!
//! Errors leave the service as a status code with a plain-text body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::errors::AppError;

/// Status code for each error kind
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::MalformedIdentifier { .. }
        | AppError::MissingParameter { .. }
        | AppError::Unauthenticated { .. }
        | AppError::UnsupportedType { .. } => StatusCode::BAD_REQUEST,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::BridgeUnavailable { .. }
        | AppError::Backend { .. }
        | AppError::Configuration { .. }
        | AppError::Internal { .. }
        | AppError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log and convert an error into its HTTP response
pub fn handle_error(error: AppError) -> Response {
    let status = status_for(&error);
    let message = error.to_string();

    if status.is_server_error() {
        error!(status = status.as_u16(), "Request failed: {}", message);
    } else {
        warn!(status = status.as_u16(), "Request rejected: {}", message);
    }

    (status, message).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        handle_error(self)
    }
}

/// Body of the health endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self::with_status("healthy")
    }

    pub fn alive() -> Self {
        Self::with_status("alive")
    }

    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}
