//! Health check HTTP handlers

use axum::{Json, response::IntoResponse};

use crate::web::responses::HealthResponse;

/// The service keeps no connections of its own, so being able to answer is healthy
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

pub async fn liveness_check() -> impl IntoResponse {
    Json(HealthResponse::alive())
}
