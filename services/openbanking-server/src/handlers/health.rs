//! Health Check Handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Service profile in effect
    pub profile: String,
    pub timestamp: i64,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    /// `postgres`, or `memory` when no database is configured
    pub store: String,
    pub store_healthy: bool,
}

/// Returns 200 while the process is up; no dependency checks
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        profile: state.service.profile().to_string(),
        timestamp: Utc::now().timestamp_millis(),
    })
}

/// Returns 503 when the credential store is unreachable
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let (store, healthy) = match &state.db {
        Some(db) => ("postgres", db.health_check().await),
        None => ("memory", true),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if healthy { "ready" } else { "not_ready" }.to_string(),
            store: store.to_string(),
            store_healthy: healthy,
        }),
    )
}
