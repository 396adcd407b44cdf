//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Dependency statuses
    pub dependencies: HashMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness check
///
/// Always returns 200 OK if the service is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check; pings the database when one is configured
///
/// 503 when the configured database does not answer. Without a database the
/// in-memory store is always ready.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let mut dependencies = HashMap::new();
    let mut ready = true;

    let database = match state.db() {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => DependencyStatus {
                healthy: true,
                message: Some("Connected".to_string()),
            },
            Err(e) => {
                tracing::error!("Database health check failed: {}", e);
                ready = false;
                DependencyStatus {
                    healthy: false,
                    message: Some("Connection failed".to_string()),
                }
            }
        },
        None => DependencyStatus {
            healthy: true,
            message: Some("In-memory store".to_string()),
        },
    };
    dependencies.insert("database".to_string(), database);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            service: state.config().service.name.clone(),
            dependencies,
        }),
    )
}
