//! Sondes de santé (`/health/live`, `/health/ready`)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AppState;

/// Corps des réponses de santé
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl HealthStatus {
    fn new(status: &str, database: Option<&str>) -> Self {
        Self {
            status: status.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.map(str::to_string),
        }
    }
}

/// Le processus répond
pub async fn health_live() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::new("ok", None)))
}

/// La base est joignable
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.store().health().await {
        Ok(()) => (StatusCode::OK, Json(HealthStatus::new("ok", Some("reachable")))),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus::new("not_ready", Some("unreachable"))),
            )
        }
    }
}
