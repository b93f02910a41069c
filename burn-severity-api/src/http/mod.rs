//! Surface HTTP (axum)

pub mod handlers;
pub mod health;
pub mod problem;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::service::BurnSeverityService;

pub use handlers::GEOJSON_CONTENT_TYPE;
pub use problem::ProblemDetails;

/// État partagé des handlers
#[derive(Clone)]
pub struct AppState {
    pub service: BurnSeverityService,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(service: BurnSeverityService, config: ServiceConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}

/// Construit le routeur de l'API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/burn-severity",
            post(handlers::create_burn_severity).get(handlers::list_burn_severity),
        )
        .route(
            "/burn-severity/",
            post(handlers::create_burn_severity).get(handlers::list_burn_severity),
        )
        .route("/burn-severity/id/{record_id}", get(handlers::get_by_id))
        .route("/burn-severity/{fire_number}", get(handlers::get_by_fire_number))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
