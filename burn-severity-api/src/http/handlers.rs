//! Handlers des routes `/burn-severity`

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use burn_severity::{InboundCollection, RecordId};
use geojson::FeatureCollection;
use serde::Deserialize;
use tracing::error;

use super::problem::ProblemDetails;
use super::AppState;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;

/// Type MIME des réponses GeoJSON (RFC 7946)
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

/// Réponse `application/geo+json`
pub struct GeoJson(pub FeatureCollection);

impl IntoResponse for GeoJson {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(GEOJSON_CONTENT_TYPE))],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "Failed to serialize FeatureCollection");
                ProblemDetails::internal_error().into_response()
            }
        }
    }
}

/// Paramètres de pagination de la liste
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Retourne (offset, limit) après contrôle des bornes
    pub fn resolve(&self, max_page_size: i64) -> Result<(i64, i64), ApiError> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE.min(max_page_size));

        if skip < 0 {
            return Err(ApiError::InvalidPage(format!("skip must be >= 0, got {}", skip)));
        }
        if !(1..=max_page_size).contains(&limit) {
            return Err(ApiError::InvalidPage(format!(
                "limit must be between 1 and {}, got {}",
                max_page_size, limit
            )));
        }
        Ok((skip, limit))
    }
}

/// POST /burn-severity/
pub async fn create_burn_severity(
    State(state): State<AppState>,
    payload: Result<Json<InboundCollection>, JsonRejection>,
) -> Result<(StatusCode, GeoJson), ApiError> {
    let Json(collection) = payload?;
    let created = state.service.create(&collection).await?;
    Ok((StatusCode::CREATED, GeoJson(created)))
}

/// GET /burn-severity/?skip=&limit=
pub async fn list_burn_severity(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<GeoJson, ApiError> {
    let Query(pagination) = query?;
    let (skip, limit) = pagination.resolve(state.config.max_page_size)?;
    Ok(GeoJson(state.service.list(skip, limit).await?))
}

/// GET /burn-severity/{fire_number}
pub async fn get_by_fire_number(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<GeoJson, ApiError> {
    let Path(fire_number) = path?;
    Ok(GeoJson(state.service.find_by_fire_number(&fire_number).await?))
}

/// GET /burn-severity/id/{record_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    path: Result<Path<RecordId>, PathRejection>,
) -> Result<GeoJson, ApiError> {
    let Path(id) = path?;
    Ok(GeoJson(state.service.find_by_id(id).await?))
}
