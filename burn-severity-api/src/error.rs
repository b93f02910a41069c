//! Erreurs de l'API HTTP

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use burn_severity::BurnSeverityError;
use thiserror::Error;

use crate::store::StoreError;

/// Erreur retournée par un handler, convertie en problem details
#[derive(Debug, Error)]
pub enum ApiError {
    /// Contenu de la FeatureCollection refusé
    #[error(transparent)]
    Validation(#[from] BurnSeverityError),

    /// Corps absent, non JSON ou de forme inattendue
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Invalid query string: {0}")]
    Query(#[from] QueryRejection),

    #[error("Invalid path parameter: {0}")]
    Path(#[from] PathRejection),

    /// Paramètres de pagination hors bornes
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mesure impossible sur une géométrie stockée
    #[error("Measurement failed: {0}")]
    Measure(BurnSeverityError),
}
