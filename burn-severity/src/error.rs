//! Types d'erreurs pour le crate burn-severity

use thiserror::Error;

/// Erreurs du pipeline validation → codec → mesure
#[derive(Debug, Error)]
pub enum BurnSeverityError {
    /// La FeatureCollection ne contient aucune feature
    #[error("FeatureCollection contains no features")]
    EmptyCollection,

    /// Le document n'est pas une FeatureCollection exploitable
    #[error("Invalid FeatureCollection: {0}")]
    InvalidCollection(String),

    /// Une feature n'a pas de géométrie
    #[error("Feature {index} has no geometry")]
    MissingGeometry { index: usize },

    /// Géométrie absente des types acceptés ou mal formée
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Propriétés manquantes ou incompatibles avec le modèle
    #[error("Invalid properties for feature {index}: {reason}")]
    InvalidProperties { index: usize, reason: String },

    /// Classe de sévérité inconnue
    #[error("Unknown burn severity rating: {0}")]
    UnknownRating(String),

    /// Système de coordonnées non reconnu ou non supporté
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// Échec de reprojection
    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    /// Encodage ou décodage WKB/EWKB impossible
    #[error("WKB error: {0}")]
    Wkb(String),
}

impl BurnSeverityError {
    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry(reason.into())
    }

    /// Crée une erreur de propriétés invalides
    pub fn invalid_properties(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidProperties {
            index,
            reason: reason.into(),
        }
    }

    /// Indique si l'erreur provient des données soumises par le client
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Wkb(_))
    }
}

/// Alias de résultat du crate
pub type Result<T> = std::result::Result<T, BurnSeverityError>;
