//! Modèle de données : enregistrement de sévérité, attributs, géométrie

use std::fmt;
use std::str::FromStr;

use geo::{Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};

use crate::{BurnSeverityError, Result};

/// Identifiant attribué par le store (clé primaire)
pub type RecordId = i64;

/// Longueur maximale d'un FIRE_NUMBER (colonne VARCHAR(50))
pub const FIRE_NUMBER_MAX_LEN: usize = 50;

/// Classe de sévérité du feu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurnSeverityRating {
    Unburned,
    Low,
    Medium,
    High,
}

impl BurnSeverityRating {
    /// Toutes les valeurs acceptées, dans l'ordre de sévérité
    pub const ALL: [Self; 4] = [Self::Unburned, Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unburned => "Unburned",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for BurnSeverityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BurnSeverityRating {
    type Err = BurnSeverityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|rating| rating.as_str() == s)
            .ok_or_else(|| BurnSeverityError::UnknownRating(s.to_string()))
    }
}

/// Attributs descriptifs d'un enregistrement (propriétés GeoJSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BurnSeverityAttributes {
    /// Identifiant métier du feu (indexé, unicité non garantie)
    pub fire_number: String,
    pub fire_year: i32,
    pub pre_fire_image: String,
    pub pre_fire_image_date: String,
    pub post_fire_image: String,
    pub post_fire_image_date: String,
    #[serde(default)]
    pub comments: Option<String>,
    pub fire_status: String,
    pub burn_severity_rating: BurnSeverityRating,
    /// Surface en hectares telle que fournie par le client
    pub area_ha: f64,
}

impl BurnSeverityAttributes {
    /// Vérifie les contraintes que serde ne peut pas exprimer
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.fire_number.trim().is_empty() {
            return Err("FIRE_NUMBER must not be empty".into());
        }
        if self.fire_number.chars().count() > FIRE_NUMBER_MAX_LEN {
            return Err(format!(
                "FIRE_NUMBER must be at most {} characters",
                FIRE_NUMBER_MAX_LEN
            ));
        }
        if !self.area_ha.is_finite() {
            return Err("AREA_HA must be a finite number".into());
        }
        Ok(())
    }
}

/// Géométrie en mémoire : Polygon ou MultiPolygon avec son SRID
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryValue {
    geometry: Geometry<f64>,
    srid: u32,
}

impl GeometryValue {
    /// Construit une valeur, en refusant tout autre type que Polygon/MultiPolygon
    pub fn new(geometry: Geometry<f64>, srid: u32) -> Result<Self> {
        match geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Ok(Self { geometry, srid }),
            other => Err(BurnSeverityError::invalid_geometry(format!(
                "expected Polygon or MultiPolygon, got {}",
                geometry_type_name(&other)
            ))),
        }
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn srid(&self) -> u32 {
        self.srid
    }

    /// Promotion en MultiPolygon (type de la colonne PostGIS)
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        match &self.geometry {
            Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
            Geometry::MultiPolygon(mp) => mp.clone(),
            // Exclu par le constructeur
            _ => MultiPolygon::new(Vec::new()),
        }
    }
}

/// Nom GeoJSON d'une géométrie geo
#[allow(unreachable_patterns)]
pub(crate) fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        _ => "Geometry",
    }
}

/// Enregistrement validé, prêt à être inséré
#[derive(Debug, Clone, PartialEq)]
pub struct NewBurnSeverity {
    pub attributes: BurnSeverityAttributes,
    pub geometry: GeometryValue,
}

/// Enregistrement persisté
#[derive(Debug, Clone, PartialEq)]
pub struct BurnSeverityRecord {
    pub id: RecordId,
    pub attributes: BurnSeverityAttributes,
    pub geometry: GeometryValue,
}

/// Mesures recalculées à chaque lecture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurements {
    /// Surface (FEATURE_AREA_SQM)
    pub area: f64,
    /// Périmètre (FEATURE_LENGTH_M)
    pub length: f64,
}
