//! Calcul des mesures (surface, périmètre) d'une géométrie
//!
//! Les mesures sont recalculées à chaque lecture, jamais stockées.

use std::fmt;
use std::str::FromStr;

use geo::{
    Area, EuclideanLength, GeodesicArea, GeodesicLength, Geometry, LineString, MultiPolygon,
};
use serde::{Deserialize, Serialize};

use crate::crs::{BC_ALBERS_SRID, STORAGE_SRID};
use crate::reproject::SmartReprojector;
use crate::types::{GeometryValue, Measurements};
use crate::{BurnSeverityError, Result};

/// Mode de calcul des mesures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureMode {
    /// Planaire, dans les unités du CRS de stockage (degrés pour 4326)
    #[default]
    Native,
    /// Mètres sur l'ellipsoïde WGS84
    Geodesic,
    /// Mètres planaires en BC Albers (EPSG:3005)
    BcAlbers,
}

impl MeasureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Geodesic => "geodesic",
            Self::BcAlbers => "bc_albers",
        }
    }
}

impl fmt::Display for MeasureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasureMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" | "planar" => Ok(Self::Native),
            "geodesic" => Ok(Self::Geodesic),
            "bc_albers" | "bcalbers" | "albers" | "3005" => Ok(Self::BcAlbers),
            _ => Err(format!(
                "Invalid measure mode: {} (expected native, geodesic or bc_albers)",
                s
            )),
        }
    }
}

/// Surface de la géométrie (toujours >= 0)
pub fn area(value: &GeometryValue, mode: MeasureMode) -> Result<f64> {
    let polygons = polygons_for(value, mode)?;
    finite("area", surface(&polygons, mode))
}

/// Périmètre de la géométrie : anneaux extérieurs et intérieurs
pub fn length(value: &GeometryValue, mode: MeasureMode) -> Result<f64> {
    let polygons = polygons_for(value, mode)?;
    finite("length", perimeter(&polygons, mode))
}

/// Surface et périmètre en une seule passe de reprojection
pub fn measure(value: &GeometryValue, mode: MeasureMode) -> Result<Measurements> {
    let polygons = polygons_for(value, mode)?;
    Ok(Measurements {
        area: finite("area", surface(&polygons, mode))?,
        length: finite("length", perimeter(&polygons, mode))?,
    })
}

/// Une mesure NaN ou infinie serait sérialisée en `null`
fn finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BurnSeverityError::invalid_geometry(format!(
            "{} is not a finite number",
            what
        )))
    }
}

fn surface(polygons: &MultiPolygon<f64>, mode: MeasureMode) -> f64 {
    match mode {
        MeasureMode::Native | MeasureMode::BcAlbers => polygons.unsigned_area(),
        MeasureMode::Geodesic => polygons.geodesic_area_unsigned(),
    }
}

fn perimeter(polygons: &MultiPolygon<f64>, mode: MeasureMode) -> f64 {
    polygons
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .map(|ring: &LineString<f64>| match mode {
            MeasureMode::Native | MeasureMode::BcAlbers => ring.euclidean_length(),
            MeasureMode::Geodesic => ring.geodesic_length(),
        })
        .sum()
}

/// Géométrie exprimée dans le CRS attendu par le mode
fn polygons_for(value: &GeometryValue, mode: MeasureMode) -> Result<MultiPolygon<f64>> {
    let target = match mode {
        MeasureMode::Native => return Ok(value.to_multi_polygon()),
        MeasureMode::Geodesic => STORAGE_SRID,
        MeasureMode::BcAlbers => BC_ALBERS_SRID,
    };

    let reprojector = SmartReprojector::new(value.srid(), target)?;
    let projected = reprojector.transform_geometry(&Geometry::MultiPolygon(
        value.to_multi_polygon(),
    ))?;
    match projected {
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        _ => Err(BurnSeverityError::Reprojection(
            "reprojection changed the geometry type".into(),
        )),
    }
}
