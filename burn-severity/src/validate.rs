//! Validation d'une FeatureCollection entrante
//!
//! La désérialisation est volontairement permissive (géométrie et propriétés
//! optionnelles) pour que chaque défaut soit rapporté avec l'index de la
//! feature fautive plutôt que comme une erreur JSON générique.

use geo::{CoordsIter, Geometry};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::codec::decode_wire;
use crate::crs::{Crs, STORAGE_SRID};
use crate::reproject::SmartReprojector;
use crate::types::{BurnSeverityAttributes, GeometryValue, NewBurnSeverity};
use crate::{BurnSeverityError, Result};

/// Corps de requête tel que reçu
#[derive(Debug, Clone, Deserialize)]
pub struct InboundCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub crs: Option<Value>,
    #[serde(default)]
    pub features: Vec<InboundFeature>,
}

/// Feature telle que reçue
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundFeature {
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl From<&geojson::FeatureCollection> for InboundCollection {
    fn from(fc: &geojson::FeatureCollection) -> Self {
        let crs = fc
            .foreign_members
            .as_ref()
            .and_then(|members| members.get("crs"))
            .cloned();

        let features = fc
            .features
            .iter()
            .map(|f| InboundFeature {
                geometry: f
                    .geometry
                    .as_ref()
                    .and_then(|g| serde_json::to_value(g).ok()),
                properties: f.properties.clone(),
            })
            .collect();

        Self {
            kind: "FeatureCollection".to_string(),
            crs,
            features,
        }
    }
}

/// Résultat de la validation : features prêtes à persister, en SRID de stockage
#[derive(Debug, Clone)]
pub struct ValidatedCollection {
    /// CRS déclaré par le client
    pub crs: Crs,
    pub features: Vec<NewBurnSeverity>,
}

/// Valide une FeatureCollection entrante
///
/// Contrôles, dans l'ordre : collection non vide, CRS supporté, puis pour
/// chaque feature géométrie présente, propriétés conformes, géométrie
/// surfacique bien formée. La première erreur rencontrée est retournée.
pub fn validate(collection: &InboundCollection) -> Result<ValidatedCollection> {
    if collection.kind != "FeatureCollection" {
        return Err(BurnSeverityError::InvalidCollection(format!(
            "expected type \"FeatureCollection\", got \"{}\"",
            collection.kind
        )));
    }

    if collection.features.is_empty() {
        return Err(BurnSeverityError::EmptyCollection);
    }

    let crs = Crs::from_member(collection.crs.as_ref())?;
    let reprojector = SmartReprojector::new(crs.epsg, STORAGE_SRID)?;
    debug!(
        crs = %crs.urn(),
        reprojector = reprojector.description(),
        features = collection.features.len(),
        "Validating FeatureCollection"
    );

    let features = collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| validate_feature(index, feature, crs, &reprojector))
        .collect::<Result<Vec<_>>>()?;

    Ok(ValidatedCollection { crs, features })
}

fn validate_feature(
    index: usize,
    feature: &InboundFeature,
    crs: Crs,
    reprojector: &SmartReprojector,
) -> Result<NewBurnSeverity> {
    let geometry = feature
        .geometry
        .as_ref()
        .filter(|g| !g.is_null())
        .ok_or(BurnSeverityError::MissingGeometry { index })?;

    let attributes = parse_properties(index, feature.properties.as_ref())?;

    let wire = geojson::Geometry::from_json_value(geometry.clone()).map_err(|e| {
        BurnSeverityError::invalid_geometry(format!("feature {}: {}", index, e))
    })?;
    let decoded = decode_wire(&wire, crs.epsg)?;

    let projected = reprojector.transform_geometry(decoded.geometry())?;
    check_wgs84_range(index, &projected)?;
    let geometry = GeometryValue::new(projected, STORAGE_SRID)?;

    Ok(NewBurnSeverity {
        attributes,
        geometry,
    })
}

/// Longitude dans [-180, 180], latitude dans [-90, 90]
fn check_wgs84_range(index: usize, geometry: &Geometry<f64>) -> Result<()> {
    match geometry
        .coords_iter()
        .find(|c| !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y))
    {
        Some(c) => Err(BurnSeverityError::invalid_geometry(format!(
            "feature {}: coordinate ({}, {}) is outside the WGS84 range",
            index, c.x, c.y
        ))),
        None => Ok(()),
    }
}

fn parse_properties(
    index: usize,
    properties: Option<&Map<String, Value>>,
) -> Result<BurnSeverityAttributes> {
    let properties = properties
        .ok_or_else(|| BurnSeverityError::invalid_properties(index, "properties are missing"))?;

    let attributes: BurnSeverityAttributes =
        serde_json::from_value(Value::Object(properties.clone()))
            .map_err(|e| BurnSeverityError::invalid_properties(index, e.to_string()))?;

    attributes
        .check()
        .map_err(|reason| BurnSeverityError::invalid_properties(index, reason))?;

    Ok(attributes)
}
