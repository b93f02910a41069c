//! # burn-severity
//!
//! Modèle et pipeline géométrique des zones de sévérité de feux de forêt.
//!
//! ## Features
//!
//! - Validation des FeatureCollection entrantes (géométrie, propriétés, CRS)
//! - Codec GeoJSON ↔ `geo` ↔ EWKB (format natif PostGIS)
//! - Mesures surface/périmètre recalculées à chaque lecture
//! - Reprojection BC Albers (EPSG:3005) en Rust pur, PROJ en option (`reproject`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn_severity::{codec, validate, MeasureMode};
//!
//! let inbound: validate::InboundCollection = serde_json::from_str(body)?;
//! let validated = validate::validate(&inbound)?;
//!
//! for feature in &validated.features {
//!     let native = codec::encode_native(&feature.geometry)?;
//!     // INSERT ... ST_GeomFromEWKB($1)
//! }
//! ```

pub mod assemble;
pub mod codec;
pub mod crs;
pub mod error;
pub mod measure;
pub mod reproject;
pub mod types;
pub mod validate;

pub use codec::NativeGeometry;
pub use crs::{Crs, BC_ALBERS_SRID, STORAGE_SRID};
pub use error::{BurnSeverityError, Result};
pub use measure::MeasureMode;
pub use types::{
    BurnSeverityAttributes, BurnSeverityRating, BurnSeverityRecord, GeometryValue, Measurements,
    NewBurnSeverity, RecordId, FIRE_NUMBER_MAX_LEN,
};
pub use validate::{InboundCollection, ValidatedCollection};

use geojson::FeatureCollection;

/// Mesure puis assemble des enregistrements en une FeatureCollection
///
/// Les réponses sont toujours exprimées dans le CRS de stockage.
pub fn present(records: &[BurnSeverityRecord], mode: MeasureMode) -> Result<FeatureCollection> {
    let measured = records
        .iter()
        .map(|record| Ok((record.clone(), measure::measure(&record.geometry, mode)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(assemble::many(&measured, &Crs::STORAGE))
}
