//! Assemblage des réponses GeoJSON

use geojson::{feature::Id, Feature, FeatureCollection, JsonObject};
use serde_json::Value;

use crate::codec::encode_wire;
use crate::crs::Crs;
use crate::types::{BurnSeverityRecord, Measurements};

/// Propriété ajoutée : surface calculée
pub const FEATURE_AREA_SQM: &str = "FEATURE_AREA_SQM";
/// Propriété ajoutée : périmètre calculé
pub const FEATURE_LENGTH_M: &str = "FEATURE_LENGTH_M";

/// FeatureCollection contenant un seul enregistrement
pub fn one(record: &BurnSeverityRecord, measurements: &Measurements, crs: &Crs) -> FeatureCollection {
    collection(vec![feature(record, measurements)], crs)
}

/// FeatureCollection contenant tous les enregistrements, dans l'ordre reçu
pub fn many(records: &[(BurnSeverityRecord, Measurements)], crs: &Crs) -> FeatureCollection {
    let features = records
        .iter()
        .map(|(record, measurements)| feature(record, measurements))
        .collect();
    collection(features, crs)
}

fn collection(features: Vec<Feature>, crs: &Crs) -> FeatureCollection {
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("crs".to_string(), crs.to_member());

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}

fn feature(record: &BurnSeverityRecord, measurements: &Measurements) -> Feature {
    let mut properties = match serde_json::to_value(&record.attributes) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::new(),
    };
    properties.insert(FEATURE_AREA_SQM.to_string(), measurements.area.into());
    properties.insert(FEATURE_LENGTH_M.to_string(), measurements.length.into());

    Feature {
        bbox: None,
        geometry: Some(encode_wire(&record.geometry)),
        id: Some(Id::Number(record.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}
