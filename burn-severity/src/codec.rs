//! Codec de géométries : GeoJSON (wire) ↔ geo (mémoire) ↔ EWKB (PostGIS)
//!
//! L'écriture WKB passe par `wkb::geom_to_wkb` puis l'ajout du SRID (EWKB),
//! la lecture EWKB par geozero. Côté GeoJSON, la conversion vers `geo` est
//! celle du crate `geojson` (feature `geo-types`).

use std::io::Cursor;

use geo::Geometry;
use geojson::{PolygonType, Position, Value};
use geozero::wkb::{FromWkb, WkbDialect};
use wkb::geom_to_wkb;

use crate::crs::STORAGE_SRID;
use crate::{BurnSeverityError, GeometryValue, Result};

/// Flag SRID du type EWKB
const EWKB_SRID_FLAG: u32 = 0x2000_0000;

/// Géométrie au format natif du store (EWKB avec SRID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeGeometry(pub Vec<u8>);

impl NativeGeometry {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// SRID porté par l'en-tête EWKB, s'il existe
    pub fn srid(&self) -> Option<u32> {
        let bytes = &self.0;
        if bytes.len() < 9 {
            return None;
        }
        let little_endian = bytes[0] == 1;
        let read_u32 = |b: [u8; 4]| {
            if little_endian {
                u32::from_le_bytes(b)
            } else {
                u32::from_be_bytes(b)
            }
        };
        let geom_type = read_u32([bytes[1], bytes[2], bytes[3], bytes[4]]);
        if geom_type & EWKB_SRID_FLAG == 0 {
            return None;
        }
        Some(read_u32([bytes[5], bytes[6], bytes[7], bytes[8]]))
    }
}

/// Décode une géométrie GeoJSON (Polygon ou MultiPolygon) dans le SRID déclaré
///
/// Les anneaux sont contrôlés sur les positions reçues, avant conversion :
/// `geo::Polygon::new` refermerait silencieusement un anneau ouvert.
pub fn decode_wire(geometry: &geojson::Geometry, srid: u32) -> Result<GeometryValue> {
    match &geometry.value {
        Value::Polygon(rings) => check_polygon(rings)?,
        Value::MultiPolygon(polygons) => {
            if polygons.is_empty() {
                return Err(BurnSeverityError::invalid_geometry(
                    "MultiPolygon has no polygons",
                ));
            }
            for rings in polygons {
                check_polygon(rings)?;
            }
        }
        other => {
            return Err(BurnSeverityError::invalid_geometry(format!(
                "expected Polygon or MultiPolygon, got {}",
                other.type_name()
            )))
        }
    }

    let geom = Geometry::<f64>::try_from(&geometry.value)
        .map_err(|e| BurnSeverityError::invalid_geometry(e.to_string()))?;
    GeometryValue::new(geom, srid)
}

/// Encode une géométrie en objet GeoJSON (type + coordinates)
pub fn encode_wire(value: &GeometryValue) -> geojson::Geometry {
    geojson::Geometry::new(Value::from(value.geometry()))
}

/// Encode en EWKB MultiPolygon avec SRID, prêt pour `ST_GeomFromEWKB`
pub fn encode_native(value: &GeometryValue) -> Result<NativeGeometry> {
    let multi = Geometry::MultiPolygon(value.to_multi_polygon());
    let wkb = geom_to_wkb(&multi)
        .map_err(|e| BurnSeverityError::Wkb(format!("Failed to convert geometry to WKB: {:?}", e)))?;
    add_srid_to_wkb(&wkb, value.srid()).map(NativeGeometry)
}

/// Décode un EWKB lu depuis le store (`ST_AsEWKB`)
///
/// Sans SRID dans l'en-tête, le SRID de stockage est appliqué.
pub fn decode_native(native: &NativeGeometry) -> Result<GeometryValue> {
    let srid = native.srid().unwrap_or(STORAGE_SRID);
    let mut cursor = Cursor::new(native.as_bytes());
    let geometry = Geometry::<f64>::from_wkb(&mut cursor, WkbDialect::Ewkb)
        .map_err(|e| BurnSeverityError::Wkb(e.to_string()))?;
    GeometryValue::new(geometry, srid)
}

/// Ajoute le SRID au WKB pour créer du EWKB
fn add_srid_to_wkb(wkb: &[u8], srid: u32) -> Result<Vec<u8>> {
    if wkb.len() < 5 {
        return Err(BurnSeverityError::Wkb(format!(
            "WKB too short ({} bytes)",
            wkb.len()
        )));
    }

    let mut ewkb = Vec::with_capacity(wkb.len() + 4);

    // Byte order
    ewkb.push(wkb[0]);

    let type_bytes = [wkb[1], wkb[2], wkb[3], wkb[4]];
    if wkb[0] == 1 {
        let geom_type = u32::from_le_bytes(type_bytes) | EWKB_SRID_FLAG;
        ewkb.extend_from_slice(&geom_type.to_le_bytes());
        ewkb.extend_from_slice(&srid.to_le_bytes());
    } else {
        let geom_type = u32::from_be_bytes(type_bytes) | EWKB_SRID_FLAG;
        ewkb.extend_from_slice(&geom_type.to_be_bytes());
        ewkb.extend_from_slice(&srid.to_be_bytes());
    }

    ewkb.extend_from_slice(&wkb[5..]);
    Ok(ewkb)
}

fn check_polygon(rings: &PolygonType) -> Result<()> {
    if rings.is_empty() {
        return Err(BurnSeverityError::invalid_geometry("Polygon has no rings"));
    }
    rings.iter().try_for_each(|ring| check_ring(ring))
}

/// Un anneau GeoJSON : au moins 4 positions 2D finies, fermé
///
/// La colonne PostGIS est 2D : une position avec Z ou M est refusée plutôt
/// que tronquée.
fn check_ring(positions: &[Position]) -> Result<()> {
    if positions.len() < 4 {
        return Err(BurnSeverityError::invalid_geometry(format!(
            "linear ring must have at least 4 positions, got {}",
            positions.len()
        )));
    }

    for position in positions {
        match position.as_slice() {
            [x, y] if x.is_finite() && y.is_finite() => {}
            [_, _] => {
                return Err(BurnSeverityError::invalid_geometry(
                    "coordinates must be finite numbers",
                ))
            }
            [_, _, _, ..] => {
                return Err(BurnSeverityError::invalid_geometry(format!(
                    "only 2D positions are supported, got {} coordinates",
                    position.len()
                )))
            }
            _ => {
                return Err(BurnSeverityError::invalid_geometry(
                    "position must have 2 coordinates",
                ))
            }
        }
    }

    if positions.first() != positions.last() {
        return Err(BurnSeverityError::invalid_geometry(
            "linear ring is not closed",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: serde_json::Value) -> geojson::Geometry {
        geojson::Geometry::from_json_value(value).unwrap()
    }

    fn unit_square() -> geojson::Geometry {
        wire(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]]
        }))
    }

    fn assert_coords_close(a: &GeometryValue, b: &GeometryValue) {
        let ma = a.to_multi_polygon();
        let mb = b.to_multi_polygon();
        assert_eq!(ma.0.len(), mb.0.len());
        for (pa, pb) in ma.iter().zip(mb.iter()) {
            for (ca, cb) in pa.exterior().coords().zip(pb.exterior().coords()) {
                assert!((ca.x - cb.x).abs() < 1e-12 && (ca.y - cb.y).abs() < 1e-12);
            }
            assert_eq!(pa.interiors().len(), pb.interiors().len());
        }
    }

    #[test]
    fn test_decode_wire_polygon() {
        let value = decode_wire(&unit_square(), 4326).unwrap();
        assert_eq!(value.srid(), 4326);
        assert!(matches!(value.geometry(), Geometry::Polygon(p) if p.exterior().0.len() == 5));
    }

    #[test]
    fn test_decode_wire_multipolygon_with_hole() {
        let geometry = wire(json!({
            "type": "MultiPolygon",
            "coordinates": [
                [
                    [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
                    [[2.0, 2.0], [2.0, 4.0], [4.0, 4.0], [4.0, 2.0], [2.0, 2.0]]
                ],
                [[[20.0, 20.0], [21.0, 20.0], [21.0, 21.0], [20.0, 20.0]]]
            ]
        }));
        let value = decode_wire(&geometry, 3005).unwrap();
        assert_eq!(value.srid(), 3005);
        let multi = value.to_multi_polygon();
        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 1);
    }

    #[test]
    fn test_decode_wire_rejects_other_types() {
        let point = wire(json!({"type": "Point", "coordinates": [1.0, 2.0]}));
        let err = decode_wire(&point, 4326).unwrap_err();
        assert!(matches!(err, BurnSeverityError::InvalidGeometry(ref m) if m.contains("Point")));
    }

    #[test]
    fn test_decode_wire_rejects_open_ring() {
        let open = wire(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]]
        }));
        assert!(decode_wire(&open, 4326).is_err());

        let not_closed = wire(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.5, 0.0]]]
        }));
        let err = decode_wire(&not_closed, 4326).unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_decode_wire_rejects_3d_positions() {
        let with_z = wire(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0, 5.0], [0.0, 1.0, 5.0], [1.0, 1.0, 5.0], [0.0, 0.0, 5.0]]]
        }));
        let err = decode_wire(&with_z, 4326).unwrap_err();
        assert!(err.to_string().contains("2D"), "{}", err);

        let short = wire(json!({
            "type": "Polygon",
            "coordinates": [[[0.0], [0.0, 1.0], [1.0, 1.0], [0.0]]]
        }));
        assert!(decode_wire(&short, 4326).is_err());
    }

    #[test]
    fn test_encode_wire_keeps_geometry_type() {
        let value = decode_wire(&unit_square(), 4326).unwrap();
        let encoded = encode_wire(&value);
        assert_eq!(encoded.value.type_name(), "Polygon");

        let multi = GeometryValue::new(Geometry::MultiPolygon(value.to_multi_polygon()), 4326).unwrap();
        assert_eq!(encode_wire(&multi).value.type_name(), "MultiPolygon");
    }

    #[test]
    fn test_decode_wire_rejects_empty_polygon() {
        let empty = wire(json!({"type": "Polygon", "coordinates": []}));
        assert!(decode_wire(&empty, 4326).is_err());

        let empty_multi = wire(json!({"type": "MultiPolygon", "coordinates": []}));
        assert!(decode_wire(&empty_multi, 4326).is_err());
    }

    #[test]
    fn test_wire_round_trip() {
        let value = decode_wire(&unit_square(), 4326).unwrap();
        let back = decode_wire(&encode_wire(&value), 4326).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn test_encode_native_has_srid() {
        let value = decode_wire(&unit_square(), 4326).unwrap();
        let native = encode_native(&value).unwrap();

        assert_eq!(native.srid(), Some(4326));
        // Type MultiPolygon (6) avec flag SRID
        let bytes = native.as_bytes();
        let type_bytes = [bytes[1], bytes[2], bytes[3], bytes[4]];
        let geom_type = if bytes[0] == 1 {
            u32::from_le_bytes(type_bytes)
        } else {
            u32::from_be_bytes(type_bytes)
        };
        assert_eq!(geom_type, 6 | EWKB_SRID_FLAG);
    }

    #[test]
    fn test_native_round_trip() {
        let value = decode_wire(&unit_square(), 4326).unwrap();
        let back = decode_native(&encode_native(&value).unwrap()).unwrap();

        assert_eq!(back.srid(), 4326);
        // Le store renvoie toujours un MultiPolygon
        assert!(matches!(back.geometry(), Geometry::MultiPolygon(_)));
        assert_coords_close(&value, &back);
    }

    #[test]
    fn test_native_round_trip_keeps_srid() {
        let value = decode_wire(&unit_square(), 3005).unwrap();
        let back = decode_native(&encode_native(&value).unwrap()).unwrap();
        assert_eq!(back.srid(), 3005);
    }

    #[test]
    fn test_decode_native_garbage() {
        let err = decode_native(&NativeGeometry(vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, BurnSeverityError::Wkb(_)));
    }

    #[test]
    fn test_add_srid_to_wkb_big_endian() {
        // Point XDR minimal: ordre, type 1, x, y
        let mut wkb = vec![0u8];
        wkb.extend_from_slice(&1u32.to_be_bytes());
        wkb.extend_from_slice(&1.0f64.to_be_bytes());
        wkb.extend_from_slice(&2.0f64.to_be_bytes());

        let ewkb = add_srid_to_wkb(&wkb, 3005).unwrap();
        assert_eq!(ewkb.len(), wkb.len() + 4);
        assert_eq!(NativeGeometry(ewkb).srid(), Some(3005));
        assert!(add_srid_to_wkb(&[1, 2], 4326).is_err());
    }
}
