//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Supporte les deux systèmes utilisés par le service :
//! - WGS84 (EPSG:4326) - stockage
//! - BC Albers (EPSG:3005) - saisie et mesures métriques
//!
//! Les autres codes EPSG passent par PROJ (feature `reproject`).

mod albers;
mod ellipsoid;
#[cfg(feature = "reproject")]
mod proj;
mod smart;

pub use smart::SmartReprojector;

use geo::{Coord, Geometry, MapCoords};

use crate::crs::{BC_ALBERS_SRID, STORAGE_SRID};
use crate::{BurnSeverityError, Result};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Reprojection légère entre WGS84 et BC Albers
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source_epsg: u32,
    target_epsg: u32,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        if !Self::is_supported(source_epsg, target_epsg) {
            return Err(BurnSeverityError::UnsupportedCrs(format!(
                "EPSG:{} -> EPSG:{} (supported: 4326, 3005)",
                source_epsg, target_epsg
            )));
        }

        Ok(Self {
            source_epsg,
            target_epsg,
        })
    }

    /// Vérifie si l'EPSG est supporté
    pub fn is_supported_epsg(epsg: u32) -> bool {
        matches!(epsg, STORAGE_SRID | BC_ALBERS_SRID)
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Self::is_supported_epsg(source) && Self::is_supported_epsg(target)
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        // Étape 1: Source → Géographique
        let geo = self.source_to_geographic(x, y)?;

        // Étape 2: Géographique → Cible
        self.geographic_to_target(geo)
    }

    fn source_to_geographic(&self, x: f64, y: f64) -> Result<Geographic> {
        match self.source_epsg {
            STORAGE_SRID => Ok(Geographic::from_degrees(x, y)),
            BC_ALBERS_SRID => albers::bc_albers_to_geographic(x, y),
            other => Err(BurnSeverityError::UnsupportedCrs(format!("EPSG:{}", other))),
        }
    }

    fn geographic_to_target(&self, geo: Geographic) -> Result<(f64, f64)> {
        match self.target_epsg {
            STORAGE_SRID => Ok(geo.to_degrees()),
            BC_ALBERS_SRID => albers::geographic_to_bc_albers(geo),
            other => Err(BurnSeverityError::UnsupportedCrs(format!("EPSG:{}", other))),
        }
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
        geom.try_map_coords(|c: Coord<f64>| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_wgs84_to_bc_albers() {
        // Victoria (environ 48.43°N, 123.37°W)
        let reproj = ReprojectorLite::new(4326, 3005).unwrap();
        let (x, y) = reproj.transform_point(-123.37, 48.43).unwrap();

        // Valeurs de référence approximatives (ex: epsg.io)
        assert!((x - 1_195_000.0).abs() < 5_000.0, "x={}", x);
        assert!((y - 383_000.0).abs() < 5_000.0, "y={}", y);
    }

    #[test]
    fn test_bc_albers_to_wgs84() {
        let reproj = ReprojectorLite::new(3005, 4326).unwrap();
        let (lon, lat) = reproj.transform_point(1_000_000.0, 0.0).unwrap();

        assert!((lon - (-126.0)).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 45.0).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_transform_polygon() {
        let reproj = ReprojectorLite::new(4326, 3005).unwrap();
        let poly = polygon![
            (x: -120.0, y: 50.0),
            (x: -119.99, y: 50.0),
            (x: -119.99, y: 50.01),
            (x: -120.0, y: 50.0),
        ];
        let out = reproj.transform_geometry(&Geometry::Polygon(poly)).unwrap();
        let Geometry::Polygon(projected) = out else {
            panic!("expected a polygon");
        };
        assert_eq!(projected.exterior().0.len(), 4);
        assert!(projected.exterior().0[0].x > 1_000_000.0);
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(ReprojectorLite::new(2154, 4326).is_err());
        assert!(ReprojectorLite::new(4326, 3857).is_err());
    }
}
