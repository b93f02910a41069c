//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use proj::Proj;

use crate::{BurnSeverityError, Result};

/// Reprojection de géométries entre deux systèmes de coordonnées
pub struct Reprojector {
    proj: Proj,
}

impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            BurnSeverityError::UnsupportedCrs(format!("{} -> {}: {}", source, target, e))
        })?;

        Ok(Self { proj })
    }

    /// Transforme une géométrie surfacique
    pub fn transform_geometry(&self, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
        match geom {
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p)?)),
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>> =
                    mp.0.iter().map(|p| self.transform_polygon(p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            _ => Err(BurnSeverityError::Reprojection(
                "only polygonal geometries can be reprojected".into(),
            )),
        }
    }

    /// Transforme une LineString (conversion batch)
    fn transform_linestring(&self, ls: &LineString) -> Result<LineString> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut coords)
            .map_err(|e| BurnSeverityError::Reprojection(e.to_string()))?;

        let result: Vec<Coord> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
        Ok(LineString::new(result))
    }

    fn transform_polygon(&self, p: &Polygon) -> Result<Polygon> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString>> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm10_to_wgs84() {
        // Kamloops en UTM 10N (NAD83)
        let reprojector = Reprojector::new(26910, 4326).unwrap();

        let poly = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (687000.0, 5620000.0),
                (687100.0, 5620000.0),
                (687100.0, 5620100.0),
                (687000.0, 5620000.0),
            ]),
            vec![],
        ));

        let Geometry::Polygon(p) = reprojector.transform_geometry(&poly).unwrap() else {
            panic!("Expected Polygon geometry");
        };
        let first = &p.exterior().0[0];
        assert!(first.x > -121.0 && first.x < -120.0, "lon={}", first.x);
        assert!(first.y > 50.0 && first.y < 51.0, "lat={}", first.y);
    }

    #[test]
    fn test_invalid_epsg() {
        assert!(Reprojector::new(99999, 4326).is_err());
    }
}
