//! Reprojection intelligente : reproject lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use geo::Geometry;

use super::ReprojectorLite;
use crate::Result;

/// Reprojection intelligente
///
/// Essaie d'abord la reprojection légère (pure Rust), puis PROJ si disponible.
pub enum SmartReprojector {
    /// Pas de reprojection (source == cible)
    Identity,
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(super::proj::Reprojector),
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            return Ok(Self::Lite(ReprojectorLite::new(source_epsg, target_epsg)?));
        }

        #[cfg(feature = "reproject")]
        {
            let proj = super::proj::Reprojector::new(source_epsg, target_epsg)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        return Err(crate::BurnSeverityError::UnsupportedCrs(format!(
            "EPSG:{} -> EPSG:{} requires the 'reproject' feature (built-in: 4326, 3005)",
            source_epsg, target_epsg
        )));
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Lite(_) => "lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let r = SmartReprojector::new(4326, 4326).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
    }

    #[test]
    fn test_lite() {
        let r = SmartReprojector::new(3005, 4326).unwrap();
        assert!(matches!(r, SmartReprojector::Lite(_)));
        assert_eq!(r.description(), "lite (pure Rust)");
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unsupported_without_proj() {
        assert!(matches!(
            SmartReprojector::new(2154, 4326),
            Err(crate::BurnSeverityError::UnsupportedCrs(_))
        ));
    }
}
