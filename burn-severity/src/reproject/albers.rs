//! Projection BC Albers (EPSG:3005)
//!
//! Albers Equal Area Conic avec 2 parallèles standards, ellipsoïde GRS80.
//! Formules de Snyder (Map Projections, USGS 1395, §14).

use super::ellipsoid::GRS80;
use super::Geographic;
use crate::{BurnSeverityError, Result};

/// Paramètres BC Albers (EPSG:3005)
struct BcAlbers {
    /// Méridien central
    lon0: f64,
    /// Latitude origine
    lat0: f64,
    /// Premier parallèle standard
    lat1: f64,
    /// Deuxième parallèle standard
    lat2: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl Default for BcAlbers {
    fn default() -> Self {
        Self {
            lon0: (-126.0_f64).to_radians(),
            lat0: 45.0_f64.to_radians(),
            lat1: 50.0_f64.to_radians(),
            lat2: 58.5_f64.to_radians(),
            x0: 1_000_000.0,
            y0: 0.0,
        }
    }
}

/// Constantes dérivées de la projection
struct Constants {
    n: f64,
    c: f64,
    rho0: f64,
}

impl BcAlbers {
    fn constants(&self) -> Constants {
        let m1 = m(self.lat1);
        let m2 = m(self.lat2);
        let q0 = q(self.lat0);
        let q1 = q(self.lat1);
        let q2 = q(self.lat2);

        let n = (m1 * m1 - m2 * m2) / (q2 - q1);
        let c = m1 * m1 + n * q1;
        let rho0 = GRS80::A * (c - n * q0).sqrt() / n;

        Constants { n, c, rho0 }
    }
}

/// m = cos φ / sqrt(1 - e² sin² φ)
fn m(lat: f64) -> f64 {
    lat.cos() / (1.0 - GRS80::E2 * lat.sin().powi(2)).sqrt()
}

/// q = (1 - e²) [sin φ / (1 - e² sin² φ) - 1/(2e) ln((1 - e sin φ) / (1 + e sin φ))]
fn q(lat: f64) -> f64 {
    let e = GRS80::E;
    let sin_lat = lat.sin();
    (1.0 - GRS80::E2)
        * (sin_lat / (1.0 - GRS80::E2 * sin_lat * sin_lat)
            - (1.0 / (2.0 * e)) * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).ln())
}

/// Convertit des coordonnées géographiques (NAD83 ≈ WGS84) vers BC Albers
pub fn geographic_to_bc_albers(geo: Geographic) -> Result<(f64, f64)> {
    let params = BcAlbers::default();
    let k = params.constants();

    let radicand = k.c - k.n * q(geo.lat);
    if radicand < 0.0 || !radicand.is_finite() {
        return Err(BurnSeverityError::Reprojection(format!(
            "latitude {} outside BC Albers domain",
            geo.lat.to_degrees()
        )));
    }

    let rho = GRS80::A * radicand.sqrt() / k.n;
    let theta = k.n * (geo.lon - params.lon0);

    let x = params.x0 + rho * theta.sin();
    let y = params.y0 + k.rho0 - rho * theta.cos();
    Ok((x, y))
}

/// Convertit BC Albers vers coordonnées géographiques (itératif)
pub fn bc_albers_to_geographic(x: f64, y: f64) -> Result<Geographic> {
    let params = BcAlbers::default();
    let k = params.constants();
    let e = GRS80::E;
    let e2 = GRS80::E2;

    let dx = x - params.x0;
    let dy = k.rho0 - (y - params.y0);

    let rho = (dx * dx + dy * dy).sqrt();
    let theta = dx.atan2(dy);

    let q_target = (k.c - rho * rho * k.n * k.n / (GRS80::A * GRS80::A)) / k.n;

    // Point de départ: solution sphérique
    let mut lat = (q_target / 2.0).clamp(-1.0, 1.0).asin();
    for _ in 0..15 {
        let sin_lat = lat.sin();
        let one_minus = 1.0 - e2 * sin_lat * sin_lat;
        let delta = one_minus * one_minus / (2.0 * lat.cos())
            * (q_target / (1.0 - e2) - sin_lat / one_minus
                + (1.0 / (2.0 * e)) * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).ln());
        lat += delta;

        if delta.abs() < 1e-12 {
            break;
        }
    }

    if !lat.is_finite() {
        return Err(BurnSeverityError::Reprojection(format!(
            "BC Albers inverse did not converge for ({}, {})",
            x, y
        )));
    }

    let lon = params.lon0 + theta / k.n;
    Ok(Geographic::new(lon, lat))
}
