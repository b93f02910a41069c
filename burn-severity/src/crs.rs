//! Descripteurs de CRS GeoJSON (membre `crs` de type `name`)

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::{BurnSeverityError, Result};

/// SRID de stockage (colonne `geometry(MULTIPOLYGON, 4326)`)
pub const STORAGE_SRID: u32 = 4326;

/// BC Albers (NAD83), utilisé pour les mesures métriques
pub const BC_ALBERS_SRID: u32 = 3005;

/// Système de coordonnées identifié par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    pub epsg: u32,
}

impl Default for Crs {
    fn default() -> Self {
        Self::STORAGE
    }
}

fn epsg_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:urn:ogc:def:crs:epsg:[0-9.]*:|epsg:|https?://www\.opengis\.net/def/crs/epsg/0/)(\d+)$",
        )
        .unwrap_or_else(|_| unreachable!())
    })
}

fn crs84_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:ogc:[0-9.]*:crs84|crs84|https?://www\.opengis\.net/def/crs/ogc/1\.3/crs84)$")
            .unwrap_or_else(|_| unreachable!())
    })
}

impl Crs {
    /// CRS de stockage (WGS84)
    pub const STORAGE: Crs = Crs { epsg: STORAGE_SRID };

    pub fn from_epsg(epsg: u32) -> Self {
        Self { epsg }
    }

    /// Nom OGC, ex: `urn:ogc:def:crs:EPSG::4326`
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }

    /// Parse un nom de CRS (URN OGC, `EPSG:xxxx`, URL opengis, CRS84)
    pub fn parse_name(name: &str) -> Result<Self> {
        let name = name.trim();
        if crs84_regex().is_match(name) {
            return Ok(Self::STORAGE);
        }
        epsg_name_regex()
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|code| code.as_str().parse().ok())
            .map(Self::from_epsg)
            .ok_or_else(|| BurnSeverityError::UnsupportedCrs(name.to_string()))
    }

    /// Lit le membre `crs` d'une FeatureCollection
    ///
    /// `null` ou membre absent : CRS de stockage (RFC 7946 impose WGS84).
    pub fn from_member(member: Option<&Value>) -> Result<Self> {
        let Some(member) = member.filter(|m| !m.is_null()) else {
            return Ok(Self::STORAGE);
        };

        let kind = member.get("type").and_then(Value::as_str);
        if kind != Some("name") {
            return Err(BurnSeverityError::UnsupportedCrs(format!(
                "expected a CRS of type \"name\", got {}",
                member.get("type").unwrap_or(&Value::Null)
            )));
        }

        let name = member
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BurnSeverityError::UnsupportedCrs("CRS member has no properties.name".into())
            })?;

        Self::parse_name(name)
    }

    /// Membre `crs` à joindre à une FeatureCollection
    pub fn to_member(&self) -> Value {
        json!({
            "type": "name",
            "properties": { "name": self.urn() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(Crs::parse_name("urn:ogc:def:crs:EPSG::4326").unwrap().epsg, 4326);
        assert_eq!(Crs::parse_name("urn:ogc:def:crs:EPSG:6.6:3005").unwrap().epsg, 3005);
        assert_eq!(Crs::parse_name("EPSG:3005").unwrap().epsg, 3005);
        assert_eq!(Crs::parse_name("epsg:2154").unwrap().epsg, 2154);
        assert_eq!(
            Crs::parse_name("http://www.opengis.net/def/crs/EPSG/0/4326").unwrap().epsg,
            4326
        );
        assert_eq!(Crs::parse_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap().epsg, 4326);
    }

    #[test]
    fn test_parse_invalid_name() {
        assert!(matches!(
            Crs::parse_name("WGS 84"),
            Err(BurnSeverityError::UnsupportedCrs(_))
        ));
        assert!(Crs::parse_name("EPSG:").is_err());
    }

    #[test]
    fn test_from_member() {
        let member = json!({"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3005"}});
        assert_eq!(Crs::from_member(Some(&member)).unwrap().epsg, 3005);

        assert_eq!(Crs::from_member(None).unwrap(), Crs::STORAGE);
        assert_eq!(Crs::from_member(Some(&Value::Null)).unwrap(), Crs::STORAGE);

        let linked = json!({"type": "link", "properties": {"href": "http://example.com/crs"}});
        assert!(Crs::from_member(Some(&linked)).is_err());
    }

    #[test]
    fn test_to_member() {
        let member = Crs::STORAGE.to_member();
        assert_eq!(member["type"], "name");
        assert_eq!(member["properties"]["name"], "urn:ogc:def:crs:EPSG::4326");
        assert_eq!(Crs::from_member(Some(&member)).unwrap(), Crs::STORAGE);
    }
}
