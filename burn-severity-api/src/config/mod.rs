//! Configuration du service

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use burn_severity::MeasureMode;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Taille de page par défaut pour la liste
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Configuration du service HTTP
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Adresse d'écoute
    pub bind_addr: SocketAddr,

    /// Schéma PostgreSQL de la table `fire_burn_severity`
    pub schema: String,

    /// Unités des mesures FEATURE_AREA_SQM / FEATURE_LENGTH_M
    pub measure_mode: MeasureMode,

    /// Refuser (409) un FIRE_NUMBER déjà présent
    pub unique_fire_number: bool,

    /// Valeur maximale acceptée pour `limit`
    pub max_page_size: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            schema: "public".into(),
            measure_mode: MeasureMode::Native,
            unique_fire_number: false,
            max_page_size: 1000,
        }
    }
}

impl ServiceConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Charge une configuration depuis un fichier JSON, surchargée par l'environnement
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(addr) = env_parsed("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(schema) = std::env::var("PGSCHEMA") {
            self.schema = schema;
        }
        if let Some(mode) = env_parsed("MEASURE_MODE") {
            self.measure_mode = mode;
        }
        if let Some(unique) = env_parsed::<String>("UNIQUE_FIRE_NUMBER") {
            self.unique_fire_number = matches!(
                unique.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(max) = env_parsed("MAX_PAGE_SIZE") {
            self.max_page_size = max;
        }
    }

    /// Vérifie la cohérence de la configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_page_size < 1 {
            anyhow::bail!("max_page_size must be at least 1, got {}", self.max_page_size);
        }
        if !is_valid_identifier(&self.schema) {
            anyhow::bail!("Invalid schema name: {}", self.schema);
        }
        Ok(())
    }
}

/// Lit et parse une variable d'environnement, en ignorant (avec un warning)
/// les valeurs invalides
fn env_parsed<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(variable = name, value = %raw, error = %e, "Ignoring invalid environment value");
            None
        }
    }
}

/// Identifiant SQL non quoté (schéma, table)
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.measure_mode, MeasureMode::Native);
        assert!(!config.unique_fire_number);
        assert_eq!(config.max_page_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{"measure_mode": "bc_albers", "unique_fire_number": true}"#,
        )
        .unwrap();
        assert_eq!(config.measure_mode, MeasureMode::BcAlbers);
        assert!(config.unique_fire_number);
        assert_eq!(config.schema, "public");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ServiceConfig {
            max_page_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServiceConfig {
            schema: "public; DROP TABLE x".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_identifiers() {
        assert!(is_valid_identifier("public"));
        assert!(is_valid_identifier("_fires_2023"));
        assert!(!is_valid_identifier("2023_fires"));
        assert!(!is_valid_identifier("Fires"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a-b"));
    }
}
