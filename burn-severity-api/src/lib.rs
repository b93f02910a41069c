//! # burn-severity-api
//!
//! API HTTP de stockage des zones de sévérité de feux dans PostGIS.
//!
//! ## Routes
//!
//! - `POST /burn-severity/` : crée les features d'une FeatureCollection
//! - `GET /burn-severity/?skip=0&limit=100` : liste paginée
//! - `GET /burn-severity/{fire_number}` : premier enregistrement du feu
//! - `GET /burn-severity/id/{record_id}` : enregistrement par id
//! - `GET /health/live`, `GET /health/ready`
//!
//! ## Usage CLI
//!
//! ```bash
//! # Créer la table puis servir l'API
//! burn-severity-api serve --bind 0.0.0.0:8000
//!
//! # Créer uniquement le schéma
//! burn-severity-api migrate --schema public
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod store;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use http::{router, AppState};
pub use service::BurnSeverityService;
pub use store::{create_pool, DatabaseConfig, MemoryStore, PgStore, RecordStore, StoreError};
