//! Persistance des enregistrements de sévérité
//!
//! Le store échange des géométries au format natif (EWKB) : l'encodage et le
//! décodage passent par `burn_severity::codec`, jamais par le SQL.

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod transaction;

pub use memory::MemoryStore;
pub use pool::{create_pool, DatabaseConfig, SslMode};
pub use postgres::PgStore;

use async_trait::async_trait;
use burn_severity::{BurnSeverityError, BurnSeverityRecord, NewBurnSeverity, RecordId};
use thiserror::Error;

/// Erreurs du store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Échec d'une requête SQL
    #[error("Database error: {0}")]
    Persistence(#[from] tokio_postgres::Error),

    /// Aucune connexion disponible
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Géométrie stockée illisible ou non encodable
    #[error("Geometry codec error: {0}")]
    Codec(#[from] BurnSeverityError),

    /// FIRE_NUMBER déjà présent (unicité activée)
    #[error("Fire number already exists: {0}")]
    Duplicate(String),

    /// Autre défaillance du backend
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Alias de résultat du store
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Accès aux enregistrements persistés
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insère un enregistrement et le retourne tel que stocké
    async fn insert(&self, record: NewBurnSeverity) -> StoreResult<BurnSeverityRecord> {
        self.insert_many(vec![record])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Backend("insert returned no row".into()))
    }

    /// Insère plusieurs enregistrements dans une seule transaction
    ///
    /// Tout ou rien : en cas d'erreur, aucun enregistrement n'est conservé.
    async fn insert_many(
        &self,
        records: Vec<NewBurnSeverity>,
    ) -> StoreResult<Vec<BurnSeverityRecord>>;

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<BurnSeverityRecord>>;

    /// Premier enregistrement (plus petit id) portant ce FIRE_NUMBER
    async fn get_by_fire_number(&self, fire_number: &str)
        -> StoreResult<Option<BurnSeverityRecord>>;

    /// Page d'enregistrements, triés par id
    async fn list(&self, offset: i64, limit: i64) -> StoreResult<Vec<BurnSeverityRecord>>;

    /// Vérifie que le backend répond
    async fn health(&self) -> StoreResult<()>;
}
