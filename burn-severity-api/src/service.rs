//! Cas d'usage : création et lecture des enregistrements de sévérité

use std::sync::Arc;

use burn_severity::{
    present, validate::validate, BurnSeverityRecord, InboundCollection, MeasureMode, RecordId,
};
use geojson::FeatureCollection;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::store::RecordStore;

/// Service métier partagé par les handlers HTTP
#[derive(Clone)]
pub struct BurnSeverityService {
    store: Arc<dyn RecordStore>,
    measure_mode: MeasureMode,
}

impl BurnSeverityService {
    pub fn new(store: Arc<dyn RecordStore>, measure_mode: MeasureMode) -> Self {
        Self {
            store,
            measure_mode,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Valide, persiste (une transaction) et retourne les features créées
    pub async fn create(&self, collection: &InboundCollection) -> Result<FeatureCollection, ApiError> {
        let validated = validate(collection)?;
        let count = validated.features.len();
        debug!(features = count, crs = %validated.crs.urn(), "Collection validated");

        let stored = self.store.insert_many(validated.features).await?;

        info!(
            records = stored.len(),
            ids = ?stored.iter().map(|r| r.id).collect::<Vec<_>>(),
            "Burn severity records created"
        );
        self.present(&stored)
    }

    /// Premier enregistrement portant ce FIRE_NUMBER
    pub async fn find_by_fire_number(&self, fire_number: &str) -> Result<FeatureCollection, ApiError> {
        let record = self
            .store
            .get_by_fire_number(fire_number)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("fire number {}", fire_number)))?;
        self.present(std::slice::from_ref(&record))
    }

    pub async fn find_by_id(&self, id: RecordId) -> Result<FeatureCollection, ApiError> {
        let record = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("record id {}", id)))?;
        self.present(std::slice::from_ref(&record))
    }

    /// Page d'enregistrements en une seule FeatureCollection
    pub async fn list(&self, skip: i64, limit: i64) -> Result<FeatureCollection, ApiError> {
        let records = self.store.list(skip, limit).await?;
        debug!(skip, limit, returned = records.len(), "Records listed");
        self.present(&records)
    }

    /// Mesure et assemble la réponse
    fn present(&self, records: &[BurnSeverityRecord]) -> Result<FeatureCollection, ApiError> {
        present(records, self.measure_mode).map_err(ApiError::Measure)
    }
}
