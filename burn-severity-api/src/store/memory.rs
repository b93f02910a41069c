//! Store en mémoire, utilisé par les tests et le développement local
//!
//! Les géométries sont conservées en EWKB comme dans PostGIS, pour que les
//! lectures passent par le même décodage.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use burn_severity::codec::{decode_native, encode_native, NativeGeometry};
use burn_severity::{BurnSeverityAttributes, BurnSeverityRecord, NewBurnSeverity, RecordId};
use tokio::sync::RwLock;

use super::{RecordStore, StoreError, StoreResult};

struct StoredRow {
    id: RecordId,
    attributes: BurnSeverityAttributes,
    geom: NativeGeometry,
}

impl StoredRow {
    fn to_record(&self) -> StoreResult<BurnSeverityRecord> {
        Ok(BurnSeverityRecord {
            id: self.id,
            attributes: self.attributes.clone(),
            geometry: decode_native(&self.geom)?,
        })
    }
}

#[derive(Default)]
struct Rows {
    next_id: RecordId,
    rows: Vec<StoredRow>,
}

/// Store en mémoire (ids croissants à partir de 1)
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Rows>,
    unique_fire_number: bool,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new(unique_fire_number: bool) -> Self {
        Self {
            unique_fire_number,
            ..Default::default()
        }
    }

    /// Simule une base indisponible : toutes les opérations échouent
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store is unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_many(
        &self,
        records: Vec<NewBurnSeverity>,
    ) -> StoreResult<Vec<BurnSeverityRecord>> {
        self.check_available()?;
        let mut guard = self.rows.write().await;

        // Préparer le lot complet avant d'écrire : tout ou rien
        let mut next_id = guard.next_id;
        let mut pending: Vec<StoredRow> = Vec::with_capacity(records.len());
        for record in records {
            let fire_number = &record.attributes.fire_number;
            if self.unique_fire_number
                && guard
                    .rows
                    .iter()
                    .chain(pending.iter())
                    .any(|row| &row.attributes.fire_number == fire_number)
            {
                return Err(StoreError::Duplicate(fire_number.clone()));
            }

            next_id += 1;
            pending.push(StoredRow {
                id: next_id,
                geom: encode_native(&record.geometry)?,
                attributes: record.attributes,
            });
        }

        let stored = pending
            .iter()
            .map(StoredRow::to_record)
            .collect::<StoreResult<Vec<_>>>()?;

        guard.next_id = next_id;
        guard.rows.extend(pending);
        Ok(stored)
    }

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<BurnSeverityRecord>> {
        self.check_available()?;
        let guard = self.rows.read().await;
        guard
            .rows
            .iter()
            .find(|row| row.id == id)
            .map(StoredRow::to_record)
            .transpose()
    }

    async fn get_by_fire_number(
        &self,
        fire_number: &str,
    ) -> StoreResult<Option<BurnSeverityRecord>> {
        self.check_available()?;
        let guard = self.rows.read().await;
        guard
            .rows
            .iter()
            .find(|row| row.attributes.fire_number == fire_number)
            .map(StoredRow::to_record)
            .transpose()
    }

    async fn list(&self, offset: i64, limit: i64) -> StoreResult<Vec<BurnSeverityRecord>> {
        self.check_available()?;
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        let guard = self.rows.read().await;
        guard
            .rows
            .iter()
            .skip(offset)
            .take(limit)
            .map(StoredRow::to_record)
            .collect()
    }

    async fn health(&self) -> StoreResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_severity::{BurnSeverityRating, GeometryValue};
    use geo::{polygon, Geometry};

    fn new_record(fire_number: &str) -> NewBurnSeverity {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        NewBurnSeverity {
            attributes: BurnSeverityAttributes {
                fire_number: fire_number.into(),
                fire_year: 2023,
                pre_fire_image: "pre".into(),
                pre_fire_image_date: "2023-06-01".into(),
                post_fire_image: "post".into(),
                post_fire_image_date: "2023-09-15".into(),
                comments: None,
                fire_status: "Out".into(),
                burn_severity_rating: BurnSeverityRating::Unburned,
                area_ha: 0.5,
            },
            geometry: GeometryValue::new(Geometry::Polygon(poly), 4326).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::default();
        let first = store.insert(new_record("A")).await.unwrap();
        let batch = store
            .insert_many(vec![new_record("B"), new_record("C")])
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(batch.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        // Le store promeut en MultiPolygon
        assert!(matches!(first.geometry.geometry(), Geometry::MultiPolygon(_)));
    }

    #[tokio::test]
    async fn test_first_match_by_fire_number() {
        let store = MemoryStore::default();
        store
            .insert_many(vec![new_record("DUP"), new_record("DUP")])
            .await
            .unwrap();

        let found = store.get_by_fire_number("DUP").await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert!(store.get_by_fire_number("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_batch_is_all_or_nothing() {
        let store = MemoryStore::new(true);
        store.insert(new_record("A")).await.unwrap();

        let err = store
            .insert_many(vec![new_record("B"), new_record("A")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref n) if n == "A"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = MemoryStore::default();
        let batch = (0..5).map(|i| new_record(&format!("F{}", i))).collect();
        store.insert_many(batch).await.unwrap();

        let page = store.list(1, 2).await.unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(store.list(10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryStore::default();
        store.set_failing(true);
        assert!(matches!(store.health().await, Err(StoreError::Backend(_))));
        assert!(store.insert(new_record("A")).await.is_err());
    }
}
