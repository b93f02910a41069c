//! Store PostgreSQL/PostGIS

use std::collections::HashSet;

use async_trait::async_trait;
use burn_severity::codec::{decode_native, encode_native, NativeGeometry};
use burn_severity::{
    BurnSeverityAttributes, BurnSeverityRating, BurnSeverityRecord, NewBurnSeverity, RecordId,
    STORAGE_SRID,
};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tracing::{debug, info, warn};

use super::transaction::WriteTransaction;
use super::{RecordStore, StoreError, StoreResult};
use crate::config::is_valid_identifier;

/// Nom de la table des enregistrements
pub const TABLE_NAME: &str = "fire_burn_severity";

/// Colonnes lues, géométrie en EWKB
const SELECT_COLUMNS: &str = "id, fire_number, fire_year, pre_fire_image, pre_fire_image_date, \
     post_fire_image, post_fire_image_date, comments, fire_status, burn_severity_rating, \
     area_ha, ST_AsEWKB(geom) AS geom";

/// Store adossé à un pool deadpool-postgres
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    schema: String,
    table: String,
    unique_fire_number: bool,
}

impl PgStore {
    /// Crée le store ; aucune connexion n'est ouverte ici
    pub fn new(pool: Pool, schema: &str, unique_fire_number: bool) -> StoreResult<Self> {
        if !is_valid_identifier(schema) {
            return Err(StoreError::Backend(format!("Invalid schema name: {}", schema)));
        }
        Ok(Self {
            pool,
            schema: schema.to_string(),
            table: format!("{}.{}", schema, TABLE_NAME),
            unique_fire_number,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Nom qualifié de la table (`schema.fire_burn_severity`)
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Ferme le pool : les connexions rendues ne sont plus réutilisées
    pub fn close(&self) {
        self.pool.close();
    }

    /// Crée schéma, extension, table et index (idempotent)
    pub async fn create_schema(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;

        if self.schema != "public" {
            client
                .execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema), &[])
                .await?;
        }

        // Activer PostGIS si nécessaire (peut nécessiter des droits superuser).
        // Si l'extension existe déjà mais que l'utilisateur ne peut pas la (re)créer,
        // on dégrade gracieusement.
        if let Err(e) = client
            .execute("CREATE EXTENSION IF NOT EXISTS postgis", &[])
            .await
        {
            warn!("CREATE EXTENSION postgis failed (will check if already installed): {e}");
            let exists = client
                .query_opt("SELECT 1 FROM pg_extension WHERE extname = 'postgis'", &[])
                .await?
                .is_some();
            if !exists {
                return Err(StoreError::Backend(format!(
                    "PostGIS extension is not installed and could not be created: {e}"
                )));
            }
        }

        let ratings = BurnSeverityRating::ALL
            .iter()
            .map(|r| format!("'{}'", r.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id BIGSERIAL PRIMARY KEY,
                fire_number VARCHAR(50) NOT NULL,
                fire_year INTEGER NOT NULL,
                pre_fire_image TEXT NOT NULL,
                pre_fire_image_date TEXT NOT NULL,
                post_fire_image TEXT NOT NULL,
                post_fire_image_date TEXT NOT NULL,
                comments TEXT,
                fire_status TEXT NOT NULL,
                burn_severity_rating TEXT NOT NULL,
                area_ha DOUBLE PRECISION NOT NULL,
                geom geometry(MULTIPOLYGON, {srid}) NOT NULL,
                CONSTRAINT {name}_rating_check CHECK (burn_severity_rating IN ({ratings}))
            )
            "#,
            table = self.table,
            srid = STORAGE_SRID,
            name = TABLE_NAME,
            ratings = ratings,
        );
        client.execute(&sql, &[]).await?;

        client
            .execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{name}_fire_number ON {table} (fire_number)",
                    name = TABLE_NAME,
                    table = self.table
                ),
                &[],
            )
            .await?;

        client
            .execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{name}_geom ON {table} USING GIST (geom)",
                    name = TABLE_NAME,
                    table = self.table
                ),
                &[],
            )
            .await?;

        info!(table = %self.table, "Schema ready");
        Ok(())
    }

    /// Insère le lot dans la transaction ouverte
    async fn insert_in(
        &self,
        tx: &mut WriteTransaction<'_>,
        records: Vec<NewBurnSeverity>,
    ) -> StoreResult<Vec<BurnSeverityRecord>> {
        let insert = tx
            .transaction()
            .prepare(&format!(
                r#"
                INSERT INTO {} (
                    fire_number, fire_year, pre_fire_image, pre_fire_image_date,
                    post_fire_image, post_fire_image_date, comments, fire_status,
                    burn_severity_rating, area_ha, geom
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, ST_GeomFromEWKB($11))
                RETURNING id, ST_AsEWKB(geom) AS geom
                "#,
                self.table
            ))
            .await?;

        let mut seen = HashSet::new();
        let mut stored = Vec::with_capacity(records.len());

        for record in records {
            let attrs = &record.attributes;

            if self.unique_fire_number {
                if !seen.insert(attrs.fire_number.clone()) {
                    return Err(StoreError::Duplicate(attrs.fire_number.clone()));
                }
                self.ensure_unique(tx, &attrs.fire_number).await?;
            }

            let native = encode_native(&record.geometry)?;
            let rating = attrs.burn_severity_rating.as_str();

            let row = tx
                .transaction()
                .query_one(
                    &insert,
                    &[
                        &attrs.fire_number,
                        &attrs.fire_year,
                        &attrs.pre_fire_image,
                        &attrs.pre_fire_image_date,
                        &attrs.post_fire_image,
                        &attrs.post_fire_image_date,
                        &attrs.comments,
                        &attrs.fire_status,
                        &rating,
                        &attrs.area_ha,
                        &native.as_bytes(),
                    ],
                )
                .await?;
            tx.record_insert();

            let id: RecordId = row.try_get("id")?;
            let geom: Vec<u8> = row.try_get("geom")?;
            debug!(id, fire_number = %attrs.fire_number, "Record inserted");

            stored.push(BurnSeverityRecord {
                id,
                geometry: decode_native(&NativeGeometry(geom))?,
                attributes: record.attributes,
            });
        }

        Ok(stored)
    }

    /// Verrouille le FIRE_NUMBER jusqu'à la fin de la transaction, puis vérifie
    /// qu'il n'existe pas encore
    async fn ensure_unique(&self, tx: &WriteTransaction<'_>, fire_number: &str) -> StoreResult<()> {
        let client = tx.transaction();
        client
            .execute("SELECT pg_advisory_xact_lock(hashtext($1))", &[&fire_number])
            .await?;

        let exists = client
            .query_opt(
                &format!("SELECT 1 FROM {} WHERE fire_number = $1 LIMIT 1", self.table),
                &[&fire_number],
            )
            .await?
            .is_some();

        if exists {
            return Err(StoreError::Duplicate(fire_number.to_string()));
        }
        Ok(())
    }

    async fn select_one(
        &self,
        filter: &str,
        param: &(dyn tokio_postgres::types::ToSql + Sync),
    ) -> StoreResult<Option<BurnSeverityRecord>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY id LIMIT 1",
            SELECT_COLUMNS, self.table, filter
        );
        client
            .query_opt(&sql, &[param])
            .await?
            .map(|row| row_to_record(&row))
            .transpose()
    }
}

/// Convertit une ligne `SELECT_COLUMNS` en enregistrement
fn row_to_record(row: &Row) -> StoreResult<BurnSeverityRecord> {
    let rating: String = row.try_get("burn_severity_rating")?;
    let geom: Vec<u8> = row.try_get("geom")?;

    Ok(BurnSeverityRecord {
        id: row.try_get("id")?,
        attributes: BurnSeverityAttributes {
            fire_number: row.try_get("fire_number")?,
            fire_year: row.try_get("fire_year")?,
            pre_fire_image: row.try_get("pre_fire_image")?,
            pre_fire_image_date: row.try_get("pre_fire_image_date")?,
            post_fire_image: row.try_get("post_fire_image")?,
            post_fire_image_date: row.try_get("post_fire_image_date")?,
            comments: row.try_get("comments")?,
            fire_status: row.try_get("fire_status")?,
            burn_severity_rating: rating.parse()?,
            area_ha: row.try_get("area_ha")?,
        },
        geometry: decode_native(&NativeGeometry(geom))?,
    })
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_many(
        &self,
        records: Vec<NewBurnSeverity>,
    ) -> StoreResult<Vec<BurnSeverityRecord>> {
        let mut client = self.pool.get().await?;
        let mut tx = WriteTransaction::begin(&mut client, "insert_burn_severity").await?;

        match self.insert_in(&mut tx, records).await {
            Ok(stored) => {
                tx.commit().await?;
                Ok(stored)
            }
            Err(e) => {
                tx.rollback(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<BurnSeverityRecord>> {
        self.select_one("id", &id).await
    }

    async fn get_by_fire_number(
        &self,
        fire_number: &str,
    ) -> StoreResult<Option<BurnSeverityRecord>> {
        self.select_one("fire_number", &fire_number).await
    }

    async fn list(&self, offset: i64, limit: i64) -> StoreResult<Vec<BurnSeverityRecord>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id OFFSET $1 LIMIT $2",
            SELECT_COLUMNS, self.table
        );
        let rows = client.query(&sql, &[&offset, &limit]).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn health(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.execute("SELECT 1", &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::pool::{create_pool, DatabaseConfig};

    #[test]
    fn test_rejects_invalid_schema() {
        let pool = create_pool(&DatabaseConfig::default()).unwrap();
        assert!(PgStore::new(pool.clone(), "public", false).is_ok());
        assert!(matches!(
            PgStore::new(pool, "x; DROP TABLE y", false),
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn test_qualified_table_name() {
        let pool = create_pool(&DatabaseConfig::default()).unwrap();
        let store = PgStore::new(pool, "wildfire", true).unwrap();
        assert_eq!(store.table(), "wildfire.fire_burn_severity");
    }
}
