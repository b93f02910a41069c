//! Transaction d'écriture atomique
//!
//! Garantit le rollback en cas d'erreur pendant une insertion groupée.

use deadpool_postgres::{Object, Transaction};
use tracing::{debug, error, info};

use super::StoreResult;

/// Transaction d'insertion d'un lot d'enregistrements
pub struct WriteTransaction<'a> {
    transaction: Transaction<'a>,
    operation: &'static str,
    records_written: usize,
}

impl<'a> WriteTransaction<'a> {
    /// Démarre une transaction sur la connexion
    pub async fn begin(client: &'a mut Object, operation: &'static str) -> StoreResult<Self> {
        let transaction = client.transaction().await?;

        debug!(operation, "Transaction started");

        Ok(Self {
            transaction,
            operation,
            records_written: 0,
        })
    }

    /// Accède à la transaction sous-jacente pour exécuter des requêtes
    pub fn transaction(&self) -> &Transaction<'a> {
        &self.transaction
    }

    /// Compte un enregistrement écrit
    pub fn record_insert(&mut self) {
        self.records_written += 1;
    }

    /// Valide la transaction
    pub async fn commit(self) -> StoreResult<usize> {
        self.transaction.commit().await?;

        info!(
            operation = self.operation,
            records = self.records_written,
            "Transaction committed"
        );

        Ok(self.records_written)
    }

    /// Annule la transaction
    ///
    /// La transaction est également annulée si elle est droppée.
    pub async fn rollback(self, reason: &str) {
        error!(
            operation = self.operation,
            reason = %reason,
            records_attempted = self.records_written,
            "Rolling back transaction"
        );

        if let Err(e) = self.transaction.rollback().await {
            error!(error = %e, "Explicit rollback failed (will rollback on drop anyway)");
        }
    }
}
