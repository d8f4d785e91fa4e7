//! Data Access Facade
//!
//! Async CRUD and canned queries over the embedded store. Shares the
//! `DocumentStore` handle with the replication engine but never touches
//! replication state; blocking SQLite work runs on the blocking pool.

use crate::model::{LogisticsField, LogisticsRecord};
use crate::store::{CollectionSpec, DocumentStore, StoreError};
use serde_json::Value;
use std::sync::Arc;

/// Search filter for logistics records. Empty fields are skipped.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Substring match on the RFID tag
    pub rfid: String,
    /// Substring match on the shipment id
    pub shipment_id: String,
    /// Exact status match
    pub status: String,
}

/// Application-facing service over the logistics collection.
pub struct LogisticsService {
    store: Arc<DocumentStore>,
    coll: CollectionSpec,
}

impl LogisticsService {
    /// Set up the logistics collection and its indexes, then return the
    /// service. Idempotent across restarts.
    pub async fn initialize(store: Arc<DocumentStore>) -> Result<Self, StoreError> {
        let coll = {
            let store = store.clone();
            run_blocking(move || {
                let coll = store.create_collection("logistics", "scp")?;
                store.create_logistics_indexes()?;
                Ok(coll)
            })
            .await?
        };
        tracing::info!("logistics store initialized, collection={}", coll);
        Ok(Self { store, coll })
    }

    /// The shared database handle, for wiring the failover controller.
    pub fn store(&self) -> Arc<DocumentStore> {
        self.store.clone()
    }

    /// Insert a record, or replace the record with the same item id.
    /// Returns the document id.
    pub async fn upsert(&self, record: LogisticsRecord) -> Result<String, StoreError> {
        let store = self.store.clone();
        let coll = self.coll.clone();
        run_blocking(move || {
            let doc_id = match store.logistics_doc_id(&coll, &record.item_id)? {
                Some(existing) => existing,
                None => format!("logistics::{}", uuid::Uuid::new_v4()),
            };
            let body = serde_json::to_value(&record)?;
            store.save(&coll, &doc_id, &body)?;
            Ok(doc_id)
        })
        .await
    }

    /// Fetch a record by item id.
    pub async fn get(&self, item_id: &str) -> Result<Option<LogisticsRecord>, StoreError> {
        let store = self.store.clone();
        let coll = self.coll.clone();
        let item_id = item_id.to_string();
        run_blocking(move || {
            match store.get_logistics(&coll, &item_id)? {
                Some(body) => Ok(Some(serde_json::from_value(body)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Merge the given fields into an existing record. The item id of the
    /// stored record always wins over the patch.
    pub async fn update(&self, item_id: &str, patch: Value) -> Result<LogisticsRecord, StoreError> {
        let store = self.store.clone();
        let coll = self.coll.clone();
        let item_id = item_id.to_string();
        run_blocking(move || {
            let merged = store.update_logistics(&coll, &item_id, &patch)?;
            Ok(serde_json::from_value(merged)?)
        })
        .await
    }

    /// Search records by RFID / shipment id substring and exact status.
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<LogisticsRecord>, StoreError> {
        let store = self.store.clone();
        let coll = self.coll.clone();
        run_blocking(move || {
            let rows =
                store.search_logistics(&coll, &filter.rfid, &filter.shipment_id, &filter.status)?;
            rows.into_iter()
                .map(|row| serde_json::from_value(row).map_err(StoreError::from))
                .collect()
        })
        .await
    }

    /// Ordered distinct values of one field, for the app's filter dropdowns.
    pub async fn distinct(&self, field: LogisticsField) -> Result<Vec<String>, StoreError> {
        let store = self.store.clone();
        let coll = self.coll.clone();
        run_blocking(move || store.distinct_logistics(&coll, field)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("store task panicked or was cancelled: {}", e);
            Err(StoreError::TaskFailed)
        }
    }
}
