//! Embedded Document Store
//!
//! SQLite-backed document storage: JSON bodies keyed by (collection, id),
//! with a collection registry and expression indexes over the logistics
//! query fields. This is the local side of the sync pair; the replication
//! engine and the data facade share this handle.

use crate::model::LogisticsField;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::BTreeSet;

/// Collections kept in sync with the cloud endpoint, as (name, scope) pairs.
///
/// Resolved once per process against the open store; collections that were
/// never created are skipped, not treated as errors.
pub const SYNCED_COLLECTIONS: &[(&str, &str)] = &[("logistics", "scp")];

/// A resolved collection reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub scope: String,
    pub name: String,
}

impl CollectionSpec {
    /// Fully qualified name, used as the partition key in the documents table.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.scope, self.name)
    }
}

impl std::fmt::Display for CollectionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid document body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("update patch must be a JSON object")]
    InvalidPatch,
    #[error("logistics record not found: {item_id}")]
    NotFound { item_id: String },
    #[error("store task failed to complete")]
    TaskFailed,
}

/// Local embedded document database.
pub struct DocumentStore {
    conn: Mutex<Connection>,
    /// In-memory mirror of the collection registry, so resolution never fails
    collections: RwLock<BTreeSet<(String, String)>>,
}

impl DocumentStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS collections (
                scope TEXT NOT NULL,
                name  TEXT NOT NULL,
                PRIMARY KEY (scope, name)
            );
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                body       TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (collection, id)
            );",
        )?;

        let mut registry = BTreeSet::new();
        {
            let mut stmt = conn.prepare("SELECT scope, name FROM collections")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                registry.insert(row?);
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            collections: RwLock::new(registry),
        })
    }

    /// Create a collection. Idempotent.
    pub fn create_collection(&self, name: &str, scope: &str) -> Result<CollectionSpec, StoreError> {
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO collections (scope, name) VALUES (?1, ?2)",
            params![scope, name],
        )?;
        self.collections
            .write()
            .insert((scope.to_string(), name.to_string()));
        Ok(CollectionSpec {
            scope: scope.to_string(),
            name: name.to_string(),
        })
    }

    /// Resolve a collection. Absent collections are not an error.
    pub fn collection(&self, name: &str, scope: &str) -> Option<CollectionSpec> {
        let key = (scope.to_string(), name.to_string());
        if self.collections.read().contains(&key) {
            Some(CollectionSpec {
                scope: key.0,
                name: key.1,
            })
        } else {
            None
        }
    }

    /// Resolve the fixed set of collections the replicator synchronizes.
    ///
    /// Collections that do not exist are skipped; the result may be empty,
    /// which the connection config factory rejects.
    pub fn replicated_collections(&self) -> Vec<CollectionSpec> {
        SYNCED_COLLECTIONS
            .iter()
            .filter_map(|(name, scope)| self.collection(name, scope))
            .collect()
    }

    /// Create the expression indexes backing the logistics queries.
    pub fn create_logistics_indexes(&self) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_logistics_status ON documents (
                json_extract(body, '$.status'),
                json_extract(body, '$.shipment_id'),
                json_extract(body, '$.rfid')
            ) WHERE collection = 'scp.logistics';
            CREATE INDEX IF NOT EXISTS idx_logistics_item ON documents (
                json_extract(body, '$.item_id')
            ) WHERE collection = 'scp.logistics';",
        )?;
        Ok(())
    }

    /// Insert or replace a document.
    pub fn save(&self, coll: &CollectionSpec, id: &str, body: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(body)?;
        self.conn.lock().execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, id)
             DO UPDATE SET body = excluded.body, updated_at = datetime('now')",
            params![coll.qualified(), id, text],
        )?;
        Ok(())
    }

    /// Fetch a document by id.
    pub fn get(&self, coll: &CollectionSpec, id: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![coll.qualified(), id],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Delete a document. Returns whether a row was removed.
    pub fn delete(&self, coll: &CollectionSpec, id: &str) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![coll.qualified(), id],
        )?;
        Ok(changed > 0)
    }

    /// Document id of the logistics record with the given item id, if any.
    pub fn logistics_doc_id(
        &self,
        coll: &CollectionSpec,
        item_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM documents
                 WHERE collection = ?1 AND json_extract(body, '$.item_id') = ?2",
                params![coll.qualified(), item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Fetch a logistics record by item id.
    pub fn get_logistics(
        &self,
        coll: &CollectionSpec,
        item_id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let conn = self.conn.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents
                 WHERE collection = ?1 AND json_extract(body, '$.item_id') = ?2",
                params![coll.qualified(), item_id],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Search logistics records.
    ///
    /// Empty arguments skip their condition: rfid and shipment_id match as
    /// substrings, status matches exactly. With no conditions at all the
    /// whole collection is returned, ordered by item id.
    pub fn search_logistics(
        &self,
        coll: &CollectionSpec,
        rfid: &str,
        shipment_id: &str,
        status: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let mut sql = String::from("SELECT body FROM documents WHERE collection = ?1");
        let mut args: Vec<String> = vec![coll.qualified()];

        if !rfid.is_empty() {
            sql.push_str(&format!(
                " AND json_extract(body, '$.rfid') LIKE ?{}",
                args.len() + 1
            ));
            args.push(format!("%{}%", rfid));
        }
        if !shipment_id.is_empty() {
            sql.push_str(&format!(
                " AND json_extract(body, '$.shipment_id') LIKE ?{}",
                args.len() + 1
            ));
            args.push(format!("%{}%", shipment_id));
        }
        if !status.is_empty() {
            sql.push_str(&format!(
                " AND json_extract(body, '$.status') = ?{}",
                args.len() + 1
            ));
            args.push(status.to_string());
        }
        sql.push_str(" ORDER BY json_extract(body, '$.item_id')");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(serde_json::from_str(&row?)?);
        }
        Ok(results)
    }

    /// Merge `patch` into the logistics record with the given item id.
    ///
    /// The original item_id always wins over whatever the patch carries.
    pub fn update_logistics(
        &self,
        coll: &CollectionSpec,
        item_id: &str,
        patch: &Value,
    ) -> Result<Value, StoreError> {
        let fields = patch.as_object().ok_or(StoreError::InvalidPatch)?;

        let doc_id = self
            .logistics_doc_id(coll, item_id)?
            .ok_or_else(|| StoreError::NotFound {
                item_id: item_id.to_string(),
            })?;
        let mut body = self.get(coll, &doc_id)?.ok_or_else(|| StoreError::NotFound {
            item_id: item_id.to_string(),
        })?;

        if let Some(obj) = body.as_object_mut() {
            for (key, value) in fields {
                obj.insert(key.clone(), value.clone());
            }
            obj.insert("item_id".to_string(), Value::String(item_id.to_string()));
        }

        self.save(coll, &doc_id, &body)?;
        Ok(body)
    }

    /// Ordered distinct non-missing values of one logistics field.
    pub fn distinct_logistics(
        &self,
        coll: &CollectionSpec,
        field: LogisticsField,
    ) -> Result<Vec<String>, StoreError> {
        let path = field.json_path();
        let sql = format!(
            "SELECT DISTINCT json_extract(body, '{path}') AS v FROM documents
             WHERE collection = ?1 AND json_extract(body, '{path}') IS NOT NULL
             ORDER BY v"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![coll.qualified()], |row| row.get::<_, String>(0))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }
}
