//! Core Store implementation

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::record::{Filter, Record, now_ms};
use crate::{DB_FILE, LOCK_FILE};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
);
";

/// One operation inside an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a document; the id is taken from the body or generated
    Create { collection: String, body: Value },
    /// Shallow-merge fields into an existing document (`null` removes a field)
    Update { collection: String, id: String, fields: Value },
    /// Remove a document (missing documents are not an error)
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn create(collection: impl Into<String>, body: Value) -> Self {
        WriteOp::Create {
            collection: collection.into(),
            body,
        }
    }

    pub fn update(collection: impl Into<String>, id: impl Into<String>, fields: Value) -> Self {
        WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        WriteOp::Delete {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// SQLite-backed document store
///
/// Holds an exclusive lock on its directory for as long as it is open.
pub struct Store {
    conn: Connection,
    _lock: File,
}

impl Store {
    /// Open or create a store in the given directory
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = path.as_ref().to_path_buf();
        debug!(?base_path, "Store::open: called");
        fs::create_dir_all(&base_path)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(base_path.join(LOCK_FILE))?;
        lock.try_lock_exclusive()
            .map_err(|_| StoreError::Locked(base_path.clone()))?;

        let conn = Connection::open(base_path.join(DB_FILE))?;
        conn.execute_batch(SCHEMA)?;

        info!(?base_path, "Opened document store");
        Ok(Self {
            conn,
            _lock: lock,
        })
    }

    /// Insert a document and return its id
    pub fn create(&mut self, collection: &str, body: Value) -> StoreResult<String> {
        debug!(%collection, "Store::create: called");
        let tx = self.conn.transaction()?;
        let id = insert_doc(&tx, collection, body)?;
        tx.commit()?;
        Ok(id)
    }

    /// Fetch a single document
    pub fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        debug!(%collection, %id, "Store::get: called");
        get_doc(&self.conn, collection, id)
    }

    /// Merge fields into an existing document and return the merged body
    pub fn update(&mut self, collection: &str, id: &str, fields: Value) -> StoreResult<Value> {
        debug!(%collection, %id, "Store::update: called");
        let tx = self.conn.transaction()?;
        let body = update_doc(&tx, collection, id, &fields)?;
        tx.commit()?;
        Ok(body)
    }

    /// Delete a document, returning whether it existed
    pub fn delete(&mut self, collection: &str, id: &str) -> StoreResult<bool> {
        debug!(%collection, %id, "Store::delete: called");
        delete_doc(&self.conn, collection, id)
    }

    /// All documents in a collection matching every filter, in insertion order
    pub fn query(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Value>> {
        debug!(%collection, filter_count = filters.len(), "Store::query: called");
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![collection], |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for row in rows {
            let doc: Value = serde_json::from_str(&row?)?;
            if filters.iter().all(|f| f.matches(&doc)) {
                docs.push(doc);
            }
        }

        debug!(%collection, count = docs.len(), "Store::query: done");
        Ok(docs)
    }

    /// Apply all operations in one transaction
    ///
    /// Returns the id touched by each operation, in order. If any operation
    /// fails the transaction is rolled back and nothing is written.
    pub fn batch(&mut self, ops: &[WriteOp]) -> StoreResult<Vec<String>> {
        debug!(op_count = ops.len(), "Store::batch: called");
        let tx = self.conn.transaction()?;

        let mut ids = Vec::with_capacity(ops.len());
        for op in ops {
            let id = match op {
                WriteOp::Create { collection, body } => insert_doc(&tx, collection, body.clone())?,
                WriteOp::Update { collection, id, fields } => {
                    update_doc(&tx, collection, id, fields)?;
                    id.clone()
                }
                WriteOp::Delete { collection, id } => {
                    delete_doc(&tx, collection, id)?;
                    id.clone()
                }
            };
            ids.push(id);
        }

        tx.commit()?;
        info!(op_count = ops.len(), "Committed batch");
        Ok(ids)
    }

    // === Typed helpers ===

    /// Insert a record and return its id
    pub fn create_record<T: Record>(&mut self, record: &T) -> StoreResult<String> {
        self.create(T::collection_name(), serde_json::to_value(record)?)
    }

    /// Fetch a record by id
    pub fn get_record<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        self.get(T::collection_name(), id)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// List records matching the filters
    pub fn list_records<T: Record>(&self, filters: &[Filter]) -> StoreResult<Vec<T>> {
        self.query(T::collection_name(), filters)?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }
}

fn get_doc(conn: &Connection, collection: &str, id: &str) -> StoreResult<Option<Value>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    match body {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

fn insert_doc(conn: &Connection, collection: &str, mut body: Value) -> StoreResult<String> {
    let obj = body
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".to_string()))?;

    let id = match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::now_v7().to_string(),
    };
    obj.insert("id".to_string(), Value::String(id.clone()));

    let text = serde_json::to_string(&body)?;
    let result = conn.execute(
        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![collection, id, text, now_ms()],
    );

    match result {
        Ok(_) => Ok(id),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id,
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn update_doc(conn: &Connection, collection: &str, id: &str, fields: &Value) -> StoreResult<Value> {
    let fields = fields
        .as_object()
        .ok_or_else(|| StoreError::InvalidDocument("update fields must be a JSON object".to_string()))?;

    let mut body = get_doc(conn, collection, id)?.ok_or_else(|| StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    })?;
    let obj = body
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument(format!("stored document {}/{} is not an object", collection, id)))?;
    merge_fields(obj, fields);

    conn.execute(
        "UPDATE documents SET body = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
        params![collection, id, serde_json::to_string(&body)?, now_ms()],
    )?;
    Ok(body)
}

fn delete_doc(conn: &Connection, collection: &str, id: &str) -> StoreResult<bool> {
    let removed = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?;
    Ok(removed > 0)
}

/// Shallow merge; `null` removes the key and `id` is immutable
fn merge_fields(target: &mut Map<String, Value>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        if key == "id" {
            continue;
        }
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}
