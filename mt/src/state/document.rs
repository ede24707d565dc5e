//! DocumentStore trait
//!
//! The async seam between services and persistence. `StateManager` is the
//! production implementation; tests inject an in-memory fake.

use async_trait::async_trait;
use docstore::{Filter, Record, WriteOp};
use serde_json::Value;
use tracing::debug;

use super::manager::StateManager;
use super::messages::{StateError, StateResponse};

/// Async document persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return its id
    async fn create(&self, collection: &str, body: Value) -> StateResponse<String>;

    /// Fetch a document by id
    async fn get(&self, collection: &str, id: &str) -> StateResponse<Option<Value>>;

    /// Merge `fields` into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Value) -> StateResponse<()>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> StateResponse<bool>;

    /// Documents matching every filter, in insertion order
    async fn query(&self, collection: &str, filters: Vec<Filter>) -> StateResponse<Vec<Value>>;

    /// Apply all operations atomically; either every op lands or none does
    async fn batch_write(&self, ops: Vec<WriteOp>) -> StateResponse<Vec<String>>;
}

#[async_trait]
impl DocumentStore for StateManager {
    async fn create(&self, collection: &str, body: Value) -> StateResponse<String> {
        StateManager::create(self, collection, body).await
    }

    async fn get(&self, collection: &str, id: &str) -> StateResponse<Option<Value>> {
        StateManager::get(self, collection, id).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> StateResponse<()> {
        StateManager::update(self, collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StateResponse<bool> {
        StateManager::delete(self, collection, id).await
    }

    async fn query(&self, collection: &str, filters: Vec<Filter>) -> StateResponse<Vec<Value>> {
        StateManager::query(self, collection, filters).await
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> StateResponse<Vec<String>> {
        StateManager::batch(self, ops).await
    }
}

/// Serialize a record into a store document
pub fn to_document<T: Record>(record: &T) -> StateResponse<Value> {
    serde_json::to_value(record).map_err(|e| StateError::StoreError(e.to_string()))
}

/// Deserialize a store document into a record
pub fn from_document<T: Record>(doc: Value) -> StateResponse<T> {
    serde_json::from_value(doc).map_err(|e| StateError::DeserializationError(e.to_string()))
}

/// Insert a typed record and return its id
pub async fn create_record<T: Record + Sync>(store: &dyn DocumentStore, record: &T) -> StateResponse<String> {
    debug!(collection = T::collection_name(), "create_record: called");
    let body = to_document(record)?;
    store.create(T::collection_name(), body).await
}

/// Fetch a typed record by id
pub async fn get_record<T: Record>(store: &dyn DocumentStore, id: &str) -> StateResponse<Option<T>> {
    debug!(collection = T::collection_name(), %id, "get_record: called");
    store.get(T::collection_name(), id).await?.map(from_document).transpose()
}

/// Query typed records
pub async fn query_records<T: Record>(store: &dyn DocumentStore, filters: Vec<Filter>) -> StateResponse<Vec<T>> {
    debug!(collection = T::collection_name(), filter_count = filters.len(), "query_records: called");
    store
        .query(T::collection_name(), filters)
        .await?
        .into_iter()
        .map(from_document)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, Task, UNCATEGORIZED_PROJECT_ID};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_typed_helpers_round_trip_through_state_manager() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();
        let store: &dyn DocumentStore = &manager;

        let mut task = Task::new("Write docs", UNCATEGORIZED_PROJECT_ID);
        task.assign_priority(Priority::High, "Blocks the release");
        let id = create_record(store, &task).await.unwrap();
        assert_eq!(id, task.id);

        let loaded: Task = get_record(store, &id).await.unwrap().unwrap();
        assert_eq!(loaded, task);

        let listed: Vec<Task> = query_records(store, vec![Filter::eq("completed", false)])
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_from_document_reports_deserialization_error() {
        let result: StateResponse<Task> = from_document(serde_json::json!({"id": 7}));
        assert!(matches!(result, Err(StateError::DeserializationError(_))));
    }
}
