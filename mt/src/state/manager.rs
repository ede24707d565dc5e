//! StateManager - actor that owns the document store
//!
//! Processes commands via channels for thread-safe access to persistent state.

use std::path::Path;

use docstore::{Filter, Store, WriteOp};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{StateCommand, StateError, StateResponse};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor
    ///
    /// Opens (and locks) the store at `store_path`; must be called inside a
    /// tokio runtime.
    pub fn spawn(store_path: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(store_path = %store_path.as_ref().display(), "spawn: called");
        let store = Store::open(store_path.as_ref())?;

        let (tx, rx) = mpsc::channel(256);

        // Spawn the actor task
        tokio::spawn(actor_loop(store, rx));

        info!(store_path = %store_path.as_ref().display(), "StateManager spawned");

        Ok(Self { tx })
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    /// Insert a document and return its id
    pub async fn create(&self, collection: &str, body: Value) -> StateResponse<String> {
        debug!(%collection, "create: called");
        self.request(|reply| StateCommand::Create {
            collection: collection.to_string(),
            body,
            reply,
        })
        .await
    }

    /// Fetch a document by id
    pub async fn get(&self, collection: &str, id: &str) -> StateResponse<Option<Value>> {
        debug!(%collection, %id, "get: called");
        self.request(|reply| StateCommand::Get {
            collection: collection.to_string(),
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Merge fields into an existing document
    pub async fn update(&self, collection: &str, id: &str, fields: Value) -> StateResponse<()> {
        debug!(%collection, %id, "update: called");
        self.request(|reply| StateCommand::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
            reply,
        })
        .await
    }

    /// Delete a document, returning whether it existed
    pub async fn delete(&self, collection: &str, id: &str) -> StateResponse<bool> {
        debug!(%collection, %id, "delete: called");
        self.request(|reply| StateCommand::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Documents in a collection matching every filter
    pub async fn query(&self, collection: &str, filters: Vec<Filter>) -> StateResponse<Vec<Value>> {
        debug!(%collection, filter_count = filters.len(), "query: called");
        self.request(|reply| StateCommand::Query {
            collection: collection.to_string(),
            filters,
            reply,
        })
        .await
    }

    /// Apply all operations atomically
    pub async fn batch(&self, ops: Vec<WriteOp>) -> StateResponse<Vec<String>> {
        debug!(op_count = ops.len(), "batch: called");
        self.request(|reply| StateCommand::Batch { ops, reply }).await
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

/// The actor loop that owns the Store and processes commands
async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::Create {
                collection,
                body,
                reply,
            } => {
                debug!(%collection, "actor_loop: Create command");
                let result = store.create(&collection, body).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Get { collection, id, reply } => {
                debug!(%collection, %id, "actor_loop: Get command");
                let result = store.get(&collection, &id).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Update {
                collection,
                id,
                fields,
                reply,
            } => {
                debug!(%collection, %id, "actor_loop: Update command");
                let result = store
                    .update(&collection, &id, fields)
                    .map(|_| ())
                    .map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Delete { collection, id, reply } => {
                debug!(%collection, %id, "actor_loop: Delete command");
                let result = store.delete(&collection, &id).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Query {
                collection,
                filters,
                reply,
            } => {
                debug!(%collection, filter_count = filters.len(), "actor_loop: Query command");
                let result = store.query(&collection, &filters).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Batch { ops, reply } => {
                debug!(op_count = ops.len(), "actor_loop: Batch command");
                let result = store.batch(&ops).map_err(StateError::from);
                let _ = reply.send(result);
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}
