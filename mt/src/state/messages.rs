//! State manager messages
//!
//! Commands and responses for the actor pattern.

use docstore::{Filter, StoreError, WriteOp};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<StoreError> for StateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => StateError::NotFound(format!("{}/{}", collection, id)),
            other => StateError::StoreError(other.to_string()),
        }
    }
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    Create {
        collection: String,
        body: Value,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    Get {
        collection: String,
        id: String,
        reply: oneshot::Sender<StateResponse<Option<Value>>>,
    },
    Update {
        collection: String,
        id: String,
        fields: Value,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    Delete {
        collection: String,
        id: String,
        reply: oneshot::Sender<StateResponse<bool>>,
    },
    Query {
        collection: String,
        filters: Vec<Filter>,
        reply: oneshot::Sender<StateResponse<Vec<Value>>>,
    },

    /// Apply every operation in one transaction
    Batch {
        ops: Vec<WriteOp>,
        reply: oneshot::Sender<StateResponse<Vec<String>>>,
    },

    // Shutdown
    Shutdown,
}
