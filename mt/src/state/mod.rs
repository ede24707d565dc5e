//! State management with actor pattern
//!
//! StateManager owns the document store and processes messages via channels,
//! providing thread-safe access to persistent state. TaskCollection is the
//! shared in-memory view of tasks that services keep in step with the store.

mod collection;
pub mod document;
mod manager;
mod messages;

pub use collection::TaskCollection;
pub use document::{DocumentStore, create_record, from_document, get_record, query_records, to_document};
pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
