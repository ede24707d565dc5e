//! DocStore - JSON document store on SQLite
//!
//! Stores schemaless JSON documents grouped into named collections. Every
//! document is keyed by an opaque string id assigned on creation. Multi-document
//! writes go through [`Store::batch`], which runs in a single SQLite
//! transaction: either every operation applies or none does.
//!
//! # Layout
//!
//! ```text
//! {store_dir}/
//! ├── docstore.db     # SQLite database (documents table)
//! └── .lock           # exclusive lock held while a Store is open
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docstore::{Filter, Store};
//!
//! let mut store = Store::open(".docstore")?;
//! let id = store.create("tasks", serde_json::json!({"title": "Write docs"}))?;
//! let open = store.query("tasks", &[Filter::eq("completed", false)])?;
//! ```

mod error;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use record::{Filter, FilterOp, IndexValue, Record, now_ms};
pub use store::{Store, WriteOp};

/// File name of the SQLite database inside the store directory
pub const DB_FILE: &str = "docstore.db";

/// File name of the lock file inside the store directory
pub const LOCK_FILE: &str = ".lock";
