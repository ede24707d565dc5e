//! Domain types for matetodo
//!
//! Core domain types: Project, Task, Priority.
//! Project and Task implement the Record trait for DocStore persistence.

mod id;
mod priority;
mod project;
mod task;

pub use id::{IdResolver, generate_id};
pub use priority::Priority;
pub use project::{Project, UNCATEGORIZED_PROJECT_ID, UNCATEGORIZED_PROJECT_NAME};
pub use task::{DEADLINE_FORMAT, Task, parse_deadline};

// Re-export docstore types for convenience
pub use docstore::{Filter, FilterOp, IndexValue, Record, WriteOp};
