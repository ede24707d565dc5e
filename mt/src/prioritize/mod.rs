//! AI task prioritization
//!
//! A cycle reads a project's open tasks, packages them with the project goal
//! into a request, asks the model once, validates the answer, and writes the
//! resulting priority changes back as one atomic batch.
//!
//! - `request`: building the request and validating the answer
//! - `reconcile`: pure matching of answer entries onto tasks by title
//! - `model`: the model boundary (`PriorityModel`) and its LLM implementation
//! - `cycle`: the `Prioritizer` that drives a cycle end to end

mod cycle;
mod error;
mod model;
mod reconcile;
mod request;

pub use cycle::{CycleState, PrioritizationReport, Prioritizer};
pub use error::PrioritizationFailure;
pub use model::{LlmPriorityModel, PRIORITIZE_TEMPLATE, PriorityModel};
pub use reconcile::{Reconciliation, reconcile, to_write_ops};
pub use request::{
    PrioritizationRequest, PrioritizationResult, PrioritizedTask, RequestTask, build_request, parse_result,
};
