//! Merging model assignments back onto local tasks
//!
//! Pure functions: no I/O, no clock other than `Task::touch`.

use std::collections::BTreeSet;

use docstore::{Record, WriteOp};
use serde_json::json;
use tracing::debug;

use crate::domain::Task;

use super::request::PrioritizationResult;

/// Outcome of merging a result onto a task set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Tasks whose priority or reason changed, in input order
    pub updated: Vec<Task>,
    /// Number of distinct input tasks that received an assignment
    pub matched: usize,
    /// Result titles that matched no input task, in result order
    pub ignored: Vec<String>,
}

/// Apply result entries to the tasks they name
///
/// Titles match exactly. When several tasks share a title the first one in
/// input order receives the assignment; repeated entries for the same title
/// apply in order, so the last one wins. Tasks the result does not mention
/// are left alone.
pub fn reconcile(open_tasks: &[Task], result: &PrioritizationResult) -> Reconciliation {
    debug!(
        task_count = open_tasks.len(),
        entry_count = result.entries.len(),
        "reconcile: called"
    );

    let mut working = open_tasks.to_vec();
    let mut matched = BTreeSet::new();
    let mut ignored = Vec::new();

    for entry in &result.entries {
        match working.iter().position(|t| t.title == entry.title) {
            Some(idx) => {
                matched.insert(idx);
                working[idx].assign_priority(entry.priority, entry.reason.clone());
            }
            None => {
                debug!(title = %entry.title, "reconcile: no task with this title");
                ignored.push(entry.title.clone());
            }
        }
    }

    // Only values that differ from the input task count as a change
    let mut updated = Vec::new();
    for idx in &matched {
        let mut task = working[*idx].clone();
        let (Some(priority), Some(reason)) = (task.priority, task.reason.as_deref()) else {
            continue;
        };
        if open_tasks[*idx].differs_from_assignment(priority, reason) {
            task.touch();
            updated.push(task);
        }
    }

    debug!(
        updated = updated.len(),
        matched = matched.len(),
        ignored = ignored.len(),
        "reconcile: done"
    );
    Reconciliation {
        updated,
        matched: matched.len(),
        ignored,
    }
}

/// One update operation per changed task
pub fn to_write_ops(updated: &[Task]) -> Vec<WriteOp> {
    updated
        .iter()
        .map(|task| {
            WriteOp::update(
                Task::collection_name(),
                task.id.clone(),
                json!({
                    "priority": task.priority,
                    "reason": task.reason,
                    "updated_at": task.updated_at,
                }),
            )
        })
        .collect()
}
