//! One prioritization cycle: request, validate, reconcile, commit

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use docstore::Filter;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Project, Task};
use crate::state::{DocumentStore, TaskCollection, query_records};

use super::error::PrioritizationFailure;
use super::model::PriorityModel;
use super::reconcile::{reconcile, to_write_ops};
use super::request::{build_request, parse_result};

/// Cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Nothing sent yet
    Idle,
    /// Waiting on the model
    Requesting,
    /// Merging the answer and writing it
    Reconciling,
    /// Changes persisted and applied
    Committed,
    /// Stopped without changing anything
    Failed,
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Requesting => write!(f, "requesting"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Committed => write!(f, "committed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl CycleState {
    /// Whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: CycleState) -> bool {
        matches!(
            (self, next),
            (CycleState::Idle, CycleState::Requesting)
                | (CycleState::Idle, CycleState::Failed)
                | (CycleState::Requesting, CycleState::Reconciling)
                | (CycleState::Requesting, CycleState::Failed)
                | (CycleState::Reconciling, CycleState::Committed)
                | (CycleState::Reconciling, CycleState::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleState::Committed | CycleState::Failed)
    }
}

/// Tracks and logs the state of a single cycle
struct Cycle<'a> {
    project_id: &'a str,
    state: CycleState,
}

impl<'a> Cycle<'a> {
    fn new(project_id: &'a str) -> Self {
        Self {
            project_id,
            state: CycleState::Idle,
        }
    }

    fn advance(&mut self, next: CycleState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal cycle transition {} -> {}",
            self.state,
            next
        );
        if !self.state.can_transition_to(next) {
            warn!(project_id = %self.project_id, from = %self.state, to = %next, "Illegal cycle transition");
        }
        info!(project_id = %self.project_id, from = %self.state, to = %next, "Prioritization cycle transition");
        self.state = next;
    }

    fn fail(&mut self, failure: PrioritizationFailure) -> PrioritizationFailure {
        if failure.is_no_op() {
            info!(project_id = %self.project_id, "Nothing to prioritize");
        } else {
            warn!(project_id = %self.project_id, error = %failure, "Prioritization failed");
        }
        self.advance(CycleState::Failed);
        failure
    }
}

/// What a committed cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritizationReport {
    pub project_id: String,
    /// Tasks whose priority or reason changed
    pub updated: usize,
    /// Tasks the model named, changed or not
    pub matched: usize,
    /// Titles in the answer that matched no open task
    pub ignored: Vec<String>,
    /// The project's open tasks after the cycle
    pub open_tasks: Vec<Task>,
}

/// Runs prioritization cycles against an injected store and model
///
/// Cycles for the same project run one at a time; different projects run
/// concurrently.
pub struct Prioritizer {
    store: Arc<dyn DocumentStore>,
    model: Arc<dyn PriorityModel>,
    tasks: TaskCollection,
    model_timeout: Duration,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Prioritizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        model: Arc<dyn PriorityModel>,
        tasks: TaskCollection,
        model_timeout: Duration,
    ) -> Self {
        Self {
            store,
            model,
            tasks,
            model_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn project_lock(&self, project_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(project_id.to_string()).or_default().clone()
    }

    /// Drop the project's lock entry once no other cycle holds or waits on it
    async fn release_lock(&self, project_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(project_id);
        }
    }

    /// Ask the model to prioritize a project's open tasks and apply the answer
    ///
    /// Either every changed task is persisted and applied, or nothing is.
    pub async fn prioritize(&self, project_id: &str) -> Result<PrioritizationReport, PrioritizationFailure> {
        debug!(%project_id, "prioritize: called");
        let mut cycle = Cycle::new(project_id);

        let project = match self.find_project(project_id).await {
            Ok(project) => project,
            Err(failure) => return Err(cycle.fail(failure)),
        };

        let lock = self.project_lock(project_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_cycle(&mut cycle, &project).await
        };
        self.release_lock(project_id, lock).await;
        result
    }

    async fn run_cycle(
        &self,
        cycle: &mut Cycle<'_>,
        project: &Project,
    ) -> Result<PrioritizationReport, PrioritizationFailure> {
        let project_id = project.id.as_str();
        let open = self.tasks.open_tasks_for(project_id).await;
        let request = match build_request(&open, project.goal()) {
            Ok(request) => request,
            Err(failure) => return Err(cycle.fail(failure)),
        };

        cycle.advance(CycleState::Requesting);
        let raw = match tokio::time::timeout(self.model_timeout, self.model.invoke(&request)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(cycle.fail(PrioritizationFailure::ModelUnavailable(e.to_string()))),
            Err(_) => {
                return Err(cycle.fail(PrioritizationFailure::ModelUnavailable(format!(
                    "no answer within {:?}",
                    self.model_timeout
                ))));
            }
        };
        let result = match parse_result(&raw) {
            Ok(result) => result,
            Err(failure) => return Err(cycle.fail(failure)),
        };

        cycle.advance(CycleState::Reconciling);
        let reconciliation = reconcile(&open, &result);
        if !reconciliation.ignored.is_empty() {
            warn!(
                %project_id,
                ignored = ?reconciliation.ignored,
                "Model answered with titles that match no open task"
            );
        }

        if reconciliation.updated.is_empty() {
            debug!(%project_id, "prioritize: nothing changed, skipping batch");
        } else {
            let ops = to_write_ops(&reconciliation.updated);
            if let Err(e) = self.store.batch_write(ops).await {
                return Err(cycle.fail(PrioritizationFailure::PersistenceError(e.to_string())));
            }
            // Board edits may have landed during the model call; only the written fields change
            self.tasks.apply_priorities(&reconciliation.updated).await;
        }

        cycle.advance(CycleState::Committed);
        info!(
            %project_id,
            updated = reconciliation.updated.len(),
            matched = reconciliation.matched,
            "Prioritization committed"
        );

        Ok(PrioritizationReport {
            project_id: project_id.to_string(),
            updated: reconciliation.updated.len(),
            matched: reconciliation.matched,
            ignored: reconciliation.ignored,
            open_tasks: self.tasks.open_tasks_for(project_id).await,
        })
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn find_project(&self, project_id: &str) -> Result<Project, PrioritizationFailure> {
        let projects: Vec<Project> = query_records(self.store.as_ref(), vec![Filter::eq("id", project_id)])
            .await
            .map_err(|e| PrioritizationFailure::PersistenceError(e.to_string()))?;
        projects
            .into_iter()
            .next()
            .ok_or_else(|| PrioritizationFailure::UnknownProject(project_id.to_string()))
    }
}
